//! Generator contract and adapters.
//!
//! A [`Generator`] is the user code a [`CreditStream`](crate::CreditStream)
//! moves into its worker. One uniform trait covers every production style;
//! the iterator and closure flavours below are thin adapters over it.

use std::future::Future;
use std::marker::PhantomData;

use bytes::Bytes;
use futures_core::future::BoxFuture;

use crate::config::DEFAULT_BYTE_BUDGET;
use crate::error::FlowError;
use crate::stream::producer::Producer;

/// Default buffer budget for item-counting generators, in items.
pub const DEFAULT_ITEM_BUDGET: i64 = 16;

/// User-supplied value producer, run to completion inside the worker.
///
/// A generator is a plain moveable value: its data crosses the worker
/// boundary by move (the `Send + 'static` bound is what rejects values that
/// cannot), and [`size_of`](Generator::size_of) is a plain associated
/// function whose pointer is copied into the producer at session start.
/// [`buffer_budget`](Generator::buffer_budget) is likewise read exactly once
/// when the session starts; later mutations of a generator never reach a
/// running producer.
///
/// Inside [`generate`](Generator::generate) the producer offers
/// [`send`](Producer::send) (credit-aware, suspending) and
/// [`push`](Producer::push) plus
/// [`flush_if_needed`](Producer::flush_if_needed) (sink style). Generators
/// must not attempt any shutdown of their own: returning from `generate` is
/// the end of the stream, and the session emits the end-of-stream marker
/// itself.
pub trait Generator: Send + 'static {
    /// The value type streamed to the consumer.
    type Item: Send + 'static;

    /// Buffer budget in the same unit as [`size_of`](Generator::size_of).
    ///
    /// `1` forces an empty channel before each send; zero and negative
    /// budgets give rendezvous semantics.
    fn buffer_budget(&self) -> i64;

    /// Size of one value, in budget units. Returns are clamped to at
    /// least 1 by the producer.
    fn size_of(item: &Self::Item) -> usize;

    /// Produces the stream's values through `producer`.
    fn generate(
        self,
        producer: &mut Producer<Self::Item>,
    ) -> impl Future<Output = Result<(), FlowError>> + Send;
}

/// Adapts any iterator into a [`Generator`].
///
/// Each item counts one budget unit and is delivered with the credit-aware
/// [`send`](Producer::send). A consumer that goes away simply ends the run.
///
/// # Example
///
/// ```ignore
/// use flowrs::{CreditStream, IterGenerator};
/// use futures_util::StreamExt;
///
/// let mut stream = CreditStream::spawn(IterGenerator::new(0..100));
/// while let Some(value) = stream.next().await {
///     println!("{}", value?);
/// }
/// ```
#[derive(Debug)]
pub struct IterGenerator<I> {
    iter: I,
    budget: i64,
}

impl<I> IterGenerator<I> {
    /// Wraps an iterator with the default item budget
    /// ([`DEFAULT_ITEM_BUDGET`]).
    pub fn new(iter: I) -> Self {
        Self {
            iter,
            budget: DEFAULT_ITEM_BUDGET,
        }
    }

    /// Sets the buffer budget, in items.
    pub fn with_budget(mut self, budget: i64) -> Self {
        self.budget = budget;
        self
    }
}

impl<I> Generator for IterGenerator<I>
where
    I: Iterator + Send + 'static,
    I::Item: Send + 'static,
{
    type Item = I::Item;

    fn buffer_budget(&self) -> i64 {
        self.budget
    }

    fn size_of(_item: &I::Item) -> usize {
        1
    }

    fn generate(
        self,
        producer: &mut Producer<I::Item>,
    ) -> impl Future<Output = Result<(), FlowError>> + Send {
        async move {
            for value in self.iter {
                match producer.send(value).await {
                    Ok(()) => {}
                    Err(FlowError::ConsumerGone) => return Ok(()),
                    Err(e) => return Err(e),
                }
            }
            Ok(())
        }
    }
}

/// Adapts an async closure into a [`Generator`] with unit item sizes.
///
/// The closure receives the producer and returns a boxed future; use
/// [`ByteGenerator`] when streaming byte chunks so sizes count bytes
/// instead of items.
pub struct FnGenerator<T, F> {
    f: F,
    budget: i64,
    _marker: PhantomData<fn() -> T>,
}

impl<T, F> FnGenerator<T, F>
where
    T: Send + 'static,
    F: for<'a> FnOnce(&'a mut Producer<T>) -> BoxFuture<'a, Result<(), FlowError>>
        + Send
        + 'static,
{
    /// Wraps a closure with an explicit buffer budget, in items.
    pub fn new(budget: i64, f: F) -> Self {
        Self {
            f,
            budget,
            _marker: PhantomData,
        }
    }
}

impl<T, F> Generator for FnGenerator<T, F>
where
    T: Send + 'static,
    F: for<'a> FnOnce(&'a mut Producer<T>) -> BoxFuture<'a, Result<(), FlowError>>
        + Send
        + 'static,
{
    type Item = T;

    fn buffer_budget(&self) -> i64 {
        self.budget
    }

    fn size_of(_item: &T) -> usize {
        1
    }

    fn generate(
        self,
        producer: &mut Producer<T>,
    ) -> impl Future<Output = Result<(), FlowError>> + Send {
        (self.f)(producer)
    }
}

/// Adapts an async closure into a byte-chunk [`Generator`].
///
/// Fixes the item type to [`Bytes`] with `size_of` equal to the chunk
/// length, and defaults the budget to
/// [`DEFAULT_BYTE_BUDGET`](crate::DEFAULT_BYTE_BUDGET) (64 KiB).
pub struct ByteGenerator<F> {
    f: F,
    budget: i64,
}

impl<F> ByteGenerator<F>
where
    F: for<'a> FnOnce(&'a mut Producer<Bytes>) -> BoxFuture<'a, Result<(), FlowError>>
        + Send
        + 'static,
{
    /// Wraps a closure with the default 64 KiB byte budget.
    pub fn new(f: F) -> Self {
        Self {
            f,
            budget: DEFAULT_BYTE_BUDGET,
        }
    }

    /// Sets the buffer budget, in bytes.
    pub fn with_budget(mut self, budget: i64) -> Self {
        self.budget = budget;
        self
    }
}

impl<F> Generator for ByteGenerator<F>
where
    F: for<'a> FnOnce(&'a mut Producer<Bytes>) -> BoxFuture<'a, Result<(), FlowError>>
        + Send
        + 'static,
{
    type Item = Bytes;

    fn buffer_budget(&self) -> i64 {
        self.budget
    }

    fn size_of(chunk: &Bytes) -> usize {
        chunk.len()
    }

    fn generate(
        self,
        producer: &mut Producer<Bytes>,
    ) -> impl Future<Output = Result<(), FlowError>> + Send {
        (self.f)(producer)
    }
}
