//! Credit-controlled cross-worker streaming.
//!
//! A [`CreditStream`] runs a [`Generator`] inside a dedicated worker task
//! and hands the calling context a lazy `Stream` of its values. The two
//! sides share nothing but a pair of FIFO channels; a credit/ack protocol
//! layered over them keeps the in-flight buffer bounded without stalling
//! the producer unnecessarily.
//!
//! - [`CreditStream`] - consumer-side stream and worker lifecycle
//! - [`Producer`] - worker-side handle with the credit ledger
//! - [`Generator`] - the user contract, with iterator/closure adapters
//! - [`ChunkSink`] - bridges byte-oriented writers onto a producer

mod frame;
mod generator;
mod producer;
mod sink;

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_core::future::BoxFuture;
use futures_core::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::StreamConfig;
use crate::error::FlowError;
use frame::{Ack, Frame};

pub use generator::{
    ByteGenerator, FnGenerator, Generator, IterGenerator, DEFAULT_ITEM_BUDGET,
};
pub use producer::Producer;
pub use sink::ChunkSink;

/// Urgency of a worker kill, passed through to the runtime.
///
/// The embedded runtime exposes a single abort urgency, so the three levels
/// currently behave identically; the distinction is kept for hosts that
/// honor it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillPriority {
    /// Kill before the worker's next scheduled event.
    BeforeNextEvent,
    /// Kill as an ordinary event in the worker's queue.
    AsEvent,
    /// Kill immediately.
    Immediate,
}

/// Consumer-side session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    /// Forwarding values and returning credit.
    Running,
    /// Data channel finished; awaiting the worker's exit.
    Draining,
    /// Terminated; the stream yields nothing more.
    Done,
}

/// A lazy sequence of values produced by a generator in a worker task.
///
/// Construction spawns the worker, moves the generator into it and installs
/// the producer session. The stream then yields each generated value in
/// order, returning credit to the producer as it goes. When the generator
/// returns, the session emits an end-of-stream marker, the stream
/// acknowledges it, awaits the worker's exit and terminates.
///
/// Failures inside the worker - a generator error or a panic - surface as
/// the final `Err` element before the stream ends. Dropping the stream
/// early closes both channels, which any blocked producer observes as
/// [`FlowError::ConsumerGone`] and winds down cleanly.
///
/// # Example
///
/// ```ignore
/// use flowrs::{CreditStream, IterGenerator};
/// use futures_util::StreamExt;
///
/// let mut stream = CreditStream::spawn(IterGenerator::new(0..3));
/// while let Some(value) = stream.next().await {
///     println!("{}", value?);
/// }
/// ```
#[derive(Debug)]
pub struct CreditStream<T> {
    data_rx: mpsc::UnboundedReceiver<Frame<T>>,
    ack_tx: mpsc::UnboundedSender<Ack>,
    worker: JoinHandle<Result<(), FlowError>>,
    state: SessionState,
    name: Option<String>,
}

impl<T: Send + 'static> CreditStream<T> {
    /// Spawns a worker for the generator with default options.
    ///
    /// Must be called within a tokio runtime.
    pub fn spawn<G>(generator: G) -> Self
    where
        G: Generator<Item = T>,
    {
        Self::spawn_with(generator, StreamConfig::default())
    }

    /// Spawns a worker for the generator with explicit session options.
    ///
    /// The budget - the config's override if set, otherwise the
    /// generator's own - is read here, once, and copied into the producer;
    /// nothing the generator does later can change it.
    pub fn spawn_with<G>(generator: G, config: StreamConfig) -> Self
    where
        G: Generator<Item = T>,
    {
        let (data_tx, data_rx) = mpsc::unbounded_channel();
        let (ack_tx, ack_rx) = mpsc::unbounded_channel();

        let budget = config
            .buffer_budget()
            .unwrap_or_else(|| generator.buffer_budget());
        let name = config.name().map(str::to_owned);

        tracing::debug!(
            worker = name.as_deref().unwrap_or("credit-stream"),
            budget,
            "spawning worker"
        );

        let worker = tokio::spawn(async move {
            let mut producer = Producer::new(data_tx, ack_rx, budget, G::size_of);
            generator.generate(&mut producer).await?;
            producer.close().await
        });

        Self {
            data_rx,
            ack_tx,
            worker,
            state: SessionState::Running,
            name,
        }
    }

    /// Kills the worker and terminates the stream.
    ///
    /// Values already in flight are discarded; subsequent polls yield
    /// nothing. Killing an already-finished stream is a no-op.
    pub fn kill(&mut self, priority: KillPriority) {
        tracing::debug!(
            worker = self.name.as_deref().unwrap_or("credit-stream"),
            ?priority,
            "killing worker"
        );
        self.worker.abort();
        self.state = SessionState::Done;
    }

    /// Returns the session's debug name, if one was configured.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl<T: Send + 'static> Stream for CreditStream<T> {
    type Item = Result<T, FlowError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        loop {
            match this.state {
                SessionState::Done => return Poll::Ready(None),

                SessionState::Draining => {
                    let exit = match Pin::new(&mut this.worker).poll(cx) {
                        Poll::Pending => return Poll::Pending,
                        Poll::Ready(exit) => exit,
                    };
                    this.state = SessionState::Done;
                    return match exit {
                        Ok(Ok(())) => Poll::Ready(None),
                        // The producer saw us leave; nothing to report
                        Ok(Err(FlowError::ConsumerGone)) => Poll::Ready(None),
                        Ok(Err(e)) => Poll::Ready(Some(Err(e))),
                        Err(join) if join.is_cancelled() => Poll::Ready(None),
                        Err(join) => Poll::Ready(Some(Err(FlowError::WorkerFault {
                            message: join.to_string(),
                        }))),
                    };
                }

                SessionState::Running => match this.data_rx.poll_recv(cx) {
                    Poll::Pending => return Poll::Pending,
                    Poll::Ready(Some(Frame::Value(value))) => {
                        return Poll::Ready(Some(Ok(value)))
                    }
                    Poll::Ready(Some(Frame::Ack)) => {
                        // Credit return; a vanished producer is handled on
                        // its own side
                        let _ = this.ack_tx.send(Ack);
                    }
                    Poll::Ready(Some(Frame::Eof)) => {
                        tracing::trace!("eof received, acknowledging");
                        let _ = this.ack_tx.send(Ack);
                        this.state = SessionState::Draining;
                    }
                    // Worker went away without an EOF; its exit status
                    // carries the reason
                    Poll::Ready(None) => this.state = SessionState::Draining,
                },
            }
        }
    }
}

/// Spawns a byte-chunk stream from an async closure.
///
/// The byte-convenience constructor: chunk sizes count bytes against a
/// default 64 KiB budget. Equivalent to
/// `CreditStream::spawn(ByteGenerator::new(f))`.
///
/// # Example
///
/// ```ignore
/// use bytes::Bytes;
/// use flowrs::{stream_bytes, FlowError, Producer};
/// use futures_core::future::BoxFuture;
///
/// fn fill(producer: &mut Producer<Bytes>) -> BoxFuture<'_, Result<(), FlowError>> {
///     Box::pin(async move {
///         producer.send(Bytes::from_static(b"chunk")).await?;
///         Ok(())
///     })
/// }
///
/// let stream = stream_bytes(fill);
/// ```
pub fn stream_bytes<F>(f: F) -> CreditStream<Bytes>
where
    F: for<'a> FnOnce(&'a mut Producer<Bytes>) -> BoxFuture<'a, Result<(), FlowError>>
        + Send
        + 'static,
{
    CreditStream::spawn(ByteGenerator::new(f))
}
