//! Byte sink abstraction.
//!
//! A [`ByteSink`] is the downstream end of every writer in this crate: the
//! data codec writes into one, the encrypting adapter wraps one, and the
//! credit stream's producer exposes one. The contract splits cleanly into a
//! synchronous data path and a single asynchronous yield point:
//!
//! - [`ByteSink::add`] - accept a byte run, never suspends
//! - [`ByteSink::flush_if_needed`] - suspend until downstream credit is
//!   replenished (a no-op for in-memory sinks)
//! - [`ByteSink::close`] - finalize the sink; further writes are illegal

use std::future::Future;

use bytes::Bytes;

use crate::error::FlowError;

/// A destination for byte runs.
///
/// Implementors accept chunks of any size, including empty ones. Adapters
/// that wrap another sink delegate [`flush_if_needed`](ByteSink::flush_if_needed)
/// downstream so a writer stack ending in a credit-controlled producer can
/// yield for credit through the whole chain.
pub trait ByteSink {
    /// Appends a byte run to the sink.
    ///
    /// Never suspends. Returns [`FlowError::IllegalCall`] after
    /// [`close`](ByteSink::close), and [`FlowError::ConsumerGone`] when the
    /// ultimate destination has disappeared.
    fn add(&mut self, chunk: Bytes) -> Result<(), FlowError>;

    /// Suspends until the sink is ready to accept more data.
    ///
    /// In-memory sinks resolve immediately. Sinks that end in a
    /// credit-controlled producer wait here until enough credit has been
    /// returned by the consumer.
    fn flush_if_needed(&mut self) -> impl Future<Output = Result<(), FlowError>> + Send;

    /// Closes the sink.
    ///
    /// Adapters emit any buffered tail before closing downstream. Calling
    /// `close` twice is [`FlowError::IllegalCall`].
    fn close(&mut self) -> Result<(), FlowError>;
}

/// An in-memory [`ByteSink`] that collects everything into one buffer.
///
/// Used to capture writer or cipher output when no stream is involved.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use flowrs::{BufferSink, ByteSink};
///
/// let mut sink = BufferSink::new();
/// sink.add(Bytes::from_static(b"hello "))?;
/// sink.add(Bytes::from_static(b"world"))?;
/// sink.close()?;
/// assert_eq!(sink.data(), b"hello world");
/// # Ok::<(), flowrs::FlowError>(())
/// ```
#[derive(Debug, Default)]
pub struct BufferSink {
    data: Vec<u8>,
    closed: bool,
}

impl BufferSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the bytes collected so far.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the number of bytes collected.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` once [`close`](ByteSink::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Consumes the sink and returns the collected bytes.
    pub fn into_bytes(self) -> Bytes {
        Bytes::from(self.data)
    }
}

impl ByteSink for BufferSink {
    fn add(&mut self, chunk: Bytes) -> Result<(), FlowError> {
        if self.closed {
            return Err(FlowError::IllegalCall {
                message: "add on closed sink",
            });
        }
        self.data.extend_from_slice(&chunk);
        Ok(())
    }

    fn flush_if_needed(&mut self) -> impl Future<Output = Result<(), FlowError>> + Send {
        std::future::ready(Ok(()))
    }

    fn close(&mut self) -> Result<(), FlowError> {
        if self.closed {
            return Err(FlowError::IllegalCall {
                message: "double close on sink",
            });
        }
        self.closed = true;
        Ok(())
    }
}
