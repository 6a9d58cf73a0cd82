//! Byte-sink adapter over a producer.

use std::future::Future;

use bytes::Bytes;

use crate::error::FlowError;
use crate::sink::ByteSink;
use crate::stream::producer::Producer;

/// Adapts a `&mut Producer<Bytes>` into a [`ByteSink`].
///
/// Lets a writer stack (for example `DataWriter` over `EncryptingSink`) end
/// in a credit stream: `add` maps to the non-suspending
/// [`push`](Producer::push) and `flush_if_needed` maps to the producer's
/// credit wait.
///
/// `close` is deliberately a no-op: shutdown is driven by the worker
/// session's own end-of-stream emission once the generator returns, and
/// generator code must never close the channel itself.
#[derive(Debug)]
pub struct ChunkSink<'a> {
    producer: &'a mut Producer<Bytes>,
}

impl<'a> ChunkSink<'a> {
    /// Wraps the producer.
    pub fn new(producer: &'a mut Producer<Bytes>) -> Self {
        Self { producer }
    }

    /// Returns a reference to the underlying producer, for its
    /// instrumentation getters.
    pub fn producer(&self) -> &Producer<Bytes> {
        self.producer
    }
}

impl ByteSink for ChunkSink<'_> {
    fn add(&mut self, chunk: Bytes) -> Result<(), FlowError> {
        self.producer.push(chunk)
    }

    fn flush_if_needed(&mut self) -> impl Future<Output = Result<(), FlowError>> + Send {
        self.producer.flush_if_needed()
    }

    fn close(&mut self) -> Result<(), FlowError> {
        Ok(())
    }
}
