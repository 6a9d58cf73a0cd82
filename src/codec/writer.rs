//! Typed big-endian writer over a byte sink.

use bytes::Bytes;

use crate::error::FlowError;
use crate::sink::ByteSink;

/// Serializes primitive values into a [`ByteSink`] in big-endian order.
///
/// Every write forwards immediately to the sink; the writer holds no buffer
/// of its own, so interleaving typed writes with raw
/// [`write_bytes`](DataWriter::write_bytes) runs is safe.
///
/// # Wire format
///
/// - `bool` - one byte, `0x00` or `0x01`
/// - integers - 1/2/4/8 bytes, big-endian
/// - strings - `u16` byte-length prefix, then UTF-8 bytes
/// - raw runs - the bytes, no framing
///
/// # Example
///
/// ```
/// use flowrs::{BufferSink, DataWriter};
///
/// let mut writer = DataWriter::new(BufferSink::new());
/// writer.write_u16(0x0102)?;
/// writer.write_bool(true)?;
/// writer.close()?;
/// assert_eq!(writer.sink().data(), &[0x01, 0x02, 0x01]);
/// # Ok::<(), flowrs::FlowError>(())
/// ```
#[derive(Debug)]
pub struct DataWriter<S> {
    sink: S,
    closed: bool,
}

impl<S: ByteSink> DataWriter<S> {
    /// Creates a writer over the given sink.
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            closed: false,
        }
    }

    fn put(&mut self, bytes: &[u8]) -> Result<(), FlowError> {
        if self.closed {
            return Err(FlowError::IllegalCall {
                message: "write on closed writer",
            });
        }
        self.sink.add(Bytes::copy_from_slice(bytes))
    }

    /// Writes a `bool` as one byte, `0x00` or `0x01`.
    pub fn write_bool(&mut self, value: bool) -> Result<(), FlowError> {
        self.put(&[value as u8])
    }

    /// Writes a signed byte.
    pub fn write_i8(&mut self, value: i8) -> Result<(), FlowError> {
        self.put(&value.to_be_bytes())
    }

    /// Writes an unsigned byte.
    pub fn write_u8(&mut self, value: u8) -> Result<(), FlowError> {
        self.put(&[value])
    }

    /// Writes a signed 16-bit integer, big-endian.
    pub fn write_i16(&mut self, value: i16) -> Result<(), FlowError> {
        self.put(&value.to_be_bytes())
    }

    /// Writes an unsigned 16-bit integer, big-endian.
    pub fn write_u16(&mut self, value: u16) -> Result<(), FlowError> {
        self.put(&value.to_be_bytes())
    }

    /// Writes a signed 32-bit integer, big-endian.
    pub fn write_i32(&mut self, value: i32) -> Result<(), FlowError> {
        self.put(&value.to_be_bytes())
    }

    /// Writes an unsigned 32-bit integer, big-endian.
    pub fn write_u32(&mut self, value: u32) -> Result<(), FlowError> {
        self.put(&value.to_be_bytes())
    }

    /// Writes a signed 64-bit integer, big-endian.
    pub fn write_i64(&mut self, value: i64) -> Result<(), FlowError> {
        self.put(&value.to_be_bytes())
    }

    /// Writes an unsigned 64-bit integer, big-endian.
    pub fn write_u64(&mut self, value: u64) -> Result<(), FlowError> {
        self.put(&value.to_be_bytes())
    }

    /// Writes a raw byte run with no framing.
    ///
    /// The matching read must know the length from elsewhere.
    pub fn write_bytes(&mut self, data: impl Into<Bytes>) -> Result<(), FlowError> {
        if self.closed {
            return Err(FlowError::IllegalCall {
                message: "write on closed writer",
            });
        }
        self.sink.add(data.into())
    }

    /// Writes a string as a `u16` UTF-8 byte-length prefix followed by the
    /// bytes.
    ///
    /// Returns [`FlowError::LengthOverflow`] if the encoding exceeds 65535
    /// bytes.
    pub fn write_utf8(&mut self, value: &str) -> Result<(), FlowError> {
        let encoded = value.as_bytes();
        if encoded.len() > u16::MAX as usize {
            return Err(FlowError::LengthOverflow { len: encoded.len() });
        }
        self.write_u16(encoded.len() as u16)?;
        self.put(encoded)
    }

    /// Suspends until the underlying sink is ready for more data.
    ///
    /// Delegates straight to the sink; in-memory sinks resolve immediately.
    pub async fn flush_if_needed(&mut self) -> Result<(), FlowError> {
        self.sink.flush_if_needed().await
    }

    /// Closes the underlying sink. Further writes are
    /// [`FlowError::IllegalCall`].
    pub fn close(&mut self) -> Result<(), FlowError> {
        if self.closed {
            return Err(FlowError::IllegalCall {
                message: "double close on writer",
            });
        }
        self.closed = true;
        self.sink.close()
    }

    /// Returns a reference to the underlying sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Returns a mutable reference to the underlying sink.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consumes the writer and returns the underlying sink.
    pub fn into_sink(self) -> S {
        self.sink
    }
}
