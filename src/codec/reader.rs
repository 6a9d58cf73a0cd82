//! Typed big-endian readers.
//!
//! Two surfaces mirror [`DataWriter`](crate::DataWriter): [`SliceReader`]
//! for a complete in-memory buffer and [`ChunkReader`] for an asynchronous
//! stream of byte chunks. Both consume exactly the bytes the writer
//! emitted; running out mid-field is [`FlowError::DecodeUnderflow`].

use bytes::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;

use crate::error::FlowError;

/// Reads primitive values from an in-memory byte buffer.
///
/// Tracks a position through the buffer; each read consumes exactly the
/// number of bytes its matching write produced.
///
/// # Example
///
/// ```
/// use flowrs::SliceReader;
///
/// let mut reader = SliceReader::new(vec![0x12, 0x34, 0x01]);
/// assert_eq!(reader.read_u16()?, 0x1234);
/// assert!(reader.read_bool()?);
/// assert!(reader.is_eof());
/// # Ok::<(), flowrs::FlowError>(())
/// ```
#[derive(Debug)]
pub struct SliceReader {
    data: Bytes,
    position: usize,
}

impl SliceReader {
    /// Creates a reader over the given bytes.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            position: 0,
        }
    }

    /// Returns the number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Returns the current read position.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns `true` when every byte has been consumed.
    pub fn is_eof(&self) -> bool {
        self.position == self.data.len()
    }

    fn take(&mut self, n: usize) -> Result<Bytes, FlowError> {
        if self.remaining() < n {
            return Err(FlowError::DecodeUnderflow {
                needed: n,
                available: self.remaining(),
            });
        }
        let slice = self.data.slice(self.position..self.position + n);
        self.position += n;
        Ok(slice)
    }

    /// Reads one byte as a `bool`; any non-zero value is `true`.
    pub fn read_bool(&mut self) -> Result<bool, FlowError> {
        Ok(self.read_u8()? != 0)
    }

    /// Reads a signed byte.
    pub fn read_i8(&mut self) -> Result<i8, FlowError> {
        Ok(self.read_u8()? as i8)
    }

    /// Reads an unsigned byte.
    pub fn read_u8(&mut self) -> Result<u8, FlowError> {
        Ok(self.take(1)?[0])
    }

    /// Reads a signed 16-bit integer, big-endian.
    pub fn read_i16(&mut self) -> Result<i16, FlowError> {
        Ok(self.read_u16()? as i16)
    }

    /// Reads an unsigned 16-bit integer, big-endian.
    pub fn read_u16(&mut self) -> Result<u16, FlowError> {
        let bytes = self.take(2)?;
        let mut buf = [0u8; 2];
        buf.copy_from_slice(&bytes);
        Ok(u16::from_be_bytes(buf))
    }

    /// Reads a signed 32-bit integer, big-endian.
    pub fn read_i32(&mut self) -> Result<i32, FlowError> {
        Ok(self.read_u32()? as i32)
    }

    /// Reads an unsigned 32-bit integer, big-endian.
    pub fn read_u32(&mut self) -> Result<u32, FlowError> {
        let bytes = self.take(4)?;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&bytes);
        Ok(u32::from_be_bytes(buf))
    }

    /// Reads a signed 64-bit integer, big-endian.
    pub fn read_i64(&mut self) -> Result<i64, FlowError> {
        Ok(self.read_u64()? as i64)
    }

    /// Reads an unsigned 64-bit integer, big-endian.
    pub fn read_u64(&mut self) -> Result<u64, FlowError> {
        let bytes = self.take(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&bytes);
        Ok(u64::from_be_bytes(buf))
    }

    /// Reads `n` raw bytes into a new owned run.
    pub fn read_bytes(&mut self, n: usize) -> Result<Bytes, FlowError> {
        let slice = self.take(n)?;
        Ok(Bytes::copy_from_slice(&slice))
    }

    /// Reads `n` raw bytes as a zero-copy view into the underlying buffer.
    ///
    /// The view stays valid for as long as the caller holds it; `Bytes`
    /// reference counting upholds the immutability contract.
    pub fn read_bytes_immutable(&mut self, n: usize) -> Result<Bytes, FlowError> {
        self.take(n)
    }

    /// Reads a `u16`-length-prefixed UTF-8 string.
    pub fn read_utf8(&mut self) -> Result<String, FlowError> {
        let len = self.read_u16()? as usize;
        let bytes = self.take(len)?;
        Ok(std::str::from_utf8(&bytes)?.to_owned())
    }
}

/// Reads primitive values from an asynchronous stream of byte chunks.
///
/// The same typed surface as [`SliceReader`], with every read an `async fn`
/// that pulls further chunks from upstream on demand. Chunk boundaries are
/// invisible to callers; a field may span any number of chunks.
///
/// # Example
///
/// ```ignore
/// use flowrs::ChunkReader;
/// use futures_util::stream;
///
/// let chunks = stream::iter(vec![Ok(bytes::Bytes::from_static(b"\x00\x2A"))]);
/// let mut reader = ChunkReader::new(chunks);
/// assert_eq!(reader.read_u16().await?, 42);
/// assert!(reader.is_eof().await?);
/// ```
#[derive(Debug)]
pub struct ChunkReader<St> {
    stream: St,
    buffer: Vec<u8>,
    ended: bool,
}

impl<St> ChunkReader<St>
where
    St: Stream<Item = Result<Bytes, FlowError>> + Unpin,
{
    /// Creates a reader over the given chunk stream.
    pub fn new(stream: St) -> Self {
        Self {
            stream,
            buffer: Vec::new(),
            ended: false,
        }
    }

    /// Pulls chunks until at least `n` bytes are buffered.
    async fn fill(&mut self, n: usize) -> Result<(), FlowError> {
        while self.buffer.len() < n {
            if self.ended {
                return Err(FlowError::DecodeUnderflow {
                    needed: n,
                    available: self.buffer.len(),
                });
            }
            match self.stream.next().await {
                Some(Ok(chunk)) => self.buffer.extend_from_slice(&chunk),
                Some(Err(e)) => return Err(e),
                None => self.ended = true,
            }
        }
        Ok(())
    }

    fn take(&mut self, n: usize) -> Bytes {
        let out = Bytes::copy_from_slice(&self.buffer[..n]);
        self.buffer.copy_within(n.., 0);
        self.buffer.truncate(self.buffer.len() - n);
        out
    }

    /// Returns `true` when the upstream has ended and all bytes are
    /// consumed.
    ///
    /// May await the next chunk to find out; empty chunks are skipped.
    pub async fn is_eof(&mut self) -> Result<bool, FlowError> {
        while self.buffer.is_empty() && !self.ended {
            match self.stream.next().await {
                Some(Ok(chunk)) => self.buffer.extend_from_slice(&chunk),
                Some(Err(e)) => return Err(e),
                None => self.ended = true,
            }
        }
        Ok(self.buffer.is_empty())
    }

    /// Reads one byte as a `bool`; any non-zero value is `true`.
    pub async fn read_bool(&mut self) -> Result<bool, FlowError> {
        Ok(self.read_u8().await? != 0)
    }

    /// Reads a signed byte.
    pub async fn read_i8(&mut self) -> Result<i8, FlowError> {
        Ok(self.read_u8().await? as i8)
    }

    /// Reads an unsigned byte.
    pub async fn read_u8(&mut self) -> Result<u8, FlowError> {
        self.fill(1).await?;
        Ok(self.take(1)[0])
    }

    /// Reads a signed 16-bit integer, big-endian.
    pub async fn read_i16(&mut self) -> Result<i16, FlowError> {
        Ok(self.read_u16().await? as i16)
    }

    /// Reads an unsigned 16-bit integer, big-endian.
    pub async fn read_u16(&mut self) -> Result<u16, FlowError> {
        self.fill(2).await?;
        let bytes = self.take(2);
        let mut buf = [0u8; 2];
        buf.copy_from_slice(&bytes);
        Ok(u16::from_be_bytes(buf))
    }

    /// Reads a signed 32-bit integer, big-endian.
    pub async fn read_i32(&mut self) -> Result<i32, FlowError> {
        Ok(self.read_u32().await? as i32)
    }

    /// Reads an unsigned 32-bit integer, big-endian.
    pub async fn read_u32(&mut self) -> Result<u32, FlowError> {
        self.fill(4).await?;
        let bytes = self.take(4);
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&bytes);
        Ok(u32::from_be_bytes(buf))
    }

    /// Reads a signed 64-bit integer, big-endian.
    pub async fn read_i64(&mut self) -> Result<i64, FlowError> {
        Ok(self.read_u64().await? as i64)
    }

    /// Reads an unsigned 64-bit integer, big-endian.
    pub async fn read_u64(&mut self) -> Result<u64, FlowError> {
        self.fill(8).await?;
        let bytes = self.take(8);
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&bytes);
        Ok(u64::from_be_bytes(buf))
    }

    /// Reads `n` raw bytes into a new owned run.
    pub async fn read_bytes(&mut self, n: usize) -> Result<Bytes, FlowError> {
        self.fill(n).await?;
        Ok(self.take(n))
    }

    /// Reads `n` raw bytes without the owned-copy guarantee.
    ///
    /// The streaming reader reassembles fields across chunk boundaries, so
    /// unlike [`SliceReader::read_bytes_immutable`] there is no longer-lived
    /// buffer to view into; the result is owned either way.
    pub async fn read_bytes_immutable(&mut self, n: usize) -> Result<Bytes, FlowError> {
        self.read_bytes(n).await
    }

    /// Reads a `u16`-length-prefixed UTF-8 string.
    pub async fn read_utf8(&mut self) -> Result<String, FlowError> {
        let len = self.read_u16().await? as usize;
        self.fill(len).await?;
        let bytes = self.take(len);
        Ok(std::str::from_utf8(&bytes)?.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    #[test]
    fn test_slice_reader_underflow() {
        let mut r = SliceReader::new(vec![0x01]);
        assert!(matches!(
            r.read_u32(),
            Err(FlowError::DecodeUnderflow {
                needed: 4,
                available: 1
            })
        ));
        // Position unchanged after a failed read
        assert_eq!(r.read_u8().unwrap(), 1);
    }

    #[test]
    fn test_slice_reader_zero_copy() {
        let mut r = SliceReader::new(vec![1, 2, 3, 4]);
        let view = r.read_bytes_immutable(3).unwrap();
        assert_eq!(view.as_ref(), &[1, 2, 3]);
        assert_eq!(r.remaining(), 1);
    }

    #[test]
    fn test_slice_reader_bad_utf8() {
        let mut r = SliceReader::new(vec![0x00, 0x02, 0xFF, 0xFE]);
        assert!(matches!(r.read_utf8(), Err(FlowError::BadUtf8)));
    }

    fn chunks_of(parts: Vec<&'static [u8]>) -> impl Stream<Item = Result<Bytes, FlowError>> + Unpin
    {
        stream::iter(
            parts
                .into_iter()
                .map(|p| Ok(Bytes::from_static(p)))
                .collect::<Vec<_>>(),
        )
    }

    #[tokio::test]
    async fn test_chunk_reader_spanning_field() {
        // A u32 split across three chunks
        let mut r = ChunkReader::new(chunks_of(vec![&[0xDE], &[0xAD, 0xBE], &[0xEF]]));
        assert_eq!(r.read_u32().await.unwrap(), 0xDEADBEEF);
        assert!(r.is_eof().await.unwrap());
    }

    #[tokio::test]
    async fn test_chunk_reader_skips_empty_chunks() {
        let mut r = ChunkReader::new(chunks_of(vec![&[], &[0x07], &[]]));
        assert_eq!(r.read_u8().await.unwrap(), 7);
        assert!(r.is_eof().await.unwrap());
    }

    #[tokio::test]
    async fn test_chunk_reader_underflow() {
        let mut r = ChunkReader::new(chunks_of(vec![&[0x01, 0x02]]));
        assert!(matches!(
            r.read_u32().await,
            Err(FlowError::DecodeUnderflow {
                needed: 4,
                available: 2
            })
        ));
    }
}
