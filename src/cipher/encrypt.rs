//! Encrypting sink adapter.

use bytes::Bytes;

use crate::cipher::{BlockCipher, Padding, Pkcs7};
use crate::error::FlowError;
use crate::sink::ByteSink;

/// A [`ByteSink`] that encrypts its input block by block.
///
/// Plaintext chunks of any size accumulate in a partial-block buffer;
/// whenever a full block forms it is encrypted in place and forwarded
/// downstream, so output is emitted only in whole blocks while the sink is
/// open. [`close`](ByteSink::close) pads the final partial block - always
/// adding between 1 and `block_size` bytes, a full extra block for aligned
/// input - encrypts it, forwards it, and closes downstream.
///
/// Total output length is therefore
/// `ceil((total_input + 1) / block_size) * block_size`.
///
/// Input chunk boundaries are not preserved; only the byte sequence is.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use flowrs::{BlockCipher, BufferSink, ByteSink, EncryptingSink};
///
/// struct Identity;
/// impl BlockCipher for Identity {
///     fn block_size(&self) -> usize { 4 }
///     fn process_block(&mut self, _block: &mut [u8]) {}
/// }
///
/// let mut sink = EncryptingSink::new(Identity, BufferSink::new());
/// sink.add(Bytes::from_static(b"hello"))?;
/// sink.close()?;
/// // 5 bytes in, padded to the next multiple of 4
/// assert_eq!(sink.sink().len(), 8);
/// # Ok::<(), flowrs::FlowError>(())
/// ```
#[derive(Debug)]
pub struct EncryptingSink<C, S, P = Pkcs7> {
    cipher: C,
    sink: S,
    padding: P,
    partial: Vec<u8>,
    closed: bool,
}

impl<C: BlockCipher, S: ByteSink> EncryptingSink<C, S> {
    /// Creates an encrypting sink with PKCS#7 padding.
    ///
    /// `cipher` must be pre-keyed for encryption.
    pub fn new(cipher: C, sink: S) -> Self {
        Self::with_padding(cipher, sink, Pkcs7)
    }
}

impl<C: BlockCipher, S: ByteSink, P: Padding> EncryptingSink<C, S, P> {
    /// Creates an encrypting sink with a custom padding scheme.
    pub fn with_padding(cipher: C, sink: S, padding: P) -> Self {
        let block_size = cipher.block_size();
        Self {
            cipher,
            sink,
            padding,
            partial: Vec::with_capacity(block_size),
            closed: false,
        }
    }

    /// Returns the number of plaintext bytes awaiting a full block.
    pub fn pending_len(&self) -> usize {
        self.partial.len()
    }

    /// Returns a reference to the downstream sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Returns a mutable reference to the downstream sink.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

impl<C: BlockCipher, S: ByteSink, P: Padding> ByteSink for EncryptingSink<C, S, P> {
    fn add(&mut self, chunk: Bytes) -> Result<(), FlowError> {
        if self.closed {
            return Err(FlowError::IllegalCall {
                message: "add on closed encrypting sink",
            });
        }

        let block_size = self.cipher.block_size();
        let mut data = &chunk[..];
        let total = self.partial.len() + data.len();
        let mut out = Vec::with_capacity((total / block_size) * block_size);

        // Complete the pending partial block first
        if !self.partial.is_empty() {
            let need = block_size - self.partial.len();
            let take = need.min(data.len());
            self.partial.extend_from_slice(&data[..take]);
            data = &data[take..];
            if self.partial.len() == block_size {
                self.cipher.process_block(&mut self.partial);
                out.extend_from_slice(&self.partial);
                self.partial.clear();
            }
        }

        // Encrypt whole blocks straight out of the input
        while data.len() >= block_size {
            let start = out.len();
            out.extend_from_slice(&data[..block_size]);
            self.cipher.process_block(&mut out[start..start + block_size]);
            data = &data[block_size..];
        }

        self.partial.extend_from_slice(data);

        if !out.is_empty() {
            self.sink.add(Bytes::from(out))?;
        }
        Ok(())
    }

    fn flush_if_needed(&mut self) -> impl std::future::Future<Output = Result<(), FlowError>> + Send
    {
        self.sink.flush_if_needed()
    }

    fn close(&mut self) -> Result<(), FlowError> {
        if self.closed {
            return Err(FlowError::IllegalCall {
                message: "double close on encrypting sink",
            });
        }
        self.closed = true;

        let block_size = self.cipher.block_size();
        let data_len = self.partial.len();
        self.partial.resize(block_size, 0);
        self.padding.add_padding(&mut self.partial, data_len);
        self.cipher.process_block(&mut self.partial);
        self.sink.add(Bytes::from(std::mem::take(&mut self.partial)))?;
        self.sink.close()
    }
}
