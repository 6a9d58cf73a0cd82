//! Decrypting stream adapter.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_core::Stream;
use pin_project_lite::pin_project;

use crate::cipher::{BlockCipher, Padding, Pkcs7};
use crate::error::FlowError;

pin_project! {
    /// A stream adapter that decrypts ciphertext chunks into plaintext.
    ///
    /// Incoming bytes are regrouped into `block_size`-aligned runs and
    /// decrypted as complete blocks form. The most recently decrypted block
    /// is always held back: padding can only be removed from the *final*
    /// block, and which block is final is unknown until upstream ends.
    ///
    /// On end-of-input the held block's pad count is validated against
    /// `1..=block_size` and that many trailing bytes are dropped. A stream
    /// whose total byte count is not a positive multiple of `block_size`
    /// fails with [`FlowError::MalformedCipherStream`]; an out-of-range pad
    /// count fails with [`FlowError::BadPadding`].
    ///
    /// Output chunk boundaries are chosen by the adapter and need not match
    /// the input's.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use flowrs::DecryptingStream;
    /// use futures_util::StreamExt;
    ///
    /// let mut plain = DecryptingStream::new(cipher_dec, ciphertext_stream);
    /// while let Some(chunk) = plain.next().await {
    ///     let chunk = chunk?;
    ///     println!("{} plaintext bytes", chunk.len());
    /// }
    /// ```
    #[derive(Debug)]
    pub struct DecryptingStream<C, St, P = Pkcs7> {
        #[pin]
        stream: St,
        cipher: C,
        padding: P,
        buffer: Vec<u8>,
        held: Option<Vec<u8>>,
        total_in: usize,
        done: bool,
    }
}

impl<C: BlockCipher, St> DecryptingStream<C, St> {
    /// Creates a decrypting stream with PKCS#7 padding.
    ///
    /// `cipher` must be pre-keyed for decryption.
    pub fn new(cipher: C, stream: St) -> Self {
        Self::with_padding(cipher, stream, Pkcs7)
    }
}

impl<C: BlockCipher, St, P: Padding> DecryptingStream<C, St, P> {
    /// Creates a decrypting stream with a custom padding scheme.
    pub fn with_padding(cipher: C, stream: St, padding: P) -> Self {
        let block_size = cipher.block_size();
        Self {
            stream,
            cipher,
            padding,
            buffer: Vec::with_capacity(block_size),
            held: None,
            total_in: 0,
            done: false,
        }
    }
}

impl<C, St, P> Stream for DecryptingStream<C, St, P>
where
    C: BlockCipher,
    P: Padding,
    St: Stream<Item = Result<Bytes, FlowError>>,
{
    type Item = Result<Bytes, FlowError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        if *this.done {
            return Poll::Ready(None);
        }

        let block_size = this.cipher.block_size();

        loop {
            match this.stream.as_mut().poll_next(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Some(Err(e))) => {
                    *this.done = true;
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(Some(Ok(chunk))) => {
                    *this.total_in += chunk.len();
                    this.buffer.extend_from_slice(&chunk);

                    // Decrypt every complete block, keeping the newest one
                    // back as the padding candidate
                    let mut out = Vec::new();
                    while this.buffer.len() >= block_size {
                        let mut block = this.buffer[..block_size].to_vec();
                        this.buffer.copy_within(block_size.., 0);
                        this.buffer.truncate(this.buffer.len() - block_size);
                        this.cipher.process_block(&mut block);
                        if let Some(prev) = this.held.replace(block) {
                            out.extend_from_slice(&prev);
                        }
                    }

                    if !out.is_empty() {
                        return Poll::Ready(Some(Ok(Bytes::from(out))));
                    }
                    // Nothing releasable yet - keep pulling
                }
                Poll::Ready(None) => {
                    *this.done = true;

                    if !this.buffer.is_empty() {
                        return Poll::Ready(Some(Err(FlowError::MalformedCipherStream {
                            len: *this.total_in,
                            block_size,
                        })));
                    }

                    let block = match this.held.take() {
                        Some(block) => block,
                        // Zero bytes total: not a positive block multiple
                        None => {
                            return Poll::Ready(Some(Err(FlowError::MalformedCipherStream {
                                len: 0,
                                block_size,
                            })));
                        }
                    };

                    let count = this.padding.pad_count(&block);
                    if count == 0 || count > block_size {
                        return Poll::Ready(Some(Err(FlowError::BadPadding {
                            count,
                            block_size,
                        })));
                    }

                    let keep = block_size - count;
                    if keep == 0 {
                        return Poll::Ready(None);
                    }
                    return Poll::Ready(Some(Ok(Bytes::from(block[..keep].to_vec()))));
                }
            }
        }
    }
}
