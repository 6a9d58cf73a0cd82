//! Error types for flowrs.
//!
//! This module defines the error type used throughout the crate.
//!
//! - [`FlowError`] - Represents all possible errors across the stream
//!   protocol, the cipher pipeline and the data codec

use std::fmt;

/// Errors that can occur while streaming, encrypting or decoding data.
///
/// `FlowError` covers every failure the crate can report: protocol
/// violations on the credit channels, worker failures, codec underflows and
/// cipher-stream corruption.
///
/// # Variants by layer
///
/// - Credit stream: [`FlowError::Protocol`], [`FlowError::WorkerFault`],
///   [`FlowError::ConsumerGone`], [`FlowError::IllegalCall`]
/// - Data codec: [`FlowError::DecodeUnderflow`], [`FlowError::BadUtf8`],
///   [`FlowError::LengthOverflow`]
/// - Cipher pipeline: [`FlowError::MalformedCipherStream`],
///   [`FlowError::BadPadding`]
///
/// # Example
///
/// ```
/// use flowrs::FlowError;
///
/// fn handle_error(err: FlowError) {
///     match err {
///         FlowError::WorkerFault { message } => eprintln!("worker died: {}", message),
///         FlowError::DecodeUnderflow { needed, available } => {
///             eprintln!("short read: needed {}, had {}", needed, available)
///         }
///         _ => eprintln!("other error"),
///     }
/// }
/// ```
#[derive(Debug)]
pub enum FlowError {
    /// An impossible message appeared on a protocol channel, or end-of-stream
    /// arrived while values were still expected.
    Protocol {
        /// Description of the violated rule.
        message: &'static str,
    },

    /// The generator raised an error or the worker task died.
    ///
    /// Surfaced as the final element of the consumer stream before it
    /// terminates.
    WorkerFault {
        /// Description of the failure, including panic payloads.
        message: String,
    },

    /// A typed read ran out of bytes mid-field.
    ///
    /// The underlying stream is not closed; the caller decides how to
    /// proceed.
    DecodeUnderflow {
        /// Bytes the read required.
        needed: usize,
        /// Bytes actually available.
        available: usize,
    },

    /// A length-prefixed string did not contain valid UTF-8.
    BadUtf8,

    /// A string's UTF-8 encoding exceeded the 2-byte length prefix.
    LengthOverflow {
        /// The encoded byte length that overflowed.
        len: usize,
    },

    /// Ciphertext byte count was not a positive multiple of the block size.
    MalformedCipherStream {
        /// Total ciphertext bytes observed.
        len: usize,
        /// The cipher's block size.
        block_size: usize,
    },

    /// The final block's padding count was outside `1..=block_size`.
    BadPadding {
        /// The pad count read from the final block.
        count: usize,
        /// The cipher's block size.
        block_size: usize,
    },

    /// The consumer disappeared while the producer was sending.
    ///
    /// Producer sessions treat this as a clean shutdown, not a failure; it
    /// is only visible to generator code that wants to stop early.
    ConsumerGone,

    /// A method was invoked outside its legal lifecycle, such as writing to
    /// a closed sink.
    IllegalCall {
        /// Description of the misuse.
        message: &'static str,
    },
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowError::Protocol { message } => write!(f, "protocol violation: {}", message),
            FlowError::WorkerFault { message } => write!(f, "worker fault: {}", message),
            FlowError::DecodeUnderflow { needed, available } => {
                write!(
                    f,
                    "decode underflow: needed {} bytes, {} available",
                    needed, available
                )
            }
            FlowError::BadUtf8 => write!(f, "invalid utf-8 in length-prefixed string"),
            FlowError::LengthOverflow { len } => {
                write!(f, "string length {} exceeds u16 prefix", len)
            }
            FlowError::MalformedCipherStream { len, block_size } => {
                write!(
                    f,
                    "malformed cipher stream: {} bytes is not a positive multiple of {}",
                    len, block_size
                )
            }
            FlowError::BadPadding { count, block_size } => {
                write!(f, "bad padding: count {} outside 1..={}", count, block_size)
            }
            FlowError::ConsumerGone => write!(f, "consumer gone"),
            FlowError::IllegalCall { message } => write!(f, "illegal call: {}", message),
        }
    }
}

impl std::error::Error for FlowError {}

impl From<std::str::Utf8Error> for FlowError {
    fn from(_: std::str::Utf8Error) -> Self {
        FlowError::BadUtf8
    }
}
