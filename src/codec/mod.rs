//! Big-endian data codec.
//!
//! Stateless serialization of primitive values over byte sinks and byte
//! streams. All multi-byte integers are big-endian; strings are UTF-8 with a
//! 2-byte unsigned length prefix. A paired write-then-read cycle is the
//! identity on representable values.
//!
//! - [`DataWriter`] - typed writes into any [`ByteSink`](crate::ByteSink)
//! - [`SliceReader`] - typed reads from a complete in-memory buffer
//! - [`ChunkReader`] - typed reads from an asynchronous chunk stream

mod reader;
mod writer;

pub use reader::{ChunkReader, SliceReader};
pub use writer::DataWriter;
