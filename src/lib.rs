//! # flowrs
//!
//! Credit-controlled cross-worker streaming for Rust.
//!
//! `flowrs` runs a value-generating routine in a dedicated worker task and
//! hands the calling context its results as a lazy stream. The heart of the
//! crate is the protocol that keeps the in-flight channel buffer bounded
//! without stalling unnecessarily: a two-party credit/acknowledgement
//! scheme layered over a unidirectional data channel. On top of it ride a
//! streaming block-cipher pipeline and a big-endian data codec, so whole
//! encrypt-serialize-stream-decrypt pipelines compose from small adapters:
//!
//! - **Credit stream** - [`CreditStream`] spawns a [`Generator`] into a
//!   worker and yields its values with bounded channel occupancy
//! - **Cipher pipeline** - [`EncryptingSink`] and [`DecryptingStream`] move
//!   arbitrary-sized chunks through a fixed-block cipher with PKCS#7
//!   padding, never buffering the whole dataset
//! - **Data codec** - [`DataWriter`], [`SliceReader`] and [`ChunkReader`]
//!   serialize primitives big-endian over sinks and chunk streams
//!
//! ## Design Philosophy
//!
//! The two sides of a stream share no state: the generator is *moved* into
//! the worker, channels own one endpoint per party, and all coordination is
//! message passing. Flow control is the producer's ledger alone - the
//! channels themselves are unbounded, and the credit protocol is what keeps
//! their occupancy within `2 × ack_unit` regardless of production rate.
//!
//! Concrete cipher primitives are injected as a [`BlockCipher`] capability;
//! the crate knows block sizes and padding, not algorithms.
//!
//! ## Credit protocol
//!
//! Every value costs twice its size in pending units. Each time the pending
//! amount crosses the ack unit (`max(2, budget)`), the producer interleaves
//! an ack marker into the data channel; the consumer returns each marker on
//! the ack channel as it drains past it. Two markers per full buffer mean
//! credit returns in halves: a waiting producer resumes once the consumer
//! is half drained. A budget of `1` keeps the channel empty between sends,
//! and budgets `<= 0` give rendezvous semantics - `send` returns only after
//! the consumer has observed the value.
//!
//! # Examples
//!
//! ## Streaming from an iterator
//!
//! ```ignore
//! use flowrs::{CreditStream, IterGenerator};
//! use futures_util::StreamExt;
//!
//! let mut stream = CreditStream::spawn(IterGenerator::new(0..1000));
//! while let Some(value) = stream.next().await {
//!     println!("{}", value?);
//! }
//! ```
//!
//! ## An encrypted record pipeline
//!
//! ```ignore
//! use flowrs::{
//!     ChunkReader, ChunkSink, CreditStream, DataWriter, DecryptingStream,
//!     EncryptingSink, stream_bytes,
//! };
//!
//! // Worker side: typed writes -> block encryption -> credit stream
//! let stream = stream_bytes(|producer| Box::pin(async move {
//!     let sink = ChunkSink::new(producer);
//!     let mut writer = DataWriter::new(EncryptingSink::new(cipher_enc, sink));
//!     writer.write_u64(42)?;
//!     writer.write_utf8("record")?;
//!     writer.flush_if_needed().await?;
//!     writer.close()
//! }));
//!
//! // Consumer side: decrypt the chunks, read the values back
//! let mut reader = ChunkReader::new(DecryptingStream::new(cipher_dec, stream));
//! assert_eq!(reader.read_u64().await?, 42);
//! assert_eq!(reader.read_utf8().await?, "record");
//! assert!(reader.is_eof().await?);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

// Public modules
mod cipher;
mod codec;
mod config;
mod error;
mod sink;
mod stream;

//
// Public API surface
//
// The public API is intentionally minimal. Only essential types are exported
// to keep the surface area small and the API stable.
//

/// Block-cipher capabilities and the streaming encrypt/decrypt adapters.
pub use cipher::{BlockCipher, DecryptingStream, EncryptingSink, Padding, Pkcs7};

/// Big-endian typed readers and writer.
pub use codec::{ChunkReader, DataWriter, SliceReader};

/// Session options for spawning workers.
pub use config::{StreamConfig, DEFAULT_BYTE_BUDGET};

/// Error type for all operations.
pub use error::FlowError;

/// Byte sink abstraction and the in-memory sink.
pub use sink::{BufferSink, ByteSink};

/// The credit stream, its generator contract and adapters.
pub use stream::{
    stream_bytes, ByteGenerator, ChunkSink, CreditStream, FnGenerator, Generator, IterGenerator,
    KillPriority, Producer, DEFAULT_ITEM_BUDGET,
};
