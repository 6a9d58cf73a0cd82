//! Wire frames for the credit protocol.
//!
//! The data channel carries a tagged union instead of sentinel objects: a
//! statically typed channel makes forged control messages unrepresentable,
//! so no per-session unforgeable tokens are needed.

/// One message on the data channel.
#[derive(Debug)]
pub(crate) enum Frame<T> {
    /// A user value.
    Value(T),
    /// Credit marker; the consumer echoes one [`Ack`] for each.
    Ack,
    /// End of stream; acknowledged like a credit marker, then the session
    /// winds down.
    Eof,
}

/// The only message type the ack channel can carry.
#[derive(Debug)]
pub(crate) struct Ack;
