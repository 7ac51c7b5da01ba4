//! Error types for the wire protocol.

use std::io;

/// Alias for `Result<T, lotto_proto::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while moving frames and records over a byte stream.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The underlying transport failed to connect, read or write.
    #[error("transport error: {0}")]
    Transport(#[source] io::Error),

    /// The peer closed the stream before a complete read was satisfied.
    #[error("stream truncated: expected {expected} bytes, received {received}")]
    TruncatedStream {
        /// Bytes requested.
        expected: usize,
        /// Bytes obtained before end-of-data.
        received: usize,
    },

    /// A bet record had the wrong field count or an unparseable field.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// The peer sent something the protocol does not allow.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// A payload does not fit the 4-byte length field.
    #[error("payload of {0} bytes exceeds the frame length field")]
    PayloadTooLarge(usize),

    /// A batch must carry at least one bet.
    #[error("cannot encode an empty batch")]
    EmptyBatch,
}

impl Error {
    /// Returns `true` for failures of the transport itself, as opposed to
    /// malformed content.
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::TruncatedStream { .. })
    }
}
