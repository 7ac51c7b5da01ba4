//! Error types for lotto client operations.

use lotto_proto::MessageType;

use crate::client::Phase;

/// Alias for `Result<T, lotto::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by bet sources, configuration and client runs.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Framing, codec or transport failure.
    #[error(transparent)]
    Proto(#[from] lotto_proto::Error),

    /// The server answered with a message type the current phase forbids.
    #[error("unexpected {got} reply while {phase}")]
    UnexpectedReply {
        /// Phase the client was in.
        phase: Phase,
        /// Message type received.
        got: MessageType,
    },

    /// The server answered with an `Error` frame.
    #[error("server rejected the request: {0}")]
    Rejected(String),

    /// Every attempt to deliver the end-of-submission frame failed.
    #[error("end of submission not delivered after {attempts} attempts")]
    EndNotDelivered {
        /// Attempts made, including the first.
        attempts: u32,
        /// Failure of the last attempt.
        #[source]
        source: lotto_proto::Error,
    },

    /// A line of the bets file could not be parsed.
    #[error("invalid bet on line {line}: {reason}")]
    InvalidBet {
        /// 1-based line number.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The bet producer thread is gone.
    #[error("bet source disconnected")]
    SourceDisconnected,

    /// The run was stopped through a [`ShutdownHandle`](crate::ShutdownHandle).
    #[error("run cancelled")]
    Cancelled,

    /// The configuration file is not valid JSON for [`ClientConfig`](crate::ClientConfig).
    #[error("invalid configuration file: {0}")]
    Config(#[from] serde_json::Error),

    /// An I/O error reading bets or configuration.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
