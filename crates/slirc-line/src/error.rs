//! Error types for line parsing and framing.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Top-level protocol errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The line could not be parsed as an IRC message.
    #[error("invalid message {string:?}: {cause}")]
    InvalidMessage {
        /// The offending line.
        string: String,
        /// Why it was rejected.
        cause: MessageParseError,
    },
}

/// Reasons a single line fails to parse.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum MessageParseError {
    /// Nothing but whitespace.
    #[error("empty message")]
    EmptyMessage,

    /// The command token is neither letters nor a three-digit numeric.
    #[error("invalid command at position {position}")]
    InvalidCommand {
        /// Character offset where parsing stopped.
        position: usize,
    },

    /// A known command arrived with too few parameters.
    #[error("not enough arguments for {command}: expected {expected}, got {got}")]
    NotEnoughArguments {
        /// Command name.
        command: String,
        /// Minimum parameter count.
        expected: usize,
        /// Actual parameter count.
        got: usize,
    },
}
