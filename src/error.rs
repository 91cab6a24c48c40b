//! Unified error handling for slirc-logd.
//!
//! Each concern gets its own enum so callers can decide what is fatal: a
//! connection error is retried forever, a log store error is scoped to one
//! channel, and neither ever takes the process down. Channel source errors
//! live in `source` next to sqlx, config errors in `config`.

use std::io;
use std::path::PathBuf;

use slirc_line::ProtocolError;
use thiserror::Error;

// ============================================================================
// Log Store Errors
// ============================================================================

/// A log file could not be created, written or flushed.
#[derive(Debug, Error)]
pub enum LogStoreError {
    #[error("failed to create log directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to open log file {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("failed to write log file {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to flush log file {path}: {source}")]
    Flush { path: PathBuf, source: io::Error },
}

impl LogStoreError {
    /// Static error code for structured log fields.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::CreateDir { .. } => "create_dir",
            Self::Open { .. } => "open",
            Self::Write { .. } => "write",
            Self::Flush { .. } => "flush",
        }
    }

    /// The file or directory the failure concerns.
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::CreateDir { path, .. }
            | Self::Open { path, .. }
            | Self::Write { path, .. }
            | Self::Flush { path, .. } => path,
        }
    }
}

// ============================================================================
// Connection Errors
// ============================================================================

/// Failure to establish or keep the network session. Always transient.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("connection attempt timed out")]
    Timeout,

    #[error("invalid server name: {0}")]
    InvalidServerName(String),

    #[error("tls handshake failed: {0}")]
    Tls(String),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("session closed")]
    Closed,
}

impl ConnectionError {
    /// Static error code for structured log fields.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Timeout => "timeout",
            Self::InvalidServerName(_) => "invalid_server_name",
            Self::Tls(_) => "tls",
            Self::Protocol(_) => "protocol",
            Self::Closed => "closed",
        }
    }
}
