//! Error types for PollKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using PollKvError
pub type Result<T> = std::result::Result<T, PollKvError>;

/// Unified error type for PollKV operations
#[derive(Debug, Error)]
pub enum PollKvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Frame too long: {len} bytes (max {max})")]
    FrameTooLong { len: usize, max: usize },

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PollKvError {
    /// Whether this error is a malformed frame from the peer (as opposed to
    /// a transport or local failure)
    pub fn is_protocol(&self) -> bool {
        matches!(self, PollKvError::FrameTooLong { .. } | PollKvError::Protocol(_))
    }
}
