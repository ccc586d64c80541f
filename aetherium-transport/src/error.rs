//! Transport error types.

use thiserror::Error;

/// Errors raised by transports and the line codec.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Nothing is queued right now; try again at the next poll.
    #[error("no message available")]
    Unavailable,

    #[error("transport is not connected")]
    NotConnected,

    #[error("transport is closed")]
    Closed,

    #[error("cannot decode line '{line}': {reason}")]
    Decode { line: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TransportError {
    pub fn decode(line: impl Into<String>, reason: impl Into<String>) -> Self {
        TransportError::Decode {
            line: line.into(),
            reason: reason.into(),
        }
    }

    /// Returns whether a later `receive` may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Unavailable)
    }
}
