//! Engine error types.

use crate::config::{ConfigError, EngineMode};
use thiserror::Error;

/// Engine errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("core error: {0}")]
    Core(#[from] aetherium_core::CoreError),

    #[error("transport error: {0}")]
    Transport(#[from] aetherium_transport::TransportError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("mode '{0}' is not supported yet")]
    UnsupportedMode(EngineMode),
}

impl EngineError {
    /// Returns a stable error code for diagnostics.
    pub fn error_code(&self) -> &'static str {
        match self {
            EngineError::Core(e) => e.error_code(),
            EngineError::Transport(_) => "TRANSPORT_ERROR",
            EngineError::Config(_) => "CONFIG_ERROR",
            EngineError::UnsupportedMode(_) => "UNSUPPORTED_MODE",
        }
    }
}
