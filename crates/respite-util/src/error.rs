//! Error types for respited

use thiserror::Error;

/// Top-level error type for respited operations
#[derive(Debug, Error)]
pub enum RespiteError {
    #[error("Host error: {0}")]
    HostError(String),

    #[error("State machine error: {0}")]
    StateError(String),
}

impl RespiteError {
    pub fn host(msg: impl Into<String>) -> Self {
        Self::HostError(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        Self::StateError(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, RespiteError>;
