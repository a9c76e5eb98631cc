//! Host collaborator traits

use respite_util::RespiteError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while setting up a host collaborator
#[derive(Debug, Error)]
pub enum HostError {
    #[error("No readable input devices under {0}")]
    NoInputDevices(PathBuf),

    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Stop failed: {0}")]
    StopFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type HostResult<T> = Result<T, HostError>;

impl From<HostError> for RespiteError {
    fn from(err: HostError) -> Self {
        RespiteError::host(err.to_string())
    }
}

/// Source of user input activity.
///
/// The signal is sticky: once any input event is observed it stays set
/// until `clear_activity` consumes it.
pub trait ActivitySource: Send + Sync {
    /// Whether any input event occurred since the last clear
    fn has_activity(&self) -> bool;

    /// Consume the activity signal
    fn clear_activity(&self);
}

/// Something that can lock and unlock the display.
///
/// Calls must not block. Failures are handled (logged) by the
/// implementation; the state machine never sees them.
pub trait LockSurface: Send + Sync {
    fn engage_lock(&self);

    fn release_lock(&self);
}
