//! Configuration validation

use crate::schema::RawConfig;
use crate::settings::{
    DEFAULT_MAX_IDLE_SECS, DEFAULT_REST_SECS, DEFAULT_TICK_MILLIS, DEFAULT_WORK_INTERVAL_SECS,
};
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("'{field}' must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("tick of {tick_millis}ms is longer than '{field}' ({threshold_secs}s)")]
    TickTooCoarse {
        field: &'static str,
        tick_millis: u64,
        threshold_secs: u64,
    },

    #[error("Lock command: {0}")]
    LockCommand(String),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let timer = &config.timer;
    let thresholds = [
        (
            "work_interval_seconds",
            timer.work_interval_seconds.unwrap_or(DEFAULT_WORK_INTERVAL_SECS),
        ),
        (
            "max_idle_seconds",
            timer.max_idle_seconds.unwrap_or(DEFAULT_MAX_IDLE_SECS),
        ),
        ("rest_seconds", timer.rest_seconds.unwrap_or(DEFAULT_REST_SECS)),
    ];
    let tick_millis = timer.tick_millis.unwrap_or(DEFAULT_TICK_MILLIS);

    for (field, secs) in thresholds {
        if secs == 0 {
            errors.push(ValidationError::ZeroDuration { field });
        }
    }

    if tick_millis == 0 {
        errors.push(ValidationError::ZeroDuration {
            field: "tick_millis",
        });
    }

    // Zero thresholds are already reported above
    for (field, secs) in thresholds {
        if secs > 0 && tick_millis > secs.saturating_mul(1000) {
            errors.push(ValidationError::TickTooCoarse {
                field,
                tick_millis,
                threshold_secs: secs,
            });
        }
    }

    if let Some(command) = &config.lock.command {
        match command.first() {
            None => errors.push(ValidationError::LockCommand("command cannot be empty".into())),
            Some(program) if program.trim().is_empty() => errors.push(
                ValidationError::LockCommand("program name cannot be blank".into()),
            ),
            Some(_) => {}
        }
    }

    errors
}
