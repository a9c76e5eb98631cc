//! Validated settings consumed by the state machine and the daemon

use crate::schema::{RawActivityConfig, RawConfig, RawLockCheck, RawLockConfig, RawTimerConfig};
use respite_util::default_input_dir;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_WORK_INTERVAL_SECS: u64 = 45 * 60;
pub const DEFAULT_MAX_IDLE_SECS: u64 = 5 * 60;
pub const DEFAULT_REST_SECS: u64 = 5 * 60;
pub const DEFAULT_TICK_MILLIS: u64 = 1000;

/// Validated configuration ready for use by the daemon
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub timers: Timers,
    pub lock: LockConfig,
    pub activity: ActivityConfig,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            timers: Timers::from_raw(raw.timer),
            lock: LockConfig::from_raw(raw.lock),
            activity: ActivityConfig::from_raw(raw.activity),
        }
    }
}

/// When the Active state's work countdown is compared against zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockCheck {
    /// Check, then decrement. The lock fires on the first tick that
    /// observes an already-depleted countdown, one tick after the
    /// threshold was crossed.
    #[default]
    BeforeDecrement,
    /// Decrement, then check. The lock fires on the tick that depletes
    /// the countdown.
    AfterDecrement,
}

impl From<RawLockCheck> for LockCheck {
    fn from(raw: RawLockCheck) -> Self {
        match raw {
            RawLockCheck::BeforeDecrement => Self::BeforeDecrement,
            RawLockCheck::AfterDecrement => Self::AfterDecrement,
        }
    }
}

/// Thresholds driving the work/rest cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timers {
    /// Loaded into the work countdown each time Active is entered
    pub work_interval: Duration,
    /// Input-free time after which Active gives way to Idle
    pub max_idle: Duration,
    /// Time spent Locked before returning to Active
    pub rest: Duration,
    /// Driver cadence; the state machine itself only sees elapsed time
    pub tick: Duration,
    pub lock_check: LockCheck,
}

impl Timers {
    fn from_raw(raw: RawTimerConfig) -> Self {
        Self {
            work_interval: Duration::from_secs(
                raw.work_interval_seconds.unwrap_or(DEFAULT_WORK_INTERVAL_SECS),
            ),
            max_idle: Duration::from_secs(raw.max_idle_seconds.unwrap_or(DEFAULT_MAX_IDLE_SECS)),
            rest: Duration::from_secs(raw.rest_seconds.unwrap_or(DEFAULT_REST_SECS)),
            tick: Duration::from_millis(raw.tick_millis.unwrap_or(DEFAULT_TICK_MILLIS)),
            lock_check: raw.lock_check.map(LockCheck::from).unwrap_or_default(),
        }
    }
}

impl Default for Timers {
    fn default() -> Self {
        Self::from_raw(RawTimerConfig::default())
    }
}

/// Screen-locker command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockConfig {
    pub command: Vec<String>,
}

impl LockConfig {
    fn from_raw(raw: RawLockConfig) -> Self {
        Self {
            command: raw.command.unwrap_or_else(default_lock_command),
        }
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            command: default_lock_command(),
        }
    }
}

fn default_lock_command() -> Vec<String> {
    vec!["i3lock".into(), "-n".into()]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityConfig {
    pub input_dir: PathBuf,
}

impl ActivityConfig {
    fn from_raw(raw: RawActivityConfig) -> Self {
        Self {
            input_dir: raw.input_dir.unwrap_or_else(default_input_dir),
        }
    }
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
        }
    }
}
