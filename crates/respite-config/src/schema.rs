//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Work, idle and rest thresholds
    #[serde(default)]
    pub timer: RawTimerConfig,

    /// Screen-locker settings
    #[serde(default)]
    pub lock: RawLockConfig,

    /// Input activity settings
    #[serde(default)]
    pub activity: RawActivityConfig,
}

/// Timer settings. Unset values fall back to the defaults in `Timers`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawTimerConfig {
    /// Work time before the screen is locked
    pub work_interval_seconds: Option<u64>,

    /// Input-free time after which the session counts as idle
    pub max_idle_seconds: Option<u64>,

    /// How long the screen stays locked
    pub rest_seconds: Option<u64>,

    /// Period of the driver tick
    pub tick_millis: Option<u64>,

    /// Whether the work countdown is checked before or after it is decremented
    pub lock_check: Option<RawLockCheck>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RawLockCheck {
    BeforeDecrement,
    AfterDecrement,
}

/// Screen-locker command
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawLockConfig {
    /// argv of a locker that stays in the foreground until killed
    pub command: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawActivityConfig {
    /// Directory holding `event*` input devices
    pub input_dir: Option<PathBuf>,
}
