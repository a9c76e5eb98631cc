//! Default paths for respited components
//!
//! - Config: `$RESPITE_CONFIG`, else `$XDG_CONFIG_HOME/respite/config.toml`
//!   (`~/.config/respite/config.toml`)
//! - Input devices: `/dev/input`

use std::path::PathBuf;

/// Environment variable for overriding the config file path
pub const RESPITE_CONFIG_ENV: &str = "RESPITE_CONFIG";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Application subdirectory name
const APP_DIR: &str = "respite";

/// Directory scanned for `event*` input devices
pub const DEFAULT_INPUT_DIR: &str = "/dev/input";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$RESPITE_CONFIG` environment variable (if set)
/// 2. the platform config directory (`$XDG_CONFIG_HOME` or `~/.config`)
/// 3. `/etc/respite/config.toml` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(RESPITE_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    config_path_without_env()
}

/// Get the config path without checking the RESPITE_CONFIG env var.
pub fn config_path_without_env() -> PathBuf {
    match dirs::config_dir() {
        Some(dir) => dir.join(APP_DIR).join(CONFIG_FILENAME),
        None => PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILENAME),
    }
}

pub fn default_input_dir() -> PathBuf {
    PathBuf::from(DEFAULT_INPUT_DIR)
}
