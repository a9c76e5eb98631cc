//! Config validation CLI tool
//!
//! Validates a respited configuration file and reports any errors.

use respite_config::{CURRENT_CONFIG_VERSION, ConfigError, LockCheck};
use respite_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a respited configuration file.");
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match respite_config::load_config(&config_path) {
        Ok(settings) => {
            let timers = &settings.timers;
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", CURRENT_CONFIG_VERSION);
            println!("  Work interval:  {}s", timers.work_interval.as_secs());
            println!("  Max idle:       {}s", timers.max_idle.as_secs());
            println!("  Rest:           {}s", timers.rest.as_secs());
            println!("  Tick:           {}ms", timers.tick.as_millis());
            println!(
                "  Lock check:     {}",
                match timers.lock_check {
                    LockCheck::BeforeDecrement => "before decrement",
                    LockCheck::AfterDecrement => "after decrement",
                }
            );
            println!("  Lock command:   {}", settings.lock.command.join(" "));
            println!("  Input devices:  {}", settings.activity.input_dir.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver, CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
