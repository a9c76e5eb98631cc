//! Shared utilities for respited
//!
//! This crate provides:
//! - Error types
//! - Time utilities (monotonic time, signed countdown helpers)
//! - Default paths for the configuration file

mod error;
mod paths;
mod time;

pub use error::*;
pub use paths::*;
pub use time::*;
