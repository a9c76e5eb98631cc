//! Linux host collaborators for respited
//!
//! Provides:
//! - Input activity detection by watching `/dev/input/event*` devices
//! - Screen locking by running a locker command in its own process group
//! - Graceful (SIGTERM) and forceful (SIGKILL) termination of the locker

mod activity;
mod lock;
mod process;

pub use activity::*;
pub use lock::*;
pub use process::*;
