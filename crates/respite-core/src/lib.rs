//! Work/rest state machine for respited
//!
//! This crate is the heart of respited, containing:
//! - The state registry (Init, Active, Idle, Locked)
//! - Per-state behavior: guards, enter/leave hooks, tick handlers
//! - The transition engine and tick dispatcher (`CoreEngine`)
//!
//! The engine is synchronous and owns all of its state. The outer driver
//! feeds it elapsed time; input activity and the screen lock are reached
//! through the `respite-host-api` traits.

mod engine;
mod events;
mod state;

pub use engine::*;
pub use events::*;
pub use state::*;
