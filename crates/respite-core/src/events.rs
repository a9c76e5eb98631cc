//! Core events emitted by the engine

use chrono::{DateTime, Local};

use crate::StateId;

/// Events emitted by the core engine
#[derive(Debug, Clone, PartialEq)]
pub enum CoreEvent {
    /// The current state changed
    Transitioned {
        from: StateId,
        to: StateId,
        at: DateTime<Local>,
    },

    /// The work countdown was paused or resumed
    PauseChanged { paused: bool },
}

impl CoreEvent {
    /// Destination state, if this event is a transition
    pub fn target(&self) -> Option<StateId> {
        match self {
            CoreEvent::Transitioned { to, .. } => Some(*to),
            CoreEvent::PauseChanged { .. } => None,
        }
    }
}
