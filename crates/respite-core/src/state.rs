//! State registry and per-state behavior

use chrono::TimeDelta;
use respite_config::{LockCheck, Timers};
use respite_host_api::{ActivitySource, LockSurface};
use respite_util::to_signed;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Identifier of a machine state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateId {
    /// Bootstrap pseudo-state, left once at startup and never re-entered
    Init,
    Active,
    Idle,
    Locked,
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateId::Init => write!(f, "Init"),
            StateId::Active => write!(f, "Active"),
            StateId::Idle => write!(f, "Idle"),
            StateId::Locked => write!(f, "Locked"),
        }
    }
}

/// Counters owned by the Active state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActiveState {
    /// Signed: keeps counting below zero until the lock check notices
    pub work_time_left: TimeDelta,
    /// Time since input was last seen
    pub idle_time: Duration,
}

/// Counters owned by the Locked state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LockedState {
    pub rest_time: Duration,
}

/// A machine state together with the counters it owns.
///
/// Counters live and die with their variant, so nothing carries over
/// from a previous visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    Init,
    Active(ActiveState),
    Idle,
    Locked(LockedState),
}

/// Look up the behavior for a state identifier.
///
/// Returns the variant as it exists before its enter hook has run.
pub fn lookup(id: StateId) -> State {
    match id {
        StateId::Init => State::Init,
        StateId::Active => State::Active(ActiveState::default()),
        StateId::Idle => State::Idle,
        StateId::Locked => State::Locked(LockedState::default()),
    }
}

/// Everything a tick handler may consult
pub struct TickContext<'a> {
    pub timers: &'a Timers,
    pub activity: &'a dyn ActivitySource,
    pub paused: bool,
}

impl State {
    pub fn id(&self) -> StateId {
        match self {
            State::Init => StateId::Init,
            State::Active(_) => StateId::Active,
            State::Idle => StateId::Idle,
            State::Locked(_) => StateId::Locked,
        }
    }

    /// Guard: may this state be entered from `from`?
    pub fn permits_entry(&self, _from: StateId) -> bool {
        match self {
            State::Init => false,
            State::Active(_) | State::Idle | State::Locked(_) => true,
        }
    }

    /// Enter hook. `from` is the outgoing state.
    pub fn enter(&mut self, _from: StateId, timers: &Timers, lock: &dyn LockSurface) {
        match self {
            State::Init | State::Idle => {}
            State::Active(active) => {
                active.work_time_left = to_signed(timers.work_interval);
                active.idle_time = Duration::ZERO;
            }
            State::Locked(locked) => {
                locked.rest_time = Duration::ZERO;
                lock.engage_lock();
            }
        }
    }

    /// Leave hook
    pub fn leave(&mut self, lock: &dyn LockSurface) {
        match self {
            State::Init | State::Active(_) | State::Idle => {}
            State::Locked(_) => lock.release_lock(),
        }
    }

    /// Tick handler. Returns the state a transition is requested to, if any.
    pub fn tick(&mut self, elapsed: Duration, ctx: &TickContext<'_>) -> Option<StateId> {
        match self {
            State::Init => None,
            State::Active(active) => active.tick(elapsed, ctx),
            State::Idle => {
                let active = ctx.activity.has_activity();
                ctx.activity.clear_activity();
                active.then_some(StateId::Active)
            }
            State::Locked(locked) => locked.tick(elapsed, ctx.timers),
        }
    }
}

impl ActiveState {
    fn tick(&mut self, elapsed: Duration, ctx: &TickContext<'_>) -> Option<StateId> {
        debug!(
            work_time_left_secs = self.work_time_left.num_seconds(),
            idle_secs = self.idle_time.as_secs(),
            paused = ctx.paused,
            "Active tick"
        );

        let lock_check = ctx.timers.lock_check;

        // Returning early drops the remaining steps together with these
        // counters, so Active can never hand over to Idle from Locked.
        if lock_check == LockCheck::BeforeDecrement && self.is_depleted() {
            return Some(StateId::Locked);
        }

        if !ctx.paused {
            self.work_time_left = self
                .work_time_left
                .checked_sub(&to_signed(elapsed))
                .unwrap_or(TimeDelta::MIN);
        }

        if lock_check == LockCheck::AfterDecrement && self.is_depleted() {
            return Some(StateId::Locked);
        }

        if ctx.activity.has_activity() {
            self.idle_time = Duration::ZERO;
        } else {
            self.idle_time = self.idle_time.saturating_add(elapsed);
        }
        ctx.activity.clear_activity();

        (self.idle_time >= ctx.timers.max_idle).then_some(StateId::Idle)
    }

    fn is_depleted(&self) -> bool {
        self.work_time_left <= TimeDelta::zero()
    }
}

impl LockedState {
    fn tick(&mut self, elapsed: Duration, timers: &Timers) -> Option<StateId> {
        // Rest accrues regardless of the pause flag
        self.rest_time = self.rest_time.saturating_add(elapsed);

        debug!(
            rest_secs = self.rest_time.as_secs(),
            rest_target_secs = timers.rest.as_secs(),
            "Locked tick"
        );

        (self.rest_time >= timers.rest).then_some(StateId::Active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use respite_host_api::{MockActivity, MockLock};

    fn timers(work: u64, idle: u64, rest: u64) -> Timers {
        Timers {
            work_interval: Duration::from_secs(work),
            max_idle: Duration::from_secs(idle),
            rest: Duration::from_secs(rest),
            tick: Duration::from_secs(1),
            lock_check: LockCheck::BeforeDecrement,
        }
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn lookup_is_total_and_fresh() {
        for id in [StateId::Init, StateId::Active, StateId::Idle, StateId::Locked] {
            assert_eq!(lookup(id).id(), id);
        }
        assert_eq!(
            lookup(StateId::Locked),
            State::Locked(LockedState {
                rest_time: Duration::ZERO
            })
        );
    }

    #[test]
    fn only_init_rejects_entry() {
        assert!(!lookup(StateId::Init).permits_entry(StateId::Active));
        for id in [StateId::Active, StateId::Idle, StateId::Locked] {
            for from in [StateId::Init, StateId::Active, StateId::Idle, StateId::Locked] {
                assert!(lookup(id).permits_entry(from));
            }
        }
    }

    #[test]
    fn active_enter_resets_counters() {
        let lock = MockLock::new();
        let mut state = State::Active(ActiveState {
            work_time_left: TimeDelta::seconds(-7),
            idle_time: secs(4),
        });

        state.enter(StateId::Locked, &timers(10, 5, 3), &lock);

        assert_eq!(
            state,
            State::Active(ActiveState {
                work_time_left: TimeDelta::seconds(10),
                idle_time: Duration::ZERO,
            })
        );
        assert!(lock.calls().is_empty());
    }

    #[test]
    fn locked_hooks_drive_the_lock() {
        let lock = MockLock::new();
        let mut state = State::Locked(LockedState { rest_time: secs(9) });

        state.enter(StateId::Active, &timers(10, 5, 3), &lock);
        assert_eq!(state, State::Locked(LockedState::default()));
        assert!(lock.is_engaged());

        state.leave(&lock);
        assert_eq!(lock.engage_count(), 1);
        assert_eq!(lock.release_count(), 1);
    }

    #[test]
    fn active_tick_accumulates_idle_without_activity() {
        let activity = MockActivity::new();
        let t = timers(10, 5, 3);
        let ctx = TickContext {
            timers: &t,
            activity: &activity,
            paused: false,
        };
        let mut state = State::Active(ActiveState {
            work_time_left: TimeDelta::seconds(10),
            idle_time: Duration::ZERO,
        });

        assert_eq!(state.tick(secs(2), &ctx), None);
        assert_eq!(
            state,
            State::Active(ActiveState {
                work_time_left: TimeDelta::seconds(8),
                idle_time: secs(2),
            })
        );
        assert_eq!(activity.clear_count(), 1);
    }

    #[test]
    fn active_tick_resets_idle_on_activity() {
        let activity = MockActivity::new();
        let t = timers(10, 5, 3);
        let ctx = TickContext {
            timers: &t,
            activity: &activity,
            paused: false,
        };
        let mut state = State::Active(ActiveState {
            work_time_left: TimeDelta::seconds(10),
            idle_time: secs(4),
        });

        activity.set_activity(true);
        assert_eq!(state.tick(secs(3), &ctx), None);
        assert_eq!(
            state,
            State::Active(ActiveState {
                work_time_left: TimeDelta::seconds(7),
                idle_time: Duration::ZERO,
            })
        );
        assert!(!activity.has_activity());
    }

    #[test]
    fn depleted_active_requests_lock_and_skips_the_rest() {
        let activity = MockActivity::new();
        let t = timers(10, 1, 3);
        let ctx = TickContext {
            timers: &t,
            activity: &activity,
            paused: false,
        };
        let before = ActiveState {
            work_time_left: TimeDelta::zero(),
            idle_time: secs(30),
        };
        let mut state = State::Active(before);

        assert_eq!(state.tick(secs(1), &ctx), Some(StateId::Locked));
        assert_eq!(state, State::Active(before));
        assert_eq!(activity.read_count(), 0);
    }

    #[test]
    fn after_decrement_check_locks_on_the_crossing_tick() {
        let activity = MockActivity::new();
        let mut t = timers(10, 5, 3);
        t.lock_check = LockCheck::AfterDecrement;
        let ctx = TickContext {
            timers: &t,
            activity: &activity,
            paused: false,
        };
        let mut state = State::Active(ActiveState {
            work_time_left: TimeDelta::seconds(2),
            idle_time: Duration::ZERO,
        });

        activity.set_activity(true);
        assert_eq!(state.tick(secs(5), &ctx), Some(StateId::Locked));
    }

    #[test]
    fn paused_active_keeps_work_time() {
        let activity = MockActivity::new();
        let t = timers(10, 50, 3);
        let ctx = TickContext {
            timers: &t,
            activity: &activity,
            paused: true,
        };
        let mut state = State::Active(ActiveState {
            work_time_left: TimeDelta::seconds(6),
            idle_time: Duration::ZERO,
        });

        for _ in 0..4 {
            assert_eq!(state.tick(secs(3), &ctx), None);
        }
        assert_eq!(
            state,
            State::Active(ActiveState {
                work_time_left: TimeDelta::seconds(6),
                idle_time: secs(12),
            })
        );
    }

    #[test]
    fn idle_tick_consumes_activity() {
        let activity = MockActivity::new();
        let t = timers(10, 5, 3);
        let ctx = TickContext {
            timers: &t,
            activity: &activity,
            paused: false,
        };
        let mut state = State::Idle;

        assert_eq!(state.tick(secs(1), &ctx), None);
        assert_eq!(activity.clear_count(), 1);

        activity.set_activity(true);
        assert_eq!(state.tick(secs(1), &ctx), Some(StateId::Active));
        assert_eq!(activity.clear_count(), 2);
        assert!(!activity.has_activity());
    }

    #[test]
    fn locked_tick_accrues_rest_even_when_paused() {
        let activity = MockActivity::new();
        let t = timers(10, 5, 3);
        let ctx = TickContext {
            timers: &t,
            activity: &activity,
            paused: true,
        };
        let mut state = State::Locked(LockedState::default());

        assert_eq!(state.tick(secs(2), &ctx), None);
        assert_eq!(state, State::Locked(LockedState { rest_time: secs(2) }));
        assert_eq!(state.tick(secs(2), &ctx), Some(StateId::Active));
        assert_eq!(activity.read_count(), 0);
    }

    #[test]
    fn huge_elapsed_saturates_instead_of_wrapping() {
        let activity = MockActivity::new();
        let t = timers(10, 5, 3);
        let ctx = TickContext {
            timers: &t,
            activity: &activity,
            paused: false,
        };
        let mut state = State::Locked(LockedState { rest_time: secs(1) });
        assert_eq!(state.tick(Duration::MAX, &ctx), Some(StateId::Active));
        assert_eq!(
            state,
            State::Locked(LockedState {
                rest_time: Duration::MAX
            })
        );

        let mut state = State::Active(ActiveState {
            work_time_left: TimeDelta::seconds(1),
            idle_time: Duration::ZERO,
        });
        activity.set_activity(true);
        assert_eq!(state.tick(Duration::MAX, &ctx), None);
        match state {
            State::Active(active) => assert!(active.work_time_left < TimeDelta::zero()),
            other => panic!("unexpected state {:?}", other),
        }
    }
}
