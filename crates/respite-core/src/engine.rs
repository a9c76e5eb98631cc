//! Transition engine and tick dispatcher

use chrono::TimeDelta;
use respite_config::Timers;
use respite_host_api::{ActivitySource, LockSurface};
use respite_util::RespiteError;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::{CoreEvent, State, StateId, TickContext, lookup};

/// Errors from the transition engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The destination's guard rejected entry from the current state
    #[error("Illegal transition {from} -> {to}")]
    Illegal { from: StateId, to: StateId },

    #[error("State machine already initialized (current state {0})")]
    AlreadyInitialized(StateId),
}

impl From<TransitionError> for RespiteError {
    fn from(err: TransitionError) -> Self {
        RespiteError::state(err.to_string())
    }
}

/// Serializable view of the machine, for logging and status output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub state: StateId,
    pub paused: bool,
    /// Negative once the countdown has overrun
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_time_left_secs: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rest_secs: Option<u64>,
}

/// The work/rest state machine
pub struct CoreEngine {
    timers: Timers,
    state: State,
    paused: bool,
    activity: Arc<dyn ActivitySource>,
    lock: Arc<dyn LockSurface>,
}

impl CoreEngine {
    /// Create a new engine in the `Init` state
    pub fn new(
        timers: Timers,
        activity: Arc<dyn ActivitySource>,
        lock: Arc<dyn LockSurface>,
    ) -> Self {
        info!(
            work_interval_secs = timers.work_interval.as_secs(),
            max_idle_secs = timers.max_idle.as_secs(),
            rest_secs = timers.rest.as_secs(),
            lock_check = ?timers.lock_check,
            "Core engine initialized"
        );

        Self {
            timers,
            state: State::Init,
            paused: false,
            activity,
            lock,
        }
    }

    /// Perform the one-time `Init -> Active` transition
    pub fn state_init(&mut self) -> Result<CoreEvent, TransitionError> {
        let current = self.state.id();
        if current != StateId::Init {
            error!(current = %current, "State machine initialized twice");
            return Err(TransitionError::AlreadyInitialized(current));
        }

        self.transition_to(StateId::Active)
    }

    /// Move to `target`: check its guard, run the outgoing leave hook, then
    /// the incoming enter hook, then make `target` current.
    ///
    /// On error the current state is untouched and no hook has run.
    pub fn transition_to(&mut self, target: StateId) -> Result<CoreEvent, TransitionError> {
        let from = self.state.id();
        let mut next = lookup(target);

        if !next.permits_entry(from) {
            error!(from = %from, to = %target, "Illegal state transition");
            return Err(TransitionError::Illegal { from, to: target });
        }

        self.state.leave(self.lock.as_ref());
        next.enter(from, &self.timers, self.lock.as_ref());
        self.state = next;

        info!(from = %from, to = %target, "State changed");

        Ok(CoreEvent::Transitioned {
            from,
            to: target,
            at: respite_util::now(),
        })
    }

    /// Route one tick to the current state's handler and carry out the
    /// transition it requests, if any.
    pub fn on_tick(&mut self, elapsed: Duration) -> Result<Option<CoreEvent>, TransitionError> {
        debug!(
            state = %self.state.id(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Tick"
        );

        let ctx = TickContext {
            timers: &self.timers,
            activity: self.activity.as_ref(),
            paused: self.paused,
        };

        let request = self.state.tick(elapsed, &ctx);

        match request {
            Some(target) => self.transition_to(target).map(Some),
            None => Ok(None),
        }
    }

    /// Freeze the work countdown. Returns an event only if the flag changed.
    pub fn pause(&mut self) -> Option<CoreEvent> {
        self.set_paused(true)
    }

    /// Resume the work countdown. Returns an event only if the flag changed.
    pub fn unpause(&mut self) -> Option<CoreEvent> {
        self.set_paused(false)
    }

    fn set_paused(&mut self, paused: bool) -> Option<CoreEvent> {
        if self.paused == paused {
            debug!(paused, "Pause flag unchanged");
            return None;
        }

        self.paused = paused;
        info!(paused, state = %self.state.id(), "Work countdown pause changed");
        Some(CoreEvent::PauseChanged { paused })
    }

    pub fn current(&self) -> StateId {
        self.state.id()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    /// Work countdown, while Active
    pub fn work_time_left(&self) -> Option<TimeDelta> {
        match &self.state {
            State::Active(active) => Some(active.work_time_left),
            _ => None,
        }
    }

    /// Accumulated input-free time, while Active
    pub fn idle_time(&self) -> Option<Duration> {
        match &self.state {
            State::Active(active) => Some(active.idle_time),
            _ => None,
        }
    }

    /// Accumulated rest, while Locked
    pub fn rest_time(&self) -> Option<Duration> {
        match &self.state {
            State::Locked(locked) => Some(locked.rest_time),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            state: self.current(),
            paused: self.paused,
            work_time_left_secs: self.work_time_left().map(|d| d.num_seconds()),
            idle_secs: self.idle_time().map(|d| d.as_secs()),
            rest_secs: self.rest_time().map(|d| d.as_secs()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use respite_config::LockCheck;
    use respite_host_api::{LockCall, MockActivity, MockLock};

    struct Harness {
        engine: CoreEngine,
        activity: Arc<MockActivity>,
        lock: Arc<MockLock>,
    }

    fn make_engine(work: u64, idle: u64, rest: u64) -> Harness {
        let timers = Timers {
            work_interval: Duration::from_secs(work),
            max_idle: Duration::from_secs(idle),
            rest: Duration::from_secs(rest),
            tick: Duration::from_secs(1),
            lock_check: LockCheck::BeforeDecrement,
        };
        let activity = Arc::new(MockActivity::new());
        let lock = Arc::new(MockLock::new());
        let engine = CoreEngine::new(timers, activity.clone(), lock.clone());

        Harness {
            engine,
            activity,
            lock,
        }
    }

    fn tick(h: &mut Harness, secs: u64, active: bool) -> Option<CoreEvent> {
        h.activity.set_activity(active);
        h.engine.on_tick(Duration::from_secs(secs)).unwrap()
    }

    #[test]
    fn init_enters_active() {
        let mut h = make_engine(10, 5, 3);
        assert_eq!(h.engine.current(), StateId::Init);

        let event = h.engine.state_init().unwrap();
        assert!(matches!(
            event,
            CoreEvent::Transitioned {
                from: StateId::Init,
                to: StateId::Active,
                ..
            }
        ));
        assert_eq!(h.engine.work_time_left(), Some(TimeDelta::seconds(10)));
        assert!(h.lock.calls().is_empty());
    }

    #[test]
    fn init_twice_fails() {
        let mut h = make_engine(10, 5, 3);
        h.engine.state_init().unwrap();

        assert_eq!(
            h.engine.state_init(),
            Err(TransitionError::AlreadyInitialized(StateId::Active))
        );
        assert_eq!(h.engine.current(), StateId::Active);
    }

    #[test]
    fn tick_before_init_is_noop() {
        let mut h = make_engine(10, 5, 3);
        assert_eq!(tick(&mut h, 100, false), None);
        assert_eq!(h.engine.current(), StateId::Init);
        assert_eq!(h.activity.read_count(), 0);
    }

    #[test]
    fn illegal_transition_leaves_state_untouched() {
        let mut h = make_engine(10, 5, 3);
        h.engine.state_init().unwrap();
        h.engine.transition_to(StateId::Locked).unwrap();

        let result = h.engine.transition_to(StateId::Init);
        assert_eq!(
            result,
            Err(TransitionError::Illegal {
                from: StateId::Locked,
                to: StateId::Init,
            })
        );

        // No leave hook ran: the lock is still held
        assert_eq!(h.engine.current(), StateId::Locked);
        assert_eq!(h.lock.calls(), vec![LockCall::Engage]);
    }

    #[test]
    fn locked_self_transition_releases_before_engaging() {
        let mut h = make_engine(10, 5, 3);
        h.engine.state_init().unwrap();
        h.engine.transition_to(StateId::Locked).unwrap();
        tick(&mut h, 2, false);
        assert_eq!(h.engine.rest_time(), Some(Duration::from_secs(2)));

        let event = h.engine.transition_to(StateId::Locked).unwrap();
        assert_eq!(event.target(), Some(StateId::Locked));
        assert_eq!(
            h.lock.calls(),
            vec![LockCall::Engage, LockCall::Release, LockCall::Engage]
        );

        // Fresh Locked state, so the rest starts over
        assert_eq!(h.engine.rest_time(), Some(Duration::ZERO));
        assert!(h.lock.is_engaged());
    }

    #[test]
    fn idle_after_quiet_tick() {
        let mut h = make_engine(10, 5, 3);
        h.engine.state_init().unwrap();

        let event = tick(&mut h, 6, false);
        assert_eq!(event.and_then(|e| e.target()), Some(StateId::Idle));
        assert_eq!(h.engine.current(), StateId::Idle);
    }

    #[test]
    fn activity_wakes_idle_and_resets_work() {
        let mut h = make_engine(10, 5, 3);
        h.engine.state_init().unwrap();
        tick(&mut h, 6, false);
        assert_eq!(h.engine.current(), StateId::Idle);

        let event = tick(&mut h, 1, true);
        assert_eq!(event.and_then(|e| e.target()), Some(StateId::Active));
        assert_eq!(h.engine.work_time_left(), Some(TimeDelta::seconds(10)));
        assert_eq!(h.engine.idle_time(), Some(Duration::ZERO));
    }

    #[test]
    fn idle_stays_idle_without_activity() {
        let mut h = make_engine(10, 5, 3);
        h.engine.state_init().unwrap();
        tick(&mut h, 6, false);

        for _ in 0..20 {
            assert_eq!(tick(&mut h, 1, false), None);
        }
        assert_eq!(h.engine.current(), StateId::Idle);
    }

    #[test]
    fn lock_fires_one_tick_after_depletion() {
        let mut h = make_engine(2, 50, 3);
        h.engine.state_init().unwrap();

        assert_eq!(tick(&mut h, 5, true), None);
        assert_eq!(h.engine.current(), StateId::Active);
        assert_eq!(h.engine.work_time_left(), Some(TimeDelta::seconds(-3)));
        assert_eq!(h.engine.idle_time(), Some(Duration::ZERO));

        let event = tick(&mut h, 1, false);
        assert_eq!(event.and_then(|e| e.target()), Some(StateId::Locked));
        assert_eq!(h.lock.calls(), vec![LockCall::Engage]);
    }

    #[test]
    fn rest_completes_and_unlocks() {
        let mut h = make_engine(10, 5, 3);
        h.engine.state_init().unwrap();
        h.engine.transition_to(StateId::Locked).unwrap();
        assert_eq!(h.engine.rest_time(), Some(Duration::ZERO));

        assert_eq!(tick(&mut h, 2, false), None);
        assert_eq!(h.engine.rest_time(), Some(Duration::from_secs(2)));

        let event = tick(&mut h, 2, false);
        assert_eq!(event.and_then(|e| e.target()), Some(StateId::Active));
        assert_eq!(h.lock.release_count(), 1);
        assert_eq!(h.engine.work_time_left(), Some(TimeDelta::seconds(10)));
    }

    #[test]
    fn pause_freezes_work_but_not_depletion_check() {
        let mut h = make_engine(3, 50, 3);
        h.engine.state_init().unwrap();
        tick(&mut h, 3, true);
        assert_eq!(h.engine.work_time_left(), Some(TimeDelta::zero()));

        h.engine.pause();
        // Countdown is frozen at zero, but the check still sees it
        let event = tick(&mut h, 1, true);
        assert_eq!(event.and_then(|e| e.target()), Some(StateId::Locked));
    }

    #[test]
    fn pause_is_idempotent_and_survives_other_states() {
        let mut h = make_engine(10, 5, 3);
        h.engine.state_init().unwrap();
        h.engine.transition_to(StateId::Idle).unwrap();

        assert_eq!(
            h.engine.pause(),
            Some(CoreEvent::PauseChanged { paused: true })
        );
        assert_eq!(h.engine.pause(), None);
        assert!(h.engine.is_paused());

        tick(&mut h, 1, true);
        assert_eq!(h.engine.current(), StateId::Active);
        for _ in 0..5 {
            tick(&mut h, 1, true);
        }
        assert_eq!(h.engine.work_time_left(), Some(TimeDelta::seconds(10)));

        assert_eq!(
            h.engine.unpause(),
            Some(CoreEvent::PauseChanged { paused: false })
        );
        assert_eq!(h.engine.unpause(), None);
        tick(&mut h, 1, true);
        assert_eq!(h.engine.work_time_left(), Some(TimeDelta::seconds(9)));
    }

    #[test]
    fn after_decrement_policy_locks_on_crossing_tick() {
        let mut h = make_engine(2, 50, 3);
        h.engine.timers.lock_check = LockCheck::AfterDecrement;
        h.engine.state_init().unwrap();

        let event = tick(&mut h, 5, true);
        assert_eq!(event.and_then(|e| e.target()), Some(StateId::Locked));
        // Locked never read the activity flag, so it is still pending
        assert!(h.activity.has_activity());
    }

    #[test]
    fn snapshot_reports_current_counters() {
        let mut h = make_engine(10, 5, 3);
        h.engine.state_init().unwrap();
        tick(&mut h, 2, false);

        let snapshot = h.engine.snapshot();
        assert_eq!(
            snapshot,
            StatusSnapshot {
                state: StateId::Active,
                paused: false,
                work_time_left_secs: Some(8),
                idle_secs: Some(2),
                rest_secs: None,
            }
        );

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["state"], "active");
        assert!(json.get("rest_secs").is_none());
    }

    #[test]
    fn transition_error_converts_to_respite_error() {
        let err: RespiteError = TransitionError::Illegal {
            from: StateId::Idle,
            to: StateId::Init,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "State machine error: Illegal transition Idle -> Init"
        );
    }
}
