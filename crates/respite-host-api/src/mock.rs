//! Mock collaborators for testing

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::{ActivitySource, LockSurface};

/// Activity source whose signal is set by the test
#[derive(Debug, Default)]
pub struct MockActivity {
    pending: AtomicBool,
    reads: AtomicUsize,
    clears: AtomicUsize,
}

impl MockActivity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate (or withdraw) input since the last clear
    pub fn set_activity(&self, active: bool) {
        self.pending.store(active, Ordering::SeqCst);
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl ActivitySource for MockActivity {
    fn has_activity(&self) -> bool {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.pending.load(Ordering::SeqCst)
    }

    fn clear_activity(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.pending.store(false, Ordering::SeqCst);
    }
}

/// One recorded call on a `MockLock`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockCall {
    Engage,
    Release,
}

/// Lock surface that records every call
#[derive(Debug, Default)]
pub struct MockLock {
    journal: Mutex<Vec<LockCall>>,
}

impl MockLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<LockCall> {
        self.journal.lock().unwrap().clone()
    }

    pub fn engage_count(&self) -> usize {
        self.count(LockCall::Engage)
    }

    pub fn release_count(&self) -> usize {
        self.count(LockCall::Release)
    }

    /// Whether the last recorded call left the display locked
    pub fn is_engaged(&self) -> bool {
        self.journal.lock().unwrap().last() == Some(&LockCall::Engage)
    }

    fn count(&self, call: LockCall) -> usize {
        self.journal
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == call)
            .count()
    }
}

impl LockSurface for MockLock {
    fn engage_lock(&self) {
        self.journal.lock().unwrap().push(LockCall::Engage);
    }

    fn release_lock(&self) {
        self.journal.lock().unwrap().push(LockCall::Release);
    }
}
