//! Screen lock backed by an external locker command

use respite_host_api::LockSurface;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::ManagedProcess;

/// How long a terminated locker gets before it is killed
const STOP_GRACE: Duration = Duration::from_secs(2);

/// Locks the display by running a locker that stays in the foreground
/// (e.g. `i3lock -n`, `swaylock`) and unlocks by terminating it.
pub struct CommandLock {
    argv: Vec<String>,
    locker: Mutex<Option<ManagedProcess>>,
}

impl CommandLock {
    pub fn new(argv: Vec<String>) -> Self {
        Self {
            argv,
            locker: Mutex::new(None),
        }
    }

    pub fn command(&self) -> &[String] {
        &self.argv
    }

    /// Whether a locker we started is still running
    pub fn is_engaged(&self) -> bool {
        let mut guard = self.locker.lock().unwrap_or_else(|e| e.into_inner());
        match guard.as_mut() {
            Some(process) => matches!(process.try_wait(), Ok(None)),
            None => false,
        }
    }
}

impl LockSurface for CommandLock {
    fn engage_lock(&self) {
        let mut guard = self.locker.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(process) = guard.as_mut()
            && matches!(process.try_wait(), Ok(None))
        {
            warn!(pid = process.pid, "Locker already running, not starting another");
            return;
        }

        match ManagedProcess::spawn(&self.argv) {
            Ok(process) => {
                info!(pid = process.pid, command = ?self.argv, "Screen locked");
                *guard = Some(process);
            }
            Err(e) => {
                warn!(error = %e, command = ?self.argv, "Failed to start screen locker");
                *guard = None;
            }
        }
    }

    fn release_lock(&self) {
        let Some(mut process) = self
            .locker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        else {
            warn!("Release requested but no locker is running");
            return;
        };

        if let Ok(Some(status)) = process.try_wait() {
            info!(pid = process.pid, status = %status, "Locker had already exited");
            return;
        }

        if let Err(e) = process.terminate() {
            warn!(pid = process.pid, error = %e, "Failed to terminate locker");
        }
        info!(pid = process.pid, "Screen unlocked");

        // Reap off the tick path
        std::thread::spawn(move || reap(process));
    }
}

fn reap(mut process: ManagedProcess) {
    let deadline = Instant::now() + STOP_GRACE;

    while Instant::now() < deadline {
        match process.try_wait() {
            Ok(Some(status)) => {
                debug!(pid = process.pid, status = %status, "Locker reaped");
                return;
            }
            Ok(None) => std::thread::sleep(Duration::from_millis(50)),
            Err(e) => {
                warn!(pid = process.pid, error = %e, "Error checking locker status");
                return;
            }
        }
    }

    warn!(pid = process.pid, "Locker ignored SIGTERM, killing");
    if let Err(e) = process.kill() {
        warn!(pid = process.pid, error = %e, "Failed to kill locker");
    }
    let _ = process.wait();
}
