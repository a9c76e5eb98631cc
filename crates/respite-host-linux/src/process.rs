//! Locker process management

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, ExitStatus, Stdio};
use tracing::debug;

use respite_host_api::{HostError, HostResult};

/// Environment variables passed through to the locker
const INHERITED_ENV: &[&str] = &[
    "PATH",
    "HOME",
    "USER",
    "DISPLAY",
    "XAUTHORITY",
    "WAYLAND_DISPLAY",
    "XDG_RUNTIME_DIR",
];

/// Child process running in its own process group
pub struct ManagedProcess {
    pub child: Child,
    pub pid: u32,
    pub pgid: u32,
}

impl ManagedProcess {
    /// Spawn a new process in its own process group
    pub fn spawn(argv: &[String]) -> HostResult<Self> {
        let Some((program, args)) = argv.split_first() else {
            return Err(HostError::SpawnFailed("Empty argv".into()));
        };

        let mut cmd = Command::new(program);
        cmd.args(args);

        cmd.env_clear();
        for key in INHERITED_ENV {
            if let Ok(value) = std::env::var(key) {
                cmd.env(key, value);
            }
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());

        // SAFETY: setsid is async-signal-safe and touches no parent state
        unsafe {
            cmd.pre_exec(|| {
                // New session, so the locker leads its own process group
                nix::unistd::setsid().map_err(std::io::Error::other)?;
                Ok(())
            });
        }

        let child = cmd.spawn().map_err(|e| {
            HostError::SpawnFailed(format!("Failed to spawn {}: {}", program, e))
        })?;

        let pid = child.id();
        let pgid = pid; // After setsid, pid == pgid

        debug!(pid = pid, pgid = pgid, program = %program, "Process spawned");

        Ok(Self { child, pid, pgid })
    }

    /// Send SIGTERM to the process group
    pub fn terminate(&self) -> HostResult<()> {
        self.signal_group(Signal::SIGTERM)
    }

    /// Send SIGKILL to the process group
    pub fn kill(&self) -> HostResult<()> {
        self.signal_group(Signal::SIGKILL)
    }

    fn signal_group(&self, sig: Signal) -> HostResult<()> {
        let pgid = Pid::from_raw(-(self.pgid as i32)); // Negative for process group

        match signal::kill(pgid, sig) {
            Ok(()) => {
                debug!(pgid = self.pgid, signal = ?sig, "Signalled process group");
                Ok(())
            }
            // Process already gone
            Err(nix::errno::Errno::ESRCH) => Ok(()),
            Err(e) => Err(HostError::StopFailed(format!(
                "Failed to send {:?}: {}",
                sig, e
            ))),
        }
    }

    /// Check if the process has exited (non-blocking)
    pub fn try_wait(&mut self) -> HostResult<Option<ExitStatus>> {
        Ok(self.child.try_wait()?)
    }

    /// Wait for the process to exit (blocking)
    pub fn wait(&mut self) -> HostResult<ExitStatus> {
        Ok(self.child.wait()?)
    }
}
