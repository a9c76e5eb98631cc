//! respited - The respite background service
//!
//! This is the main entry point for the respite service.
//! It wires together all the components:
//! - Configuration loading
//! - Input activity watcher (Linux evdev)
//! - Screen locker (external command)
//! - Core work/rest state machine
//! - Periodic tick timer and signal handling

use anyhow::{Context, Result};
use clap::Parser;
use respite_config::load_config;
use respite_core::{CoreEngine, CoreEvent, StateId};
use respite_host_api::LockSurface;
use respite_host_linux::{CommandLock, InputActivityWatcher};
use respite_util::{MonotonicInstant, default_config_path, format_countdown, format_datetime_full};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// respited - Enforces work/rest breaks by locking the screen
#[derive(Parser, Debug)]
#[command(name = "respited")]
#[command(about = "Enforces work/rest breaks by locking the screen", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/respite/config.toml)
    #[arg(short, long, env = "RESPITE_CONFIG", default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Input device directory override
    #[arg(short, long)]
    input_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

/// Main service state
struct Service {
    engine: CoreEngine,
    lock: Arc<CommandLock>,
    // Kept alive for its reader tasks
    _activity: Arc<InputActivityWatcher>,
    tick: Duration,
}

impl Service {
    async fn new(args: &Args) -> Result<Self> {
        let settings = load_config(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        info!(
            config_path = %args.config.display(),
            work_interval_secs = settings.timers.work_interval.as_secs(),
            rest_secs = settings.timers.rest.as_secs(),
            "Configuration loaded"
        );

        let input_dir = args
            .input_dir
            .clone()
            .unwrap_or_else(|| settings.activity.input_dir.clone());

        let activity = Arc::new(
            InputActivityWatcher::spawn(&input_dir)
                .await
                .with_context(|| format!("Failed to watch input devices in {:?}", input_dir))?,
        );

        let lock = Arc::new(CommandLock::new(settings.lock.command.clone()));
        info!(command = ?lock.command(), "Screen locker configured");

        let engine = CoreEngine::new(settings.timers, activity.clone(), lock.clone());

        Ok(Self {
            engine,
            lock,
            _activity: activity,
            tick: settings.timers.tick,
        })
    }

    async fn run(mut self) -> Result<()> {
        let event = self
            .engine
            .state_init()
            .context("Failed to enter the Active state")?;
        self.handle_core_event(event);

        let mut sigterm = signal(SignalKind::terminate())
            .context("Failed to create SIGTERM handler")?;
        let mut sigint = signal(SignalKind::interrupt())
            .context("Failed to create SIGINT handler")?;
        let mut sighup = signal(SignalKind::hangup())
            .context("Failed to create SIGHUP handler")?;
        let mut sigusr1 = signal(SignalKind::user_defined1())
            .context("Failed to create SIGUSR1 handler")?;
        let mut sigusr2 = signal(SignalKind::user_defined2())
            .context("Failed to create SIGUSR2 handler")?;

        let mut tick_timer = tokio::time::interval(self.tick);
        tick_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_tick = MonotonicInstant::now();

        info!(tick_ms = self.tick.as_millis() as u64, "Service running");

        let outcome = loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break Ok(());
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break Ok(());
                }
                _ = sighup.recv() => {
                    info!("Received SIGHUP, shutting down gracefully");
                    break Ok(());
                }

                // SIGUSR1 / SIGUSR2: pause / resume the work countdown
                _ = sigusr1.recv() => {
                    if let Some(event) = self.engine.pause() {
                        self.handle_core_event(event);
                    }
                }
                _ = sigusr2.recv() => {
                    if let Some(event) = self.engine.unpause() {
                        self.handle_core_event(event);
                    }
                }

                _ = tick_timer.tick() => {
                    let now = MonotonicInstant::now();
                    let elapsed = now.duration_since(last_tick);
                    last_tick = now;

                    if let Err(e) = self.step(elapsed) {
                        error!(error = %e, "State machine failed, stopping");
                        break Err(e.into());
                    }
                }
            }
        };

        self.shutdown();
        outcome
    }

    fn step(&mut self, elapsed: Duration) -> respite_util::Result<()> {
        if let Some(event) = self.engine.on_tick(elapsed)? {
            self.handle_core_event(event);
        }
        Ok(())
    }

    fn handle_core_event(&self, event: CoreEvent) {
        match event {
            CoreEvent::Transitioned { from, to, at } => match to {
                StateId::Active => {
                    let left = self
                        .engine
                        .work_time_left()
                        .map(format_countdown)
                        .unwrap_or_default();
                    info!(
                        from = %from,
                        at = %format_datetime_full(&at),
                        work_time_left = %left,
                        "Back to work"
                    );
                }
                StateId::Idle => {
                    info!(from = %from, at = %format_datetime_full(&at), "No input, session idle");
                }
                StateId::Locked => {
                    info!(
                        from = %from,
                        at = %format_datetime_full(&at),
                        rest_secs = self.engine.timers().rest.as_secs(),
                        "Work interval over, resting"
                    );
                }
                StateId::Init => {
                    warn!(from = %from, "Unexpected transition to Init");
                }
            },
            CoreEvent::PauseChanged { paused } => {
                let status = self.engine.snapshot();
                info!(
                    paused,
                    state = %status.state,
                    "Work countdown {}",
                    if paused { "paused" } else { "resumed" }
                );
            }
        }
    }

    fn shutdown(&self) {
        info!("Shutting down respited");

        // Never leave the display locked behind us
        if self.engine.current() == StateId::Locked {
            info!("Releasing screen lock");
            self.lock.release_lock();
        }

        info!("Shutdown complete");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    if args.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    info!(version = env!("CARGO_PKG_VERSION"), "respited starting");

    let service = Service::new(&args).await?;
    service.run().await
}
