//! Input activity detection from evdev device nodes

use async_trait::async_trait;
use respite_host_api::{ActivitySource, HostError, HostResult};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// How often the device directory is checked for new or replugged nodes
const RESCAN_INTERVAL: Duration = Duration::from_secs(2);

/// Something that produces input events. Only their arrival matters.
#[async_trait]
trait InputDevice: Send {
    /// Wait for the next event. An error ends the reader for this device.
    async fn next_event(&mut self) -> io::Result<()>;
}

#[async_trait]
impl InputDevice for evdev::EventStream {
    async fn next_event(&mut self) -> io::Result<()> {
        evdev::EventStream::next_event(self).await.map(|_| ())
    }
}

type DeviceOpener = Arc<dyn Fn(&Path) -> io::Result<Box<dyn InputDevice>> + Send + Sync>;

fn open_evdev(path: &Path) -> io::Result<Box<dyn InputDevice>> {
    let device = evdev::Device::open(path)?;
    Ok(Box::new(device.into_event_stream()?))
}

fn is_event_node(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("event"))
}

/// Readers keyed by device node, shared with the rescan task
struct DeviceSet {
    flag: Arc<AtomicBool>,
    open: DeviceOpener,
    readers: Mutex<HashMap<PathBuf, JoinHandle<()>>>,
}

impl DeviceSet {
    fn readers(&self) -> MutexGuard<'_, HashMap<PathBuf, JoinHandle<()>>> {
        self.readers.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start a reader for every `event*` node under `dir` that has none
    /// running, and forget readers that have ended. Returns the number of
    /// live readers.
    async fn scan(&self, dir: &Path) -> io::Result<usize> {
        let mut nodes = Vec::new();
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if is_event_node(&path) {
                nodes.push(path);
            }
        }

        let mut readers = self.readers();
        readers.retain(|path, reader| {
            if reader.is_finished() {
                debug!(device = %path.display(), "Input reader ended");
                false
            } else {
                true
            }
        });

        for path in nodes {
            if readers.contains_key(&path) {
                continue;
            }

            match (self.open)(&path) {
                Ok(device) => {
                    debug!(device = %path.display(), "Watching input device");
                    let reader = tokio::spawn(read_device(device, path.clone(), self.flag.clone()));
                    readers.insert(path, reader);
                }
                Err(e) => {
                    // Usually missing permission, or not an evdev node
                    debug!(device = %path.display(), error = %e, "Skipping input device");
                }
            }
        }

        Ok(readers.len())
    }
}

/// Watches every `event*` device in a directory and raises a shared flag
/// whenever any of them produces an event. Event contents are never parsed.
///
/// The directory is rescanned periodically, so devices that are plugged in
/// later, or whose nodes are recreated (e.g. after resume), are picked up.
pub struct InputActivityWatcher {
    devices: Arc<DeviceSet>,
    rescan: JoinHandle<()>,
}

impl InputActivityWatcher {
    /// Open the devices under `dir` and start one reader task per device.
    ///
    /// Devices that cannot be opened (usually for lack of permission) are
    /// skipped; it is an error only if none can be opened at startup.
    pub async fn spawn(dir: impl AsRef<Path>) -> HostResult<Self> {
        Self::spawn_with(dir.as_ref(), Arc::new(open_evdev), RESCAN_INTERVAL).await
    }

    async fn spawn_with(dir: &Path, open: DeviceOpener, every: Duration) -> HostResult<Self> {
        let devices = Arc::new(DeviceSet {
            flag: Arc::new(AtomicBool::new(false)),
            open,
            readers: Mutex::new(HashMap::new()),
        });

        let count = devices.scan(dir).await?;
        if count == 0 {
            return Err(HostError::NoInputDevices(dir.to_path_buf()));
        }

        info!(count, dir = %dir.display(), "Input activity watcher started");

        let rescan = tokio::spawn(rescan(devices.clone(), dir.to_path_buf(), every));

        Ok(Self { devices, rescan })
    }

    /// Device nodes with a live reader
    pub fn devices(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .devices
            .readers()
            .iter()
            .filter(|(_, reader)| !reader.is_finished())
            .map(|(path, _)| path.clone())
            .collect();
        paths.sort();
        paths
    }
}

async fn read_device(mut device: Box<dyn InputDevice>, path: PathBuf, flag: Arc<AtomicBool>) {
    loop {
        match device.next_event().await {
            Ok(()) => flag.store(true, Ordering::Relaxed),
            Err(e) => {
                warn!(device = %path.display(), error = %e, "Input device lost");
                return;
            }
        }
    }
}

async fn rescan(devices: Arc<DeviceSet>, dir: PathBuf, every: Duration) {
    let mut timer = tokio::time::interval(every);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately; spawn already scanned
    timer.tick().await;

    let mut starved = false;
    loop {
        timer.tick().await;

        match devices.scan(&dir).await {
            Ok(0) => {
                if !starved {
                    warn!(
                        dir = %dir.display(),
                        "No input devices left to watch, activity is not detected"
                    );
                }
                starved = true;
            }
            Ok(count) => {
                if starved {
                    info!(count, dir = %dir.display(), "Input devices available again");
                }
                starved = false;
            }
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Failed to rescan input devices");
            }
        }
    }
}

impl ActivitySource for InputActivityWatcher {
    fn has_activity(&self) -> bool {
        self.devices.flag.load(Ordering::Relaxed)
    }

    fn clear_activity(&self) {
        self.devices.flag.store(false, Ordering::Relaxed);
    }
}

impl Drop for InputActivityWatcher {
    fn drop(&mut self) {
        self.rescan.abort();
        for reader in self.devices.readers().values() {
            reader.abort();
        }
    }
}
