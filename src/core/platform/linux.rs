use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use inotify::{EventMask, Inotify, WatchMask};
use notify::event::{AccessKind, AccessMode};
use notify::{Event, EventKind};

use crate::error::{MonitorError, Result};

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Reports opens of entries directly inside one directory
#[derive(Debug)]
pub struct OpenEventSource {
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl OpenEventSource {
    pub fn start(root: &Path, tx: Sender<notify::Result<Event>>) -> Result<Self> {
        let subscription_error = |err: std::io::Error| MonitorError::Subscription {
            path: root.to_path_buf(),
            source: notify::Error::io(err),
        };

        let inotify = Inotify::init().map_err(subscription_error)?;
        inotify
            .watches()
            .add(root, WatchMask::OPEN | WatchMask::ONLYDIR)
            .map_err(subscription_error)?;

        let running = Arc::new(AtomicBool::new(true));
        let worker = {
            let running = Arc::clone(&running);
            let root = root.to_path_buf();
            thread::Builder::new()
                .name("file-monitor-open".to_string())
                .spawn(move || forward_opens(inotify, root, tx, running))
                .map_err(MonitorError::Spawn)?
        };

        Ok(Self {
            running,
            worker: Some(worker),
        })
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("Open event thread panicked");
            }
        }
    }
}

impl Drop for OpenEventSource {
    fn drop(&mut self) {
        self.stop();
    }
}

fn forward_opens(
    mut inotify: Inotify,
    root: PathBuf,
    tx: Sender<notify::Result<Event>>,
    running: Arc<AtomicBool>,
) {
    let mut buffer = [0u8; 4096];

    while running.load(Ordering::SeqCst) {
        match inotify.read_events(&mut buffer) {
            Ok(events) => {
                let mut idle = true;
                for event in events {
                    idle = false;
                    if !event.mask.contains(EventMask::OPEN) || event.mask.contains(EventMask::ISDIR) {
                        continue;
                    }
                    // Opens of the directory itself carry no name
                    let Some(name) = event.name else {
                        continue;
                    };
                    let open = Event::new(EventKind::Access(AccessKind::Open(AccessMode::Any)))
                        .add_path(root.join(name));
                    if tx.send(Ok(open)).is_err() {
                        return;
                    }
                }
                if idle {
                    thread::sleep(IDLE_POLL_INTERVAL);
                }
            }
            Err(err) if err.kind() == ErrorKind::WouldBlock => thread::sleep(IDLE_POLL_INTERVAL),
            Err(err) => {
                let _ = tx.send(Err(notify::Error::io(err).add_path(root.clone())));
                return;
            }
        }
    }
}
