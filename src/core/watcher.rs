use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

use super::debounce::EventDebouncer;
use super::events::{now_millis, RawEvent};
use super::pipeline::EventPipeline;
use super::platform::OpenEventSource;
use crate::error::{MonitorError, Result};
use crate::export::RecordSink;

/// How often the loop wakes up to check for a stop request
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The single directory a watcher observes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    path: PathBuf,
}

impl WatchTarget {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Canonical absolute path of the target, which must be an existing directory
    pub fn resolve(&self) -> Result<PathBuf> {
        let root = std::fs::canonicalize(&self.path).map_err(|source| MonitorError::TargetUnavailable {
            path: self.path.clone(),
            source,
        })?;

        if !root.is_dir() {
            return Err(MonitorError::NotADirectory(root));
        }
        Ok(root)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Idle,
    Watching,
    Stopped,
}

/// Watches one directory (non-recursively) and feeds its events through an
/// [`EventPipeline`] on a dedicated thread.
///
/// The watcher is one-shot: `Idle -> Watching -> Stopped`. Once stopped it
/// cannot be started again.
pub struct DirectoryWatcher<S: RecordSink + 'static> {
    debouncer: Arc<EventDebouncer>,
    sink: Option<S>,
    state: WatcherState,
    running: Arc<AtomicBool>,
    root: Option<PathBuf>,
    watcher: Option<RecommendedWatcher>,
    opens: Option<OpenEventSource>,
    worker: Option<JoinHandle<()>>,
}

impl<S: RecordSink + 'static> DirectoryWatcher<S> {
    pub fn new(debouncer: Arc<EventDebouncer>, sink: S) -> Self {
        Self {
            debouncer,
            sink: Some(sink),
            state: WatcherState::Idle,
            running: Arc::new(AtomicBool::new(false)),
            root: None,
            watcher: None,
            opens: None,
            worker: None,
        }
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    /// Resolved directory being watched, once started
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn debouncer(&self) -> &EventDebouncer {
        &self.debouncer
    }

    /// Subscribe to `target` and start processing events in the background.
    ///
    /// Fails if the target is missing, is not a directory, or the OS refuses the
    /// subscription. In that case the watcher stays `Idle` and nothing is
    /// retried.
    pub fn start(&mut self, target: &WatchTarget) -> Result<()> {
        if self.state != WatcherState::Idle {
            return Err(MonitorError::AlreadyStarted);
        }

        let root = target.resolve()?;
        let (tx, rx) = mpsc::channel::<notify::Result<Event>>();

        let open_tx = tx.clone();

        let mut watcher = notify::recommended_watcher(tx).map_err(|source| MonitorError::Subscription {
            path: root.clone(),
            source,
        })?;
        watcher
            .watch(&root, RecursiveMode::NonRecursive)
            .map_err(|source| MonitorError::Subscription {
                path: root.clone(),
                source,
            })?;

        let opens = OpenEventSource::start(&root, open_tx)?;

        let sink = self.sink.take().ok_or(MonitorError::AlreadyStarted)?;
        let pipeline = EventPipeline::new(&root, Arc::clone(&self.debouncer), sink);

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);

        let worker = thread::Builder::new()
            .name("file-monitor".to_string())
            .spawn(move || run_loop(pipeline, rx, running));

        let worker = match worker {
            Ok(worker) => worker,
            Err(err) => {
                self.running.store(false, Ordering::SeqCst);
                self.state = WatcherState::Stopped;
                return Err(MonitorError::Spawn(err));
            }
        };

        tracing::info!("Watching {}", root.display());
        self.root = Some(root);
        self.watcher = Some(watcher);
        self.opens = Some(opens);
        self.worker = Some(worker);
        self.state = WatcherState::Watching;
        Ok(())
    }

    /// Unsubscribe, release the OS watch and wait for the loop to exit.
    ///
    /// Safe to call repeatedly and before `start`. A record that is being
    /// built when this is called is still finished and written.
    pub fn stop(&mut self) {
        match self.state {
            WatcherState::Stopped => return,
            WatcherState::Idle => {
                self.state = WatcherState::Stopped;
                return;
            }
            WatcherState::Watching => {}
        }

        self.running.store(false, Ordering::SeqCst);

        if let Some(mut opens) = self.opens.take() {
            opens.stop();
        }

        if let Some(mut watcher) = self.watcher.take() {
            if let Some(root) = &self.root {
                if let Err(err) = watcher.unwatch(root) {
                    tracing::debug!("Unwatch of {} failed: {}", root.display(), err);
                }
            }
        }

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("File monitor thread panicked");
            }
        }

        self.state = WatcherState::Stopped;
        tracing::info!("File monitor stopped");
    }
}

impl<S: RecordSink + 'static> Drop for DirectoryWatcher<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop<S: RecordSink>(
    pipeline: EventPipeline<S>,
    rx: Receiver<notify::Result<Event>>,
    running: Arc<AtomicBool>,
) {
    while running.load(Ordering::SeqCst) {
        match rx.recv_timeout(STOP_POLL_INTERVAL) {
            Ok(Ok(event)) => {
                let observed_at = now_millis();
                for raw in RawEvent::from_notify(&event, pipeline.target(), observed_at) {
                    pipeline.handle(&raw);
                }
            }
            Ok(Err(err)) => {
                tracing::warn!("File watcher error: {}", err);
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}
