//! Notifications the `notify` backends do not deliver
//!
//! `notify` never subscribes to file opens. On Linux a second inotify watch
//! picks them up and forwards them into the same channel the `notify` watcher
//! feeds, as `Access(Open)` events. Other platforms have no open events.

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "linux")]
pub use linux::OpenEventSource;

#[cfg(not(target_os = "linux"))]
mod unsupported {
    use std::path::Path;
    use std::sync::mpsc::Sender;

    use crate::error::Result;

    pub struct OpenEventSource;

    impl OpenEventSource {
        pub fn start(_root: &Path, _tx: Sender<notify::Result<notify::Event>>) -> Result<Self> {
            Ok(Self)
        }

        pub fn stop(&mut self) {}
    }
}

#[cfg(not(target_os = "linux"))]
pub use unsupported::OpenEventSource;
