//! Error types for the monitoring pipeline

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    /// The watch target is missing or cannot be resolved
    #[error("watch target {} is unavailable: {source}", .path.display())]
    TargetUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("watch target {} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// The OS refused the notification subscription
    #[error("failed to subscribe to changes in {}: {source}", .path.display())]
    Subscription {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("failed to spawn the monitor thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("watcher has already been started or stopped")]
    AlreadyStarted,

    #[error("log file {} could not be written: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed log line: {0}")]
    Parse(String),
}

impl MonitorError {
    /// Whether this error means the watcher could not be started at all
    pub fn is_subscription_failure(&self) -> bool {
        matches!(
            self,
            MonitorError::TargetUnavailable { .. }
                | MonitorError::NotADirectory(_)
                | MonitorError::Subscription { .. }
        )
    }
}

pub type Result<T, E = MonitorError> = std::result::Result<T, E>;
