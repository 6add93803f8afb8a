use std::fmt;
use std::path::Path;
use std::str::FromStr;
use notify::event::{AccessKind, ModifyKind};
use notify::EventKind;
use serde::{Deserialize, Serialize};

/// Kind of filesystem activity reported by the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Open,
    Modify,
    Delete,
    Other,
}

/// Operation written to the log for a tracked event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Read,
    Write,
    Delete,
}

/// A single notification for one path, ready for the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub kind: OperationKind,
    pub relative_path: String,
    pub observed_at_millis: i64,
}

impl OperationKind {
    /// Map a `notify` event kind onto the kinds this monitor tracks
    pub fn from_event_kind(kind: &EventKind) -> Self {
        match kind {
            EventKind::Access(AccessKind::Open(_)) => OperationKind::Open,
            EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Any)
            | EventKind::Modify(ModifyKind::Other) => OperationKind::Modify,
            EventKind::Remove(_) => OperationKind::Delete,
            _ => OperationKind::Other,
        }
    }

    /// The logged operation, or `None` for kinds that produce no record
    pub fn operation(&self) -> Option<Operation> {
        match self {
            OperationKind::Open => Some(Operation::Read),
            OperationKind::Modify => Some(Operation::Write),
            OperationKind::Delete => Some(Operation::Delete),
            OperationKind::Other => None,
        }
    }
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::Write => "write",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Operation::Read),
            "write" => Ok(Operation::Write),
            "delete" => Ok(Operation::Delete),
            other => Err(format!("unknown operation: {}", other)),
        }
    }
}

impl RawEvent {
    pub fn new(kind: OperationKind, relative_path: impl Into<String>, observed_at_millis: i64) -> Self {
        Self {
            kind,
            relative_path: relative_path.into(),
            observed_at_millis,
        }
    }

    /// Split a `notify` event into one raw event per path
    ///
    /// Paths are made relative to `target`. Paths that are the target itself,
    /// lie outside it, or are not valid UTF-8 yield an empty relative path,
    /// which the pipeline discards.
    pub fn from_notify(event: &notify::Event, target: &Path, observed_at_millis: i64) -> Vec<Self> {
        let kind = OperationKind::from_event_kind(&event.kind);

        event
            .paths
            .iter()
            .map(|path| {
                let relative_path = path
                    .strip_prefix(target)
                    .ok()
                    .and_then(|relative| relative.to_str())
                    .unwrap_or_default()
                    .to_string();
                Self::new(kind, relative_path, observed_at_millis)
            })
            .collect()
    }

    /// Whether the notification carried no usable path
    pub fn is_malformed(&self) -> bool {
        self.relative_path.is_empty()
    }
}

/// Wall-clock time in milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
