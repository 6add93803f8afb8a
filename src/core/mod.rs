//! Core functionality module
//!
//! Contains directory watching, debouncing, classification and record building

pub mod classify;
pub mod debounce;
pub mod events;
pub mod pipeline;
pub mod platform;
pub mod record;
pub mod watcher;

// Re-export main types
pub use classify::{classify, FileType};
pub use debounce::{EventDebouncer, DEFAULT_DEBOUNCE_MS};
pub use events::{now_millis, Operation, OperationKind, RawEvent};
pub use pipeline::EventPipeline;
pub use record::{LogRecord, RecordBuilder, ENERGY_PLACEHOLDER};
pub use watcher::{DirectoryWatcher, WatchTarget, WatcherState};
