//! Per-path event debouncing
//!
//! The OS frequently reports one logical change as a burst of notifications.
//! `EventDebouncer` keeps the timestamp of the last accepted event per path and
//! rejects anything that arrives within the window.
//!
//! Entries are never evicted, so the map grows with the number of distinct
//! paths seen over the watcher's lifetime. For a single non-recursive
//! directory that stays small.

use std::time::Duration;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Window used when nothing else is configured
pub const DEFAULT_DEBOUNCE_MS: u64 = 1000;

#[derive(Debug)]
pub struct EventDebouncer {
    window_ms: i64,
    last_accepted: DashMap<String, i64>,
}

impl Default for EventDebouncer {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_DEBOUNCE_MS))
    }
}

impl EventDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window_ms: i64::try_from(window.as_millis()).unwrap_or(i64::MAX),
            last_accepted: DashMap::new(),
        }
    }

    /// Decide whether an event for `path` observed at `now_millis` should be processed.
    ///
    /// Accepts when the path has never been accepted before, or when strictly
    /// more than the window has passed since the last accepted event. The
    /// timestamp is only recorded on acceptance. The shard lock is held for the
    /// whole check-and-update, so two concurrent calls for the same path can
    /// never both accept.
    pub fn should_accept(&self, path: &str, now_millis: i64) -> bool {
        match self.last_accepted.entry(path.to_owned()) {
            Entry::Occupied(mut entry) => {
                if now_millis.saturating_sub(*entry.get()) > self.window_ms {
                    entry.insert(now_millis);
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(now_millis);
                true
            }
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms.max(0) as u64)
    }

    /// Timestamp of the last accepted event for `path`
    pub fn last_accepted(&self, path: &str) -> Option<i64> {
        self.last_accepted.get(path).map(|entry| *entry.value())
    }

    /// Number of distinct paths ever accepted
    pub fn tracked_paths(&self) -> usize {
        self.last_accepted.len()
    }
}
