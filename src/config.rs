//! Configuration management for the file tracker
//!
//! The monitoring core only receives explicit values. This module is where the
//! host decides them: compiled-in defaults, optionally overridden by a TOML
//! file and environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::DEFAULT_DEBOUNCE_MS;
use crate::export::LOG_FILE_NAME;

/// Directory name used under the platform data directory
pub const APP_DIR_NAME: &str = "energy-file-tracker";

/// Global configuration for the tracker
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// File watcher configuration
    pub watcher: WatcherConfig,
    /// Log output configuration
    pub log: LogConfig,
}

/// Configuration for directory watching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Directory to watch (not recursive)
    pub watch_dir: PathBuf,
    /// Debounce window for repeated events on one path, in milliseconds
    pub event_debounce_ms: u64,
}

/// Configuration for the operations log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub log_file: PathBuf,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            watch_dir: default_watch_dir(),
            event_debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
        }
    }
}

/// The user's downloads folder, falling back to the current directory
pub fn default_watch_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Application-private location of the operations log
pub fn default_log_file() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(LOG_FILE_NAME)
}

impl WatcherConfig {
    /// Get event debounce duration
    pub fn event_debounce_duration(&self) -> Duration {
        Duration::from_millis(self.event_debounce_ms)
    }
}

impl MonitorConfig {
    /// Load configuration from a TOML file. Missing keys keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override with environment variables if present
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Override with values from `lookup`, keyed by environment variable name
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("ENERGY_TRACKER_WATCH_DIR") {
            if !val.is_empty() {
                self.watcher.watch_dir = PathBuf::from(val);
            }
        }

        if let Some(val) = lookup("ENERGY_TRACKER_LOG_FILE") {
            if !val.is_empty() {
                self.log.log_file = PathBuf::from(val);
            }
        }

        if let Some(val) = lookup("ENERGY_TRACKER_DEBOUNCE_MS") {
            match val.parse::<u64>() {
                Ok(ms) => self.watcher.event_debounce_ms = ms,
                Err(_) => tracing::warn!("Ignoring invalid ENERGY_TRACKER_DEBOUNCE_MS={}", val),
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.watcher.event_debounce_ms == 0 {
            return Err("event_debounce_ms must be greater than 0".to_string());
        }

        if self.log.log_file.as_os_str().is_empty() {
            return Err("log_file must not be empty".to_string());
        }

        if self.watcher.watch_dir.as_os_str().is_empty() {
            return Err("watch_dir must not be empty".to_string());
        }

        // Every append would be an event on the watched directory
        let log_dir = match self.log.log_file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        if normalize(log_dir) == normalize(&self.watcher.watch_dir) {
            return Err(format!(
                "log_file {} must not be inside watch_dir {}",
                self.log.log_file.display(),
                self.watcher.watch_dir.display()
            ));
        }

        Ok(())
    }
}

fn normalize(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
