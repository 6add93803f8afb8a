use std::path::PathBuf;
use anyhow::Result;
use clap::{Parser, ValueEnum};

use crate::config::MonitorConfig;

#[derive(Parser)]
#[command(name = "energy-file-tracker")]
#[command(version)]
#[command(about = "Log file activity in a single directory")]
#[command(long_about = "Watches one directory for files being opened, modified and deleted, and appends a record per event (file type, operation, timestamps, size) to an append-only log.")]
pub struct Cli {
    /// Directory to watch for changes
    #[arg(value_name = "PATH", help = "Directory to watch (defaults to the downloads folder)")]
    pub path: Option<PathBuf>,

    /// Where records are appended
    #[arg(long, value_name = "FILE", help = "Operations log file")]
    pub log_file: Option<PathBuf>,

    /// Debounce window per path
    #[arg(long, value_name = "MS", help = "Minimum milliseconds between two records for one file")]
    pub debounce_ms: Option<u64>,

    /// Optional TOML configuration
    #[arg(short, long, value_name = "FILE", help = "Configuration file")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Echo each persisted record to stdout
    #[arg(long, default_value = "quiet", help = "Echo format for written records")]
    pub output: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Only write to the log file (default)
    Quiet,
    /// Print the same line that goes into the log
    Text,
    /// JSON output for scripting
    Json,
}

impl Cli {
    /// Merge defaults, config file, environment and flags, in that order
    pub fn resolve_config(&self) -> Result<MonitorConfig> {
        let mut config = match &self.config {
            Some(path) => MonitorConfig::load(path)?,
            None => MonitorConfig::default(),
        };
        config.apply_env();

        if let Some(path) = &self.path {
            config.watcher.watch_dir = path.clone();
        }
        if let Some(log_file) = &self.log_file {
            config.log.log_file = log_file.clone();
        }
        if let Some(ms) = self.debounce_ms {
            config.watcher.event_debounce_ms = ms;
        }

        config.validate().map_err(anyhow::Error::msg)?;
        Ok(config)
    }

    pub fn setup_logging(&self) {
        let level = if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        };

        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_writer(std::io::stderr)
            .init();
    }

    /// Check that the resolved watch directory can be watched
    pub fn validate(&self, config: &MonitorConfig) -> Result<(), String> {
        let path = &config.watcher.watch_dir;

        if !path.exists() {
            return Err(format!("Path does not exist: {}", path.display()));
        }

        if !path.is_dir() {
            return Err(format!("Path is not a directory: {}", path.display()));
        }

        Ok(())
    }
}
