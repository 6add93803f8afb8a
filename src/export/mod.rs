//! Persisting log records
//!
//! `LogWriter` appends one line per record to the operations log. The file is
//! opened, written, flushed and closed on every call so no handle is kept
//! between events.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::LogRecord;
use crate::error::{MonitorError, Result};

/// File name of the operations log inside the application data directory
pub const LOG_FILE_NAME: &str = "file_operations_log.txt";

/// Destination for finished records
pub trait RecordSink: Send + Sync {
    fn append(&self, record: &LogRecord) -> Result<()>;
}

impl<S: RecordSink + ?Sized> RecordSink for Arc<S> {
    fn append(&self, record: &LogRecord) -> Result<()> {
        (**self).append(record)
    }
}

/// Appends records to a CSV-like log file
#[derive(Debug, Clone)]
pub struct LogWriter {
    path: PathBuf,
}

impl LogWriter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the log's parent directory if it does not exist yet
    pub fn prepare(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }
        Ok(())
    }

    /// Read every record back from the log, in file order
    ///
    /// A missing log file yields no records. Blank lines are skipped.
    pub fn read_records(&self) -> Result<Vec<LogRecord>> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(self.io_error(source)),
        };

        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|source| self.io_error(source))?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(line.parse()?);
        }
        Ok(records)
    }

    fn io_error(&self, source: std::io::Error) -> MonitorError {
        MonitorError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl RecordSink for LogWriter {
    fn append(&self, record: &LogRecord) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.io_error(source))?;

        writeln!(file, "{}", record).map_err(|source| self.io_error(source))?;
        file.flush().map_err(|source| self.io_error(source))?;
        Ok(())
    }
}
