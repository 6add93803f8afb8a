//! Log records and how they are assembled from accepted events

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::classify::FileType;
use super::events::{now_millis, Operation};
use crate::error::MonitorError;

/// Value written in the energy column until a real model exists
pub const ENERGY_PLACEHOLDER: i64 = 0;

const DATE_FORMAT: &str = "%Y-%m-%d";
const FIELD_COUNT: usize = 7;

/// One line of the operations log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub file_type: FileType,
    pub operation: Operation,
    pub start_time_millis: i64,
    /// Time from observing the event to finishing the record, not the file operation itself
    pub duration_millis: i64,
    pub date: NaiveDate,
    pub file_size_bytes: u64,
    pub energy_units: i64,
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{},{}",
            self.file_type,
            self.operation,
            self.start_time_millis,
            self.duration_millis,
            self.date.format(DATE_FORMAT),
            self.file_size_bytes,
            self.energy_units
        )
    }
}

impl FromStr for LogRecord {
    type Err = MonitorError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line.trim_end_matches(|c: char| c == '\r' || c == '\n').split(',').collect();
        if fields.len() != FIELD_COUNT {
            return Err(MonitorError::Parse(format!(
                "expected {} fields, found {} in {:?}",
                FIELD_COUNT,
                fields.len(),
                line
            )));
        }

        let bad = |name: &str, value: &str| MonitorError::Parse(format!("invalid {}: {:?}", name, value));

        Ok(Self {
            file_type: fields[0].parse().map_err(MonitorError::Parse)?,
            operation: fields[1].parse().map_err(MonitorError::Parse)?,
            start_time_millis: fields[2].parse().map_err(|_| bad("start time", fields[2]))?,
            duration_millis: fields[3].parse().map_err(|_| bad("duration", fields[3]))?,
            date: NaiveDate::parse_from_str(fields[4], DATE_FORMAT).map_err(|_| bad("date", fields[4]))?,
            file_size_bytes: fields[5].parse().map_err(|_| bad("file size", fields[5]))?,
            energy_units: fields[6].parse().map_err(|_| bad("energy", fields[6]))?,
        })
    }
}

/// Builds records for files inside one watched directory
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    target: PathBuf,
}

impl RecordBuilder {
    pub fn new<P: AsRef<Path>>(target: P) -> Self {
        Self {
            target: target.as_ref().to_path_buf(),
        }
    }

    pub fn build(
        &self,
        file_type: FileType,
        operation: Operation,
        observed_at_millis: i64,
        relative_path: &str,
    ) -> LogRecord {
        let file_size_bytes = self.file_size(relative_path);
        let date = chrono::Local::now().date_naive();

        LogRecord {
            file_type,
            operation,
            start_time_millis: observed_at_millis,
            duration_millis: now_millis() - observed_at_millis,
            date,
            file_size_bytes,
            energy_units: ENERGY_PLACEHOLDER,
        }
    }

    /// Size on disk, or 0 if the file is already gone or unreadable
    fn file_size(&self, relative_path: &str) -> u64 {
        let path = self.target.join(relative_path);
        match std::fs::metadata(&path) {
            Ok(metadata) => metadata.len(),
            Err(err) => {
                tracing::debug!("No size for {}: {}", path.display(), err);
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sample() -> LogRecord {
        LogRecord {
            file_type: FileType::Audio,
            operation: Operation::Write,
            start_time_millis: 1_700_000_000_000,
            duration_millis: 3,
            date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            file_size_bytes: 4096,
            energy_units: 0,
        }
    }

    #[test]
    fn test_display_format() {
        assert_eq!(sample().to_string(), "audio,write,1700000000000,3,2024-03-09,4096,0");
    }

    #[test]
    fn test_parse_line() {
        let line = "audio,write,1700000000000,3,2024-03-09,4096,0\n";
        assert_eq!(line.parse::<LogRecord>().unwrap(), sample());
    }

    #[test]
    fn test_parse_rejects_wrong_field_count() {
        assert!("audio,write,1,2,2024-03-09,4096".parse::<LogRecord>().is_err());
        assert!("audio,write,1,2,2024-03-09,4096,0,9".parse::<LogRecord>().is_err());
    }

    #[test]
    fn test_parse_rejects_bad_values() {
        assert!("sound,write,1,2,2024-03-09,4096,0".parse::<LogRecord>().is_err());
        assert!("audio,write,x,2,2024-03-09,4096,0".parse::<LogRecord>().is_err());
        assert!("audio,write,1,2,09/03/2024,4096,0".parse::<LogRecord>().is_err());
        assert!("audio,write,1,2,2024-03-09,-5,0".parse::<LogRecord>().is_err());
    }

    #[test]
    fn test_build_existing_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(temp_dir.path().join("report.pdf"), vec![0u8; 2048]).unwrap();

        let builder = RecordBuilder::new(temp_dir.path());
        let observed = now_millis();
        let record = builder.build(FileType::Text, Operation::Read, observed, "report.pdf");

        assert_eq!(record.file_type, FileType::Text);
        assert_eq!(record.operation, Operation::Read);
        assert_eq!(record.start_time_millis, observed);
        assert!(record.duration_millis >= 0);
        assert_eq!(record.file_size_bytes, 2048);
        assert_eq!(record.energy_units, 0);
        assert_eq!(record.date, chrono::Local::now().date_naive());
    }

    #[test]
    fn test_build_missing_file_has_zero_size() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let builder = RecordBuilder::new(temp_dir.path());

        let record = builder.build(FileType::Video, Operation::Delete, now_millis(), "gone.mkv");

        assert_eq!(record.file_size_bytes, 0);
        assert_eq!(record.operation, Operation::Delete);
    }

    #[test]
    fn test_duration_measures_pipeline_latency() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let builder = RecordBuilder::new(temp_dir.path());
        let observed = now_millis() - 250;

        let record = builder.build(FileType::Other, Operation::Write, observed, "x.bin");

        assert!(record.duration_millis >= 250);
    }
}
