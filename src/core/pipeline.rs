use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::classify::classify;
use super::debounce::EventDebouncer;
use super::events::RawEvent;
use super::record::{LogRecord, RecordBuilder};
use crate::export::RecordSink;

/// Handles one raw event at a time: debounce, classify, build, write.
///
/// All collaborators are injected. The debouncer is shared by `Arc` so
/// several pipelines (or threads) can agree on the same per-path state.
pub struct EventPipeline<S: RecordSink> {
    target: PathBuf,
    debouncer: Arc<EventDebouncer>,
    builder: RecordBuilder,
    sink: S,
}

impl<S: RecordSink> EventPipeline<S> {
    pub fn new<P: AsRef<Path>>(target: P, debouncer: Arc<EventDebouncer>, sink: S) -> Self {
        let target = target.as_ref().to_path_buf();
        Self {
            builder: RecordBuilder::new(&target),
            target,
            debouncer,
            sink,
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn debouncer(&self) -> &EventDebouncer {
        &self.debouncer
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Process one event, returning the record if one was persisted
    pub fn handle(&self, event: &RawEvent) -> Option<LogRecord> {
        if event.is_malformed() {
            tracing::debug!("Discarding notification without a path");
            return None;
        }

        let operation = event.kind.operation()?;

        if !self.debouncer.should_accept(&event.relative_path, event.observed_at_millis) {
            tracing::debug!("Debounced {:?} on {}", event.kind, event.relative_path);
            return None;
        }

        let file_type = classify(&event.relative_path);
        let record = self
            .builder
            .build(file_type, operation, event.observed_at_millis, &event.relative_path);

        match self.sink.append(&record) {
            Ok(()) => {
                tracing::debug!("Logged {} {}", record.operation, event.relative_path);
                Some(record)
            }
            Err(err) => {
                tracing::error!("Dropping record for {}: {}", event.relative_path, err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::{now_millis, Operation, OperationKind};
    use crate::core::FileType;
    use crate::error::{MonitorError, Result};
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct MemorySink {
        records: Mutex<Vec<LogRecord>>,
    }

    impl RecordSink for MemorySink {
        fn append(&self, record: &LogRecord) -> Result<()> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    impl MemorySink {
        fn len(&self) -> usize {
            self.records.lock().unwrap().len()
        }
    }

    struct FailingSink;

    impl RecordSink for FailingSink {
        fn append(&self, _record: &LogRecord) -> Result<()> {
            Err(MonitorError::Write {
                path: PathBuf::from("/unwritable"),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            })
        }
    }

    fn pipeline(temp_dir: &TempDir) -> EventPipeline<MemorySink> {
        EventPipeline::new(temp_dir.path(), Arc::new(EventDebouncer::default()), MemorySink::default())
    }

    #[test]
    fn test_open_on_existing_pdf() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(temp_dir.path().join("report.pdf"), vec![7u8; 2048]).unwrap();
        let pipeline = pipeline(&temp_dir);
        let t = now_millis();

        let record = pipeline
            .handle(&RawEvent::new(OperationKind::Open, "report.pdf", t))
            .expect("record should be written");

        assert_eq!(record.file_type, FileType::Text);
        assert_eq!(record.operation, Operation::Read);
        assert_eq!(record.start_time_millis, t);
        assert_eq!(record.date, chrono::Local::now().date_naive());
        assert_eq!(record.file_size_bytes, 2048);
        assert_eq!(record.energy_units, 0);
        assert_eq!(pipeline.sink().len(), 1);
    }

    #[test]
    fn test_burst_within_window_is_suppressed() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pipeline = pipeline(&temp_dir);
        let t = now_millis();

        assert!(pipeline.handle(&RawEvent::new(OperationKind::Modify, "song.mp3", t)).is_some());
        assert!(pipeline.handle(&RawEvent::new(OperationKind::Modify, "song.mp3", t + 500)).is_none());

        assert_eq!(pipeline.sink().len(), 1);
    }

    #[test]
    fn test_events_outside_window_are_both_logged() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pipeline = pipeline(&temp_dir);
        let t = now_millis();

        pipeline.handle(&RawEvent::new(OperationKind::Modify, "song.mp3", t));
        pipeline.handle(&RawEvent::new(OperationKind::Modify, "song.mp3", t + 1500));

        let records = pipeline.sink().records.lock().unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.file_type == FileType::Audio && r.operation == Operation::Write));
    }

    #[test]
    fn test_delete_of_missing_file_has_zero_size() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pipeline = pipeline(&temp_dir);

        let record = pipeline
            .handle(&RawEvent::new(OperationKind::Delete, "movie.mkv", now_millis()))
            .expect("record should be written");

        assert_eq!(record.operation, Operation::Delete);
        assert_eq!(record.file_type, FileType::Video);
        assert_eq!(record.file_size_bytes, 0);
    }

    #[test]
    fn test_empty_path_is_discarded() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pipeline = pipeline(&temp_dir);

        assert!(pipeline.handle(&RawEvent::new(OperationKind::Modify, "", now_millis())).is_none());
        assert_eq!(pipeline.sink().len(), 0);
        assert_eq!(pipeline.debouncer().tracked_paths(), 0);
    }

    #[test]
    fn test_untracked_kind_does_not_touch_debounce_state() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pipeline = pipeline(&temp_dir);
        let t = now_millis();

        assert!(pipeline.handle(&RawEvent::new(OperationKind::Other, "notes.txt", t)).is_none());
        assert_eq!(pipeline.debouncer().last_accepted("notes.txt"), None);
        assert!(pipeline.handle(&RawEvent::new(OperationKind::Modify, "notes.txt", t + 10)).is_some());
    }

    #[test]
    fn test_write_failure_drops_record_and_continues() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pipeline = EventPipeline::new(temp_dir.path(), Arc::new(EventDebouncer::default()), FailingSink);
        let t = now_millis();

        assert!(pipeline.handle(&RawEvent::new(OperationKind::Modify, "a.txt", t)).is_none());
        assert!(pipeline.handle(&RawEvent::new(OperationKind::Modify, "b.txt", t)).is_none());
        assert_eq!(pipeline.debouncer().tracked_paths(), 2);
    }

    #[test]
    fn test_shared_debouncer_across_pipelines() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let debouncer = Arc::new(EventDebouncer::default());
        let first = EventPipeline::new(temp_dir.path(), Arc::clone(&debouncer), MemorySink::default());
        let second = EventPipeline::new(temp_dir.path(), Arc::clone(&debouncer), MemorySink::default());
        let t = now_millis();

        assert!(first.handle(&RawEvent::new(OperationKind::Open, "clip.avi", t)).is_some());
        assert!(second.handle(&RawEvent::new(OperationKind::Open, "clip.avi", t + 100)).is_none());
    }
}
