use clap::Parser;
use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use energy_file_tracker::{
    cli::{Cli, OutputFormat},
    DirectoryWatcher, EventDebouncer, LogRecord, LogWriter, RecordSink, WatchTarget,
};

/// Writes to the log, then echoes the record in the requested format
struct EchoSink {
    writer: LogWriter,
    format: OutputFormat,
}

impl RecordSink for EchoSink {
    fn append(&self, record: &LogRecord) -> energy_file_tracker::error::Result<()> {
        self.writer.append(record)?;

        match self.format {
            OutputFormat::Quiet => {}
            OutputFormat::Text => println!("{}", record),
            OutputFormat::Json => match serde_json::to_string(record) {
                Ok(json) => println!("{}", json),
                Err(err) => tracing::warn!("Failed to serialize record: {}", err),
            },
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.setup_logging();

    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = cli.validate(&config) {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }

    let writer = LogWriter::new(&config.log.log_file);
    writer
        .prepare()
        .with_context(|| format!("Cannot create log directory for {}", writer.path().display()))?;
    tracing::info!("Appending records to {}", writer.path().display());

    let debouncer = Arc::new(EventDebouncer::new(config.watcher.event_debounce_duration()));
    let sink = EchoSink {
        writer,
        format: cli.output,
    };
    let mut watcher = DirectoryWatcher::new(debouncer, sink);

    if let Err(err) = watcher.start(&WatchTarget::new(&config.watcher.watch_dir)) {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
    }

    watcher.stop();
    Ok(())
}
