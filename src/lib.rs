pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod export;

pub use crate::core::*;
pub use error::MonitorError;
pub use export::{LogWriter, RecordSink, LOG_FILE_NAME};
