//! Log sink: file identity, record format, and the append-only event log.
//!
//! Retained events are appended to `{YYYY_MM_DD}_{deviceId}.wiretap` files
//! in the configured output directory, one JSON payload per line behind a
//! single `timestamp|data` header.

pub mod event_log;
pub mod file_key;
pub mod record;

pub use event_log::EventLog;
pub use file_key::LogFileKey;
pub use record::{HEADER, LogRecord};
