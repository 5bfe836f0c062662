//! Line format of wiretap files.
//!
//! ```text
//! timestamp|data
//! 2024_05_01 12:00:00|{"response_type":"RTUUpdateResult",...}
//! ```
//!
//! The payload is compact JSON, which may contain commas, so `|` separates
//! the stamp from the payload. Parsing splits on the first `|` only; the
//! stamp never contains one.

use chrono::NaiveDateTime;
use serde_json::Value;

use super::file_key::DATE_FORMAT;
use crate::error::WiretapError;

/// First line of every wiretap file.
pub const HEADER: &str = "timestamp|data";

/// Separator between the stamp and the payload.
pub const FIELD_DELIMITER: char = '|';

const TIME_FORMAT: &str = "%H:%M:%S";

/// One record line: receipt stamp plus the full original payload.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// `YYYY_MM_DD` receipt date.
    pub date_stamp: String,
    /// `HH:MM:SS` receipt time.
    pub time_stamp: String,
    /// Decoded message as received.
    pub payload: Value,
}

impl LogRecord {
    /// Builds a record for a payload received at `received_at`.
    #[must_use]
    pub fn new(received_at: NaiveDateTime, payload: Value) -> Self {
        Self {
            date_stamp: received_at.format(DATE_FORMAT).to_string(),
            time_stamp: received_at.format(TIME_FORMAT).to_string(),
            payload,
        }
    }

    /// Renders the record as a newline-terminated line.
    #[must_use]
    pub fn to_line(&self) -> String {
        format!(
            "{} {}{FIELD_DELIMITER}{}\n",
            self.date_stamp, self.time_stamp, self.payload
        )
    }

    /// Parses a record line (with or without its trailing newline).
    ///
    /// # Errors
    ///
    /// Returns [`WiretapError::DecodeFailure`] if the line has no delimiter,
    /// the stamp is not `date time`, or the payload is not valid JSON.
    pub fn parse_line(line: &str) -> Result<Self, WiretapError> {
        let line = line.trim_end_matches(['\n', '\r']);
        let (stamp, payload) = line.split_once(FIELD_DELIMITER).ok_or_else(|| {
            WiretapError::DecodeFailure(format!("record has no `{FIELD_DELIMITER}` delimiter"))
        })?;
        let (date_stamp, time_stamp) = stamp
            .split_once(' ')
            .ok_or_else(|| WiretapError::DecodeFailure(format!("bad record stamp `{stamp}`")))?;
        Ok(Self {
            date_stamp: date_stamp.to_string(),
            time_stamp: time_stamp.to_string(),
            payload: serde_json::from_str(payload)?,
        })
    }
}
