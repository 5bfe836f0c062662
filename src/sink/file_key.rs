//! Log file identity.
//!
//! A wiretap file is identified by the pair `(date, device id)` and named
//! `{YYYY_MM_DD}_{deviceId}.wiretap`.

use std::fmt::{self, Write as _};

use chrono::NaiveDate;

use crate::domain::DeviceId;

/// `strftime` pattern for the date half of file names and record stamps.
pub const DATE_FORMAT: &str = "%Y_%m_%d";

/// Extension of every log file.
pub const FILE_EXTENSION: &str = "wiretap";

/// Identity of one per-device, per-day log file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogFileKey {
    /// Calendar date the file covers.
    pub date: NaiveDate,
    /// Device whose events the file holds.
    pub device_id: DeviceId,
}

impl LogFileKey {
    /// Creates a key.
    #[must_use]
    pub const fn new(date: NaiveDate, device_id: DeviceId) -> Self {
        Self { date, device_id }
    }

    /// `YYYY_MM_DD` rendering of the date.
    #[must_use]
    pub fn date_stamp(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    /// File name for this key.
    ///
    /// Bytes of the device id outside `[A-Za-z0-9_.-]` are written as `%XX`
    /// (upper-case hex), `%` included. Distinct ids therefore always map to
    /// distinct names, and no id can escape the output directory.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}.{FILE_EXTENSION}",
            self.date_stamp(),
            encode_file_component(self.device_id.as_str())
        )
    }
}

impl fmt::Display for LogFileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.date_stamp(), self.device_id)
    }
}

fn encode_file_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' | b'.' | b'-' => {
                out.push(char::from(byte));
            }
            _ => {
                let _ = write!(out, "%{byte:02X}");
            }
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn key(y: i32, m: u32, d: u32, id: &str) -> LogFileKey {
        let Some(date) = NaiveDate::from_ymd_opt(y, m, d) else {
            panic!("valid date");
        };
        let Some(device_id) = DeviceId::new(id) else {
            panic!("valid id");
        };
        LogFileKey::new(date, device_id)
    }

    #[test]
    fn file_name_format() {
        assert_eq!(key(2024, 5, 1, "rtu42").file_name(), "2024_05_01_rtu42.wiretap");
    }

    #[test]
    fn distinct_devices_get_distinct_files() {
        let a = key(2024, 5, 1, "rtu1");
        let b = key(2024, 5, 1, "rtu2");
        assert_ne!(a.file_name(), b.file_name());
    }

    #[test]
    fn distinct_days_get_distinct_files() {
        let a = key(2024, 5, 1, "rtu1");
        let b = key(2024, 5, 2, "rtu1");
        assert_ne!(a, b);
        assert_ne!(a.file_name(), b.file_name());
    }

    #[test]
    fn path_separators_are_escaped() {
        let name = key(2024, 12, 31, "../etc/passwd").file_name();
        assert_eq!(name, "2024_12_31_..%2Fetc%2Fpasswd.wiretap");
        assert!(!name.contains('/'));
    }

    #[test]
    fn escaping_keeps_ids_apart() {
        let ids = ["rtu/1", "rtu_1", "rtu%2F1", "rtu 1", "rtü1"];
        let names: std::collections::HashSet<String> =
            ids.iter().map(|id| key(2024, 5, 1, id).file_name()).collect();
        assert_eq!(names.len(), ids.len());
        assert_eq!(key(2024, 5, 1, "rtu%2F1").file_name(), "2024_05_01_rtu%252F1.wiretap");
        assert_eq!(key(2024, 5, 1, "rtü1").file_name(), "2024_05_01_rt%C3%BC1.wiretap");
    }
}
