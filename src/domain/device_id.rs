//! Type-safe RTU identifier.
//!
//! [`DeviceId`] is a newtype over the `data.RTU.id` string carried by every
//! stream message, so that device identities cannot be confused with
//! addresses or other free-form strings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identity of a remote terminal unit.
///
/// Used as half of the log file key and as a structured tracing field.
/// Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Creates a `DeviceId`, returning `None` for an empty string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() { None } else { Some(Self(id)) }
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
