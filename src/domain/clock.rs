//! Wall-clock source for receipt times and log file dates.

use std::fmt::Debug;

use chrono::{Local, NaiveDateTime};

/// Supplies the local wall-clock time.
///
/// Injected through [`crate::app_state::AppState`] so that file identity and
/// record timestamps can be pinned in tests.
pub trait Clock: Send + Sync + Debug {
    /// Current local date and time.
    fn now(&self) -> NaiveDateTime;
}

/// The system's local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
