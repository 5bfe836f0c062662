//! Shared context handed to every device task.
//!
//! Replaces process-wide state: configuration, clock, and the log sink are
//! built once in `main` and passed down explicitly.

use std::sync::Arc;

use crate::config::WiretapConfig;
use crate::domain::{Clock, EventRouter};
use crate::error::WiretapError;
use crate::sink::EventLog;

/// Process-lifetime context shared by all device tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<WiretapConfig>,
    /// Source of receipt times and file dates.
    pub clock: Arc<dyn Clock>,
    /// Keep/discard policy.
    pub router: EventRouter,
    /// Durable sink for retained events.
    pub event_log: Arc<EventLog>,
}

impl AppState {
    /// Builds the context, opening the event log in the configured directory.
    ///
    /// # Errors
    ///
    /// Returns [`WiretapError::WriteFailure`] if the output directory cannot
    /// be created.
    pub async fn build(config: WiretapConfig, clock: Arc<dyn Clock>) -> Result<Self, WiretapError> {
        let event_log = EventLog::open(config.output_dir.clone(), Arc::clone(&clock)).await?;
        Ok(Self {
            config: Arc::new(config),
            clock,
            router: EventRouter::new(),
            event_log: Arc::new(event_log),
        })
    }
}
