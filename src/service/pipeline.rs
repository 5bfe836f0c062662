//! Per-message pipeline: decode, route, log.

use std::path::PathBuf;

use crate::app_state::AppState;
use crate::domain::{Event, RouteDecision};
use crate::error::WiretapError;

/// What happened to one inbound message.
#[derive(Debug)]
pub enum MessageOutcome {
    /// Retained and appended to the given file.
    Logged(PathBuf),
    /// Decoded but not of a retained type.
    Discarded,
    /// Could not be decoded or written; the stream carries on.
    Rejected(WiretapError),
}

/// Turns raw stream text into log writes.
///
/// Every failure is contained to the message that caused it: the returned
/// [`MessageOutcome`] is informational and never ends the stream.
#[derive(Debug, Clone)]
pub struct EventPipeline {
    state: AppState,
}

impl EventPipeline {
    /// Creates a pipeline over the shared context.
    #[must_use]
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Decodes, routes, and (if retained) logs one raw message.
    ///
    /// The log write is complete when this returns.
    pub async fn handle_message(&self, raw: &str) -> MessageOutcome {
        let event = match Event::parse(raw, self.state.clock.now()) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(kind = err.kind(), error = %err, "dropping undecodable message");
                return MessageOutcome::Rejected(err);
            }
        };

        if self.state.router.route(&event) == RouteDecision::Discard {
            return MessageOutcome::Discarded;
        }

        match self.state.event_log.append(&event).await {
            Ok(path) => MessageOutcome::Logged(path),
            Err(err) => {
                tracing::warn!(
                    device_id = %event.device_id(),
                    kind = err.kind(),
                    error = %err,
                    "event not written"
                );
                MessageOutcome::Rejected(err)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;
    use crate::config::WiretapConfig;
    use crate::domain::FixedClock;
    use crate::sink::{HEADER, LogRecord};

    async fn pipeline(dir: &std::path::Path) -> EventPipeline {
        let Some(now) = NaiveDate::from_ymd_opt(2024, 5, 1).and_then(|d| d.and_hms_opt(12, 0, 0))
        else {
            panic!("valid timestamp");
        };
        let config = WiretapConfig {
            output_dir: dir.to_path_buf(),
            ..WiretapConfig::default()
        };
        let Ok(state) = AppState::build(config, Arc::new(FixedClock(now))).await else {
            panic!("state");
        };
        EventPipeline::new(state)
    }

    const UPDATE: &str = r#"{"response_type":"RTUUpdateResult","message":"ok","data":{"RTU":{"id":"rtu42","addr":"10.0.0.5"}}}"#;

    #[tokio::test]
    async fn retained_message_is_logged() {
        let Ok(tmp) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let pipeline = pipeline(tmp.path()).await;

        let MessageOutcome::Logged(path) = pipeline.handle_message(UPDATE).await else {
            panic!("expected a log write");
        };
        assert_eq!(path, tmp.path().join("2024_05_01_rtu42.wiretap"));

        let contents = tokio::fs::read_to_string(&path).await.unwrap_or_default();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some(HEADER));
        let Some(line) = lines.next() else {
            panic!("record line");
        };
        assert!(line.starts_with("2024_05_01 12:00:00|"));
        let Ok(record) = LogRecord::parse_line(line) else {
            panic!("record parses");
        };
        let Ok(original) = serde_json::from_str::<serde_json::Value>(UPDATE) else {
            panic!("valid json");
        };
        assert_eq!(record.payload, original);
        assert_eq!(lines.next(), None);
    }

    #[tokio::test]
    async fn discarded_message_writes_nothing() {
        let Ok(tmp) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let pipeline = pipeline(tmp.path()).await;
        let raw = r#"{"response_type":"Heartbeat","message":"alive","data":{"RTU":{"id":"rtu42","addr":"10.0.0.5"}}}"#;

        assert!(matches!(
            pipeline.handle_message(raw).await,
            MessageOutcome::Discarded
        ));
        let Ok(mut entries) = std::fs::read_dir(tmp.path()) else {
            panic!("read dir");
        };
        assert!(entries.next().is_none());
    }

    #[tokio::test]
    async fn bad_messages_are_rejected_and_pipeline_continues() {
        let Ok(tmp) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let pipeline = pipeline(tmp.path()).await;

        let no_data = r#"{"response_type":"RTUUpdateResult","message":"ok"}"#;
        assert!(matches!(
            pipeline.handle_message(no_data).await,
            MessageOutcome::Rejected(WiretapError::MissingRequiredField { field: "data" })
        ));

        let no_id = r#"{"response_type":"RTUUpdateResult","message":"ok","data":{"RTU":{"addr":"10.0.0.5"}}}"#;
        assert!(matches!(
            pipeline.handle_message(no_id).await,
            MessageOutcome::Rejected(WiretapError::MissingRequiredField { field: "data.RTU.id" })
        ));

        assert!(matches!(
            pipeline.handle_message("not json").await,
            MessageOutcome::Rejected(WiretapError::DecodeFailure(_))
        ));

        assert!(matches!(
            pipeline.handle_message(UPDATE).await,
            MessageOutcome::Logged(_)
        ));
    }

    #[tokio::test]
    async fn write_failure_is_contained() {
        let Ok(tmp) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let pipeline = pipeline(tmp.path()).await;

        // A directory squatting on the file name makes the append fail.
        let blocked = tmp.path().join("2024_05_01_rtu42.wiretap");
        let Ok(()) = tokio::fs::create_dir(&blocked).await else {
            panic!("create blocker");
        };
        assert!(matches!(
            pipeline.handle_message(UPDATE).await,
            MessageOutcome::Rejected(WiretapError::WriteFailure { .. })
        ));

        let other = UPDATE.replace("rtu42", "rtu7");
        let MessageOutcome::Logged(path) = pipeline.handle_message(&other).await else {
            panic!("other device should still be logged");
        };
        assert_eq!(path, tmp.path().join("2024_05_01_rtu7.wiretap"));

        let Ok(()) = tokio::fs::remove_dir(&blocked).await else {
            panic!("remove blocker");
        };
        assert!(matches!(
            pipeline.handle_message(UPDATE).await,
            MessageOutcome::Logged(_)
        ));
        let contents = tokio::fs::read_to_string(&blocked).await.unwrap_or_default();
        assert_eq!(contents.lines().next(), Some(HEADER));
        assert_eq!(contents.lines().count(), 2);
    }
}
