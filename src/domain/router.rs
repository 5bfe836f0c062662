//! Keep/discard policy for decoded events.

use super::Event;

/// Outcome of routing a single [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// The event goes to the log sink.
    Retain,
    /// The event is dropped without being written.
    Discard,
}

/// Applies the response-type whitelist to decoded events.
///
/// Stateless; see [`super::event::RETAINED_RESPONSE_TYPES`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EventRouter;

impl EventRouter {
    /// Creates a router.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decides whether `event` is retained.
    ///
    /// A discarded event produces exactly one warning record naming its
    /// type and message.
    pub fn route(&self, event: &Event) -> RouteDecision {
        if event.response_type().is_retained() {
            RouteDecision::Retain
        } else {
            tracing::warn!(
                device_id = %event.device_id(),
                response_type = %event.response_type(),
                event_message = event.message(),
                "discarding event of unwanted type"
            );
            RouteDecision::Discard
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use chrono::NaiveDate;
    use tracing_subscriber::fmt::MakeWriter;

    use super::*;

    /// Collects formatted log output in memory.
    #[derive(Debug, Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn contents(&self) -> String {
            self.0
                .lock()
                .map(|buf| String::from_utf8_lossy(&buf).into_owned())
                .unwrap_or_default()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
            if let Ok(mut buf) = self.0.lock() {
                buf.extend_from_slice(bytes);
            }
            Ok(bytes.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn event(response_type: &str) -> Event {
        let raw = format!(
            r#"{{"response_type":"{response_type}","message":"status ping","data":{{"RTU":{{"id":"rtu42","addr":"10.0.0.5"}}}}}}"#
        );
        let Some(at) = NaiveDate::from_ymd_opt(2024, 5, 1).and_then(|d| d.and_hms_opt(12, 0, 0))
        else {
            panic!("valid timestamp");
        };
        let Ok(event) = Event::parse(&raw, at) else {
            panic!("valid message");
        };
        event
    }

    fn route_capturing(event: &Event) -> (RouteDecision, String) {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .finish();
        let decision =
            tracing::subscriber::with_default(subscriber, || EventRouter::new().route(event));
        (decision, captured.contents())
    }

    #[test]
    fn whitelisted_types_are_retained() {
        for tag in ["RTUUpdateResult", "DeviceEnactResult", "DeviceUpdateResult"] {
            let (decision, output) = route_capturing(&event(tag));
            assert_eq!(decision, RouteDecision::Retain);
            assert!(output.is_empty());
        }
    }

    #[test]
    fn other_types_are_discarded_with_one_warning() {
        let (decision, output) = route_capturing(&event("Heartbeat"));
        assert_eq!(decision, RouteDecision::Discard);
        assert_eq!(output.lines().count(), 1);
        assert!(output.contains("WARN"));
        assert!(output.contains("Heartbeat"));
        assert!(output.contains("status ping"));
    }
}
