//! Device and fleet supervision.
//!
//! Every configured device address gets one task that walks
//! `Connecting → Streaming → Terminated`. Tasks run on a [`JoinSet`] with
//! no bound other than the number of devices. A task that fails (or
//! panics) is recorded in the [`FleetReport`]; its siblings keep running.
//!
//! Dropped connections and failed handshakes are not retried.

use std::collections::HashMap;
use std::fmt;

use tokio::task::JoinSet;
use tracing::Instrument;

use super::EventPipeline;
use crate::app_state::AppState;
use crate::error::WiretapError;
use crate::shutdown::ShutdownSignal;
use crate::stream::{EndpointHandshake, connect, stream_events};

/// Lifecycle of one device task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// Registering with the gateway and opening the stream.
    Connecting,
    /// Receiving events.
    Streaming,
    /// Finished; see [`DeviceExit`].
    Terminated,
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connecting => "connecting",
            Self::Streaming => "streaming",
            Self::Terminated => "terminated",
        })
    }
}

/// Why a device task ended.
#[derive(Debug)]
pub enum DeviceExit {
    /// Shutdown was requested.
    Shutdown,
    /// The handshake or the stream failed.
    Failed(WiretapError),
    /// The task panicked.
    Panicked(String),
}

/// Final record for one device.
#[derive(Debug)]
pub struct DeviceReport {
    /// Configured address.
    pub addr: String,
    /// Stream endpoint, if the handshake succeeded.
    pub endpoint: Option<String>,
    /// How the task ended.
    pub exit: DeviceExit,
}

impl DeviceReport {
    /// Returns `true` if the device failed at the handshake.
    #[must_use]
    pub fn is_handshake_failure(&self) -> bool {
        matches!(&self.exit, DeviceExit::Failed(err) if err.is_handshake())
    }

    /// Returns `true` unless the device stopped for shutdown.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        !matches!(self.exit, DeviceExit::Shutdown)
    }
}

/// Outcome of a whole fleet run.
#[derive(Debug, Default)]
pub struct FleetReport {
    /// One entry per device, in completion order.
    pub devices: Vec<DeviceReport>,
}

impl FleetReport {
    /// Returns `true` if any device failed its handshake.
    #[must_use]
    pub fn has_handshake_failures(&self) -> bool {
        self.devices.iter().any(DeviceReport::is_handshake_failure)
    }

    /// Number of devices that ended for a reason other than shutdown.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.devices.iter().filter(|d| d.is_failure()).count()
    }

    /// Returns `true` if every device stopped for shutdown.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed_count() == 0
    }

    /// Report for `addr`, if that device has finished.
    #[must_use]
    pub fn device(&self, addr: &str) -> Option<&DeviceReport> {
        self.devices.iter().find(|d| d.addr == addr)
    }
}

/// Runs one task per device and collects their outcomes.
#[derive(Debug, Clone)]
pub struct FleetSupervisor {
    pipeline: EventPipeline,
    handshake: EndpointHandshake,
}

impl FleetSupervisor {
    /// Creates a supervisor over the shared context.
    #[must_use]
    pub fn new(state: AppState, handshake: EndpointHandshake) -> Self {
        Self {
            pipeline: EventPipeline::new(state),
            handshake,
        }
    }

    /// Supervises every address until all device tasks have terminated.
    pub async fn run(&self, addrs: &[String], shutdown: ShutdownSignal) -> FleetReport {
        let mut tasks = JoinSet::new();
        let mut addr_by_task = HashMap::with_capacity(addrs.len());

        for addr in addrs {
            let span = tracing::info_span!(
                "device",
                device_addr = %addr,
                session = %uuid::Uuid::new_v4()
            );
            let fut = run_device(
                addr.clone(),
                self.handshake.clone(),
                self.pipeline.clone(),
                shutdown.clone(),
            )
            .instrument(span);
            let handle = tasks.spawn(fut);
            addr_by_task.insert(handle.id(), addr.clone());
        }
        tracing::info!(devices = addrs.len(), "supervising device streams");

        let mut report = FleetReport::default();
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, device)) => {
                    addr_by_task.remove(&id);
                    report.devices.push(device);
                }
                Err(err) => {
                    let addr = addr_by_task.remove(&err.id()).unwrap_or_default();
                    tracing::error!(device_addr = %addr, error = %err, "device task panicked");
                    report.devices.push(DeviceReport {
                        addr,
                        endpoint: None,
                        exit: DeviceExit::Panicked(err.to_string()),
                    });
                }
            }
        }

        tracing::info!(
            devices = report.devices.len(),
            failed = report.failed_count(),
            "all device streams terminated"
        );
        report
    }
}

/// Drives a single device from handshake to termination.
pub async fn run_device(
    addr: String,
    handshake: EndpointHandshake,
    pipeline: EventPipeline,
    mut shutdown: ShutdownSignal,
) -> DeviceReport {
    tracing::info!(state = %DeviceState::Connecting, "resolving stream endpoint");

    let resolved = tokio::select! {
        () = shutdown.wait() => None,
        resolved = handshake.resolve(&addr) => Some(resolved),
    };
    let endpoint = match resolved {
        None => return terminated(addr, None, DeviceExit::Shutdown),
        Some(Ok(url)) => url,
        Some(Err(err)) => return terminated(addr, None, DeviceExit::Failed(err)),
    };

    let connected = tokio::select! {
        () = shutdown.wait() => None,
        connected = connect(&endpoint) => Some(connected),
    };
    let stream = match connected {
        None => return terminated(addr, Some(endpoint), DeviceExit::Shutdown),
        Some(Ok(stream)) => stream,
        Some(Err(err)) => return terminated(addr, Some(endpoint), DeviceExit::Failed(err)),
    };

    tracing::info!(state = %DeviceState::Streaming, url = %endpoint, "connected to gateway stream");
    let exit = match stream_events(stream, &endpoint, &pipeline, shutdown).await {
        Ok(()) => DeviceExit::Shutdown,
        Err(err) => DeviceExit::Failed(err),
    };
    terminated(addr, Some(endpoint), exit)
}

fn terminated(addr: String, endpoint: Option<String>, exit: DeviceExit) -> DeviceReport {
    match &exit {
        DeviceExit::Failed(err) => {
            tracing::error!(state = %DeviceState::Terminated, kind = err.kind(), error = %err, "device stopped");
        }
        DeviceExit::Shutdown | DeviceExit::Panicked(_) => {
            tracing::info!(state = %DeviceState::Terminated, "device stopped");
        }
    }
    DeviceReport {
        addr,
        endpoint,
        exit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(addr: &str, exit: DeviceExit) -> DeviceReport {
        DeviceReport {
            addr: addr.to_string(),
            endpoint: None,
            exit,
        }
    }

    #[test]
    fn handshake_failures_are_flagged() {
        let fleet = FleetReport {
            devices: vec![
                report("a", DeviceExit::Shutdown),
                report(
                    "b",
                    DeviceExit::Failed(WiretapError::HandshakeUnreachable {
                        addr: "b".to_string(),
                        reason: "refused".to_string(),
                    }),
                ),
            ],
        };
        assert!(fleet.has_handshake_failures());
        assert_eq!(fleet.failed_count(), 1);
        assert!(!fleet.is_clean());
        assert!(fleet.device("b").is_some_and(DeviceReport::is_handshake_failure));
    }

    #[test]
    fn connection_loss_is_a_failure_but_not_a_handshake_failure() {
        let fleet = FleetReport {
            devices: vec![report(
                "a",
                DeviceExit::Failed(WiretapError::ConnectionLost {
                    url: "ws://a".to_string(),
                    reason: "stream ended".to_string(),
                }),
            )],
        };
        assert!(!fleet.has_handshake_failures());
        assert!(!fleet.is_clean());
    }

    #[test]
    fn shutdown_only_is_clean() {
        let fleet = FleetReport {
            devices: vec![report("a", DeviceExit::Shutdown), report("b", DeviceExit::Shutdown)],
        };
        assert!(fleet.is_clean());
    }

    #[test]
    fn state_names() {
        assert_eq!(DeviceState::Connecting.to_string(), "connecting");
        assert_eq!(DeviceState::Streaming.to_string(), "streaming");
        assert_eq!(DeviceState::Terminated.to_string(), "terminated");
    }
}
