//! # rtu-wiretap
//!
//! Taps the live event streams of a fleet of RTU gateways and appends the
//! events worth keeping to per-device, per-day `.wiretap` files.
//!
//! For every device address the gateway is asked for a stream endpoint
//! (`GET http://{addr}:3012/register`), the endpoint is held open, and every
//! inbound message is decoded, filtered by response type, and appended to
//! `{YYYY_MM_DD}_{deviceId}.wiretap`.
//!
//! ## Architecture
//!
//! ```text
//! RTU gateways (HTTP register + WebSocket stream)
//!     │
//!     ├── EndpointHandshake, stream loop (stream/)
//!     │
//!     ├── FleetSupervisor, one task per device (service/)
//!     ├── EventPipeline (service/)
//!     │
//!     ├── Event, EventRouter (domain/)
//!     │
//!     └── EventLog, per-file locked (sink/)
//! ```

pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod shutdown;
pub mod sink;
pub mod stream;
