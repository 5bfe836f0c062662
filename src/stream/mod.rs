//! Stream layer: gateway registration and the WebSocket receive loop.
//!
//! Each device address is first resolved through the registration
//! handshake, then the returned endpoint is held open for the lifetime of
//! the device task.

pub mod connection;
pub mod handshake;

pub use connection::{GatewayStream, connect, stream_events};
pub use handshake::EndpointHandshake;
