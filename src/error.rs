//! Wiretap error types with per-device propagation classification.
//!
//! [`WiretapError`] is the central error type for the crate. Each variant
//! carries a stable kind string (used as a structured tracing field) and
//! is classified as either fatal for the owning device task or recoverable
//! at the per-message boundary.

use std::path::PathBuf;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, WiretapError>;

/// Error enum covering handshake, stream, decode, and sink failures.
///
/// # Propagation
///
/// | Kind                     | Scope                         |
/// |--------------------------|-------------------------------|
/// | `handshake_unreachable`  | Fatal for the device          |
/// | `handshake_rejected`     | Fatal for the device          |
/// | `connection_lost`        | Fatal for the device          |
/// | `decode_failure`         | Per message, logged and skipped |
/// | `missing_required_field` | Per message, logged and skipped |
/// | `write_failure`          | Per message, logged and skipped |
/// | `config`                 | Fatal for the process         |
#[derive(Debug, thiserror::Error)]
pub enum WiretapError {
    /// The gateway at the given address did not answer the registration request.
    #[error("gateway at {addr} did not respond: {reason}")]
    HandshakeUnreachable {
        /// Device address the handshake targeted.
        addr: String,
        /// Transport-level failure description.
        reason: String,
    },

    /// The gateway answered but the registration was not usable.
    #[error("gateway at {addr} rejected registration: {reason}")]
    HandshakeRejected {
        /// Device address the handshake targeted.
        addr: String,
        /// HTTP status, when the rejection was a non-success status.
        status: Option<u16>,
        /// Human-readable rejection description.
        reason: String,
    },

    /// A stream message is not valid JSON (or not a JSON object).
    #[error("malformed stream message: {0}")]
    DecodeFailure(String),

    /// A stream message decoded but lacks a field needed to route or log it.
    #[error("stream message is missing required field `{field}`")]
    MissingRequiredField {
        /// Dotted path of the missing field (e.g. `data.RTU.id`).
        field: &'static str,
    },

    /// The event stream closed or errored mid-session.
    #[error("connection to {url} lost: {reason}")]
    ConnectionLost {
        /// Stream endpoint of the lost connection.
        url: String,
        /// Close reason or transport error.
        reason: String,
    },

    /// A log file could not be created or appended to.
    #[error("failed to write {}: {source}", path.display())]
    WriteFailure {
        /// Target log file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl WiretapError {
    /// Returns a stable snake_case name for this variant.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::HandshakeUnreachable { .. } => "handshake_unreachable",
            Self::HandshakeRejected { .. } => "handshake_rejected",
            Self::DecodeFailure(_) => "decode_failure",
            Self::MissingRequiredField { .. } => "missing_required_field",
            Self::ConnectionLost { .. } => "connection_lost",
            Self::WriteFailure { .. } => "write_failure",
            Self::Config(_) => "config",
        }
    }

    /// Returns `true` if this error ends the owning device task.
    ///
    /// Decode and write failures are contained to the message that caused
    /// them; everything else stops the device.
    #[must_use]
    pub const fn is_device_fatal(&self) -> bool {
        !matches!(
            self,
            Self::DecodeFailure(_) | Self::MissingRequiredField { .. } | Self::WriteFailure { .. }
        )
    }

    /// Returns `true` for either handshake variant.
    #[must_use]
    pub const fn is_handshake(&self) -> bool {
        matches!(
            self,
            Self::HandshakeUnreachable { .. } | Self::HandshakeRejected { .. }
        )
    }
}

impl From<serde_json::Error> for WiretapError {
    fn from(err: serde_json::Error) -> Self {
        Self::DecodeFailure(err.to_string())
    }
}
