//! Decoded stream events.
//!
//! Every inbound stream message is decoded into an [`Event`] by
//! [`Event::parse`]. Decoding validates the fields needed to route and log
//! the message; the decoded JSON object is retained verbatim so the log
//! sink can re-serialize exactly what the gateway sent.

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::{Map, Value};

use super::DeviceId;
use crate::error::WiretapError;

/// Response types whose events are written to the wiretap log.
pub const RETAINED_RESPONSE_TYPES: [&str; 3] =
    ["RTUUpdateResult", "DeviceEnactResult", "DeviceUpdateResult"];

/// The `response_type` tag of a stream message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ResponseType(String);

impl ResponseType {
    /// Wraps a raw tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Returns the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if events of this type are kept.
    #[must_use]
    pub fn is_retained(&self) -> bool {
        RETAINED_RESPONSE_TYPES.contains(&self.0.as_str())
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One decoded stream message.
///
/// Immutable after construction. The device id is always present; a
/// message without one never becomes an `Event`.
#[derive(Debug, Clone)]
pub struct Event {
    response_type: ResponseType,
    message: String,
    device_id: DeviceId,
    device_addr: Option<String>,
    payload: Value,
    received_at: NaiveDateTime,
}

impl Event {
    /// Decodes a raw stream message received at `received_at`.
    ///
    /// Fields present with the wrong JSON type are treated as missing.
    /// A numeric `data.RTU.id` is accepted and kept in its decimal form.
    ///
    /// # Errors
    ///
    /// - [`WiretapError::DecodeFailure`] if `raw` is not a JSON object.
    /// - [`WiretapError::MissingRequiredField`] naming the first absent
    ///   field among `response_type`, `message`, `data`, `data.RTU`,
    ///   `data.RTU.id`.
    pub fn parse(raw: &str, received_at: NaiveDateTime) -> Result<Self, WiretapError> {
        let payload: Value = serde_json::from_str(raw)?;
        let Value::Object(fields) = &payload else {
            return Err(WiretapError::DecodeFailure(format!(
                "expected a JSON object, got {}",
                json_type_name(&payload)
            )));
        };

        let response_type =
            ResponseType::new(required_str(fields, "response_type", "response_type")?);
        let message = required_str(fields, "message", "message")?.to_string();
        let data = required_object(fields, "data", "data")?;
        let rtu = required_object(data, "RTU", "data.RTU")?;

        let device_id = match rtu.get("id") {
            Some(Value::String(s)) => DeviceId::new(s.as_str()),
            Some(Value::Number(n)) => DeviceId::new(n.to_string()),
            _ => None,
        }
        .ok_or(WiretapError::MissingRequiredField {
            field: "data.RTU.id",
        })?;
        let device_addr = rtu.get("addr").and_then(Value::as_str).map(str::to_string);

        let event = Self {
            response_type,
            message,
            device_id,
            device_addr,
            payload,
            received_at,
        };

        tracing::info!(
            device_id = %event.device_id,
            response_type = %event.response_type,
            "event received"
        );
        Ok(event)
    }

    /// The message kind.
    #[must_use]
    pub fn response_type(&self) -> &ResponseType {
        &self.response_type
    }

    /// Free-text description sent by the gateway.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Identity of the RTU this event concerns.
    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// Network address of the RTU, if the gateway reported one.
    #[must_use]
    pub fn device_addr(&self) -> Option<&str> {
        self.device_addr.as_deref()
    }

    /// The full decoded message, exactly as received.
    #[must_use]
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Local capture time.
    #[must_use]
    pub fn received_at(&self) -> NaiveDateTime {
        self.received_at
    }
}

fn required_str<'a>(
    fields: &'a Map<String, Value>,
    key: &str,
    path: &'static str,
) -> Result<&'a str, WiretapError> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .ok_or(WiretapError::MissingRequiredField { field: path })
}

fn required_object<'a>(
    fields: &'a Map<String, Value>,
    key: &str,
    path: &'static str,
) -> Result<&'a Map<String, Value>, WiretapError> {
    fields
        .get(key)
        .and_then(Value::as_object)
        .ok_or(WiretapError::MissingRequiredField { field: path })
}

const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
