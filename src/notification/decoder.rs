//! Frame decoding.
//!
//! Pure functions mapping raw frame payloads to [`NotificationEvent`]s.
//! A bad payload is an error value, never a panic: one malformed frame must
//! not take down a long-lived client.

use serde_json::Value;

use crate::notification::types::{DecodeError, NotificationEvent};

/// Decode one inbound frame payload.
pub fn decode(payload: &[u8]) -> Result<NotificationEvent, DecodeError> {
    let value: Value = serde_json::from_slice(payload)?;
    let kind = match &value {
        Value::Object(_) => None,
        Value::Null => Some("null"),
        Value::Bool(_) => Some("boolean"),
        Value::Number(_) => Some("number"),
        Value::String(_) => Some("string"),
        Value::Array(_) => Some("array"),
    };
    if let Some(kind) = kind {
        return Err(DecodeError::NotAnObject(kind));
    }
    Ok(serde_json::from_value(value)?)
}

/// Encode an event in the wire format. Inverse of [`decode`].
pub fn encode(event: &NotificationEvent) -> Vec<u8> {
    // Serializing a struct of plain strings and integers cannot fail.
    serde_json::to_vec(event).unwrap_or_default()
}
