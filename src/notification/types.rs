//! Notification event types and error definitions.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// A single Gotify message as pushed over the stream.
///
/// Missing and `null` fields decode to their zero value; unknown fields are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationEvent {
    /// Application that published the message.
    #[serde(rename = "appid", deserialize_with = "null_as_zero")]
    pub app_id: i64,
    /// Server-side timestamp, kept verbatim.
    #[serde(deserialize_with = "null_as_zero")]
    pub date: String,
    #[serde(deserialize_with = "null_as_zero")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_zero")]
    pub message: String,
    #[serde(deserialize_with = "null_as_zero")]
    pub priority: i64,
    #[serde(deserialize_with = "null_as_zero")]
    pub title: String,
}

fn null_as_zero<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Errors produced when an inbound frame cannot be turned into an event.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Payload is not valid JSON or a field has the wrong type.
    #[error("malformed notification payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Payload is valid JSON but not an object.
    #[error("notification payload is a JSON {0}, expected an object")]
    NotAnObject(&'static str),
}

/// Errors reported by a notification sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The platform notification service rejected or failed the call.
    #[error("notification delivery failed: {0}")]
    Delivery(String),

    /// The delivery task panicked or was cancelled.
    #[error("notification task failed: {0}")]
    Task(String),
}
