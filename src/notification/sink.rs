//! Notification sinks.
//!
//! A sink turns a decoded message into something the user sees. Failures are
//! reported to the caller, which logs them; they never affect the stream.

use std::sync::Arc;

use crate::config::{SinkConfig, SinkKind};
use crate::notification::types::SinkError;

/// Destination for decoded notifications.
pub trait NotificationSink: Send + Sync {
    /// Show one notification. May block on the platform service.
    fn deliver(&self, title: &str, body: &str) -> Result<(), SinkError>;
}

/// OS desktop notifications via `notify-rust`.
#[derive(Debug, Clone)]
pub struct DesktopSink {
    app_name: String,
}

impl DesktopSink {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

impl NotificationSink for DesktopSink {
    fn deliver(&self, title: &str, body: &str) -> Result<(), SinkError> {
        notify_rust::Notification::new()
            .appname(&self.app_name)
            .summary(title)
            .body(body)
            .show()
            .map(|_| ())
            .map_err(|e| SinkError::Delivery(e.to_string()))
    }
}

/// Writes notifications to the log instead of the desktop.
#[derive(Debug, Clone, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn deliver(&self, title: &str, body: &str) -> Result<(), SinkError> {
        tracing::info!(title = %title, body = %body, "Notification");
        Ok(())
    }
}

/// Create the sink selected by configuration.
pub fn build_sink(config: &SinkConfig) -> Arc<dyn NotificationSink> {
    match config.kind {
        SinkKind::Desktop => Arc::new(DesktopSink::new(config.app_name.clone())),
        SinkKind::Log => Arc::new(LogSink),
    }
}
