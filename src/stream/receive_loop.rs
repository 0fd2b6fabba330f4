//! Background receive loop.
//!
//! read → decode → deliver, until the stream ends. Decode and delivery
//! failures are logged and skipped; only read errors stop the loop.

use std::sync::Arc;

use crate::lifecycle::ShutdownSignal;
use crate::net::{FrameReceiver, ReadError};
use crate::notification::{decode, NotificationEvent, NotificationSink, SinkError};
use crate::observability::metrics;

/// Drain the stream into `sink`. Returns why the loop stopped.
pub async fn run_receive_loop(
    mut receiver: FrameReceiver,
    sink: Arc<dyn NotificationSink>,
) -> ShutdownSignal {
    let session = receiver.session();

    loop {
        let frame = match receiver.receive().await {
            Ok(frame) => frame,
            Err(ReadError::PeerClosed { code }) => {
                tracing::info!(session = %session, code = ?code, "Websocket: peer closed");
                return ShutdownSignal::PeerClosed;
            }
            Err(e) => {
                tracing::warn!(session = %session, error = %e, "Websocket: read error");
                return ShutdownSignal::LocalReadError;
            }
        };
        metrics::record_frame_received();

        let event = match decode(frame.as_bytes()) {
            Ok(event) => event,
            Err(e) => {
                metrics::record_decode_failure();
                tracing::warn!(session = %session, bytes = frame.len(), error = %e, "Dropping malformed frame");
                continue;
            }
        };

        tracing::debug!(
            session = %session,
            id = event.id,
            app_id = event.app_id,
            priority = event.priority,
            "Notification received"
        );
        deliver(&sink, event).await;
    }
}

/// Hand one event to the sink on the blocking pool.
async fn deliver(sink: &Arc<dyn NotificationSink>, event: NotificationEvent) {
    let sink = Arc::clone(sink);
    let id = event.id;

    let result = tokio::task::spawn_blocking(move || sink.deliver(&event.title, &event.message))
        .await
        .unwrap_or_else(|e| Err(SinkError::Task(e.to_string())));

    match result {
        Ok(()) => metrics::record_delivery(true),
        Err(e) => {
            metrics::record_delivery(false);
            tracing::warn!(id, error = %e, "Failed to send notification");
        }
    }
}
