//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gotify_frames_received_total` (counter): data frames read off the stream
//! - `gotify_decode_failures_total` (counter): frames dropped as malformed
//! - `gotify_notifications_delivered_total` (counter): successful sink calls
//! - `gotify_sink_failures_total` (counter): failed sink calls
//! - `gotify_connection_state` (gauge): see `ConnectionState::as_gauge`
//!
//! Without an installed recorder every call here is a no-op.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

use crate::net::ConnectionState;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_frame_received() {
    counter!("gotify_frames_received_total").increment(1);
}

pub fn record_decode_failure() {
    counter!("gotify_decode_failures_total").increment(1);
}

pub fn record_delivery(success: bool) {
    if success {
        counter!("gotify_notifications_delivered_total").increment(1);
    } else {
        counter!("gotify_sink_failures_total").increment(1);
    }
}

pub fn record_connection_state(state: ConnectionState) {
    gauge!("gotify_connection_state").set(state.as_gauge());
}
