//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration before any network activity
//! - Start the optional metrics endpoint
//! - Build the sink and hand everything to the stream runner
//!
//! # Design Decisions
//! - Fail fast: config and connect errors are fatal and map to exit codes
//! - Stream-level conditions never escalate past the runner

use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{validate_config, ClientConfig, ValidationError};
use crate::lifecycle::ShutdownReport;
use crate::net::ConnectError;
use crate::notification::NotificationSink;
use crate::observability::metrics;
use crate::stream::StreamRunner;

/// Errors that end the process with a non-zero status.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Config(Vec<ValidationError>),

    #[error("Websocket: failed to connect: {0}")]
    Connect(#[from] ConnectError),
}

impl StartupError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            StartupError::Config(_) => ExitCode::from(2),
            StartupError::Connect(_) => ExitCode::from(1),
        }
    }
}

/// Validate `config`, then run the client until shutdown.
pub async fn launch<F>(
    config: ClientConfig,
    sink: Arc<dyn NotificationSink>,
    interrupt: F,
) -> Result<ShutdownReport, StartupError>
where
    F: Future<Output = ()>,
{
    validate_config(&config).map_err(StartupError::Config)?;

    tracing::info!(
        host = %config.server.host,
        sink = ?config.sink.kind,
        close_timeout_ms = config.shutdown.close_timeout_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let report = StreamRunner::new(config, sink).run(interrupt).await?;
    Ok(report)
}
