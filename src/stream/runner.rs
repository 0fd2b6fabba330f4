//! Stream runner: composition root for one client session.

use std::future::Future;
use std::sync::Arc;

use crate::config::ClientConfig;
use crate::lifecycle::{CloseOutcome, ShutdownCoordinator, ShutdownReport, ShutdownSignal};
use crate::net::{ConnectError, ConnectionManager};
use crate::notification::NotificationSink;
use crate::stream::receive_loop::run_receive_loop;

/// Connects, runs the receive loop in the background and shuts down cleanly.
pub struct StreamRunner {
    config: ClientConfig,
    sink: Arc<dyn NotificationSink>,
}

impl StreamRunner {
    pub fn new(config: ClientConfig, sink: Arc<dyn NotificationSink>) -> Self {
        Self { config, sink }
    }

    /// Run until the server closes the stream or `interrupt` resolves.
    ///
    /// Only a failed connect is an error; every stream-level condition ends
    /// in a [`ShutdownReport`].
    pub async fn run<F>(self, interrupt: F) -> Result<ShutdownReport, ConnectError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(interrupt);
        let mut manager = ConnectionManager::new(self.config.server.clone());

        let receiver = tokio::select! {
            connected = manager.connect() => connected?,
            () = &mut interrupt => {
                tracing::info!("Interrupted before the stream opened");
                manager.release();
                return Ok(ShutdownReport {
                    trigger: ShutdownSignal::OperatorInterrupt,
                    outcome: CloseOutcome::NeverOpened,
                });
            }
        };

        let receive_loop = tokio::spawn(run_receive_loop(receiver, Arc::clone(&self.sink)));

        let report = ShutdownCoordinator::new(self.config.shutdown.close_timeout())
            .run(&mut manager, receive_loop, &mut interrupt)
            .await;

        tracing::info!(trigger = ?report.trigger, outcome = ?report.outcome, "Stream stopped");
        Ok(report)
    }
}
