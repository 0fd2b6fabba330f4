//! Shutdown coordination for the stream client.
//!
//! # States
//! ```text
//! Running → Done                   receive loop ended on its own
//! Running → ClosingLocal → Done    operator interrupt: close frame, bounded wait
//! ```
//!
//! `Done` always releases the transport. The coordinator is consumed by
//! [`ShutdownCoordinator::run`], so it cannot be driven twice.

use std::future::Future;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};

use crate::net::ConnectionManager;

/// Why the client is shutting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// The server closed the stream.
    PeerClosed,
    /// Reading from the stream failed.
    LocalReadError,
    /// The operator asked us to stop.
    OperatorInterrupt,
}

/// Coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Running,
    ClosingLocal,
    Done,
}

/// How the close sequence ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The loop stopped by itself; nothing was sent.
    LoopFinished,
    /// We sent a close frame and the loop stopped before the deadline.
    Acknowledged,
    /// We sent a close frame and gave up waiting.
    DeadlineElapsed,
    /// The close frame could not be sent.
    CloseSendFailed,
    /// Interrupted while still dialing; there was no session to close.
    NeverOpened,
}

/// Result of a completed shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    pub trigger: ShutdownSignal,
    pub outcome: CloseOutcome,
}

/// Arbitrates between loop completion and operator interrupt.
#[derive(Debug)]
pub struct ShutdownCoordinator {
    state: CoordinatorState,
    close_timeout: Duration,
}

impl ShutdownCoordinator {
    pub fn new(close_timeout: Duration) -> Self {
        Self {
            state: CoordinatorState::Running,
            close_timeout,
        }
    }

    /// Wait for the receive loop or `interrupt`, then close and release.
    pub async fn run<F>(
        mut self,
        manager: &mut ConnectionManager,
        mut receive_loop: JoinHandle<ShutdownSignal>,
        interrupt: F,
    ) -> ShutdownReport
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(interrupt);

        let finished = tokio::select! {
            biased;
            joined = &mut receive_loop => Some(loop_signal(joined)),
            () = &mut interrupt => None,
        };

        if let Some(signal) = finished {
            tracing::info!(signal = ?signal, "Receive loop finished");
            if let Err(e) = manager.complete_close(self.close_timeout).await {
                tracing::warn!(error = %e, "Websocket: close reply not sent");
            }
            return self.finish(manager, signal, CloseOutcome::LoopFinished);
        }

        tracing::info!("Interrupted");
        self.transition(CoordinatorState::ClosingLocal);

        let outcome = match manager.initiate_close(self.close_timeout).await {
            Err(e) => {
                tracing::error!(error = %e, "Websocket: write close failed");
                CloseOutcome::CloseSendFailed
            }
            Ok(()) => match tokio::time::timeout(self.close_timeout, &mut receive_loop).await {
                Ok(joined) => {
                    let signal = loop_signal(joined);
                    tracing::debug!(signal = ?signal, "Close acknowledged");
                    manager.acknowledge_close();
                    CloseOutcome::Acknowledged
                }
                Err(_) => {
                    tracing::warn!(
                        timeout_ms = self.close_timeout.as_millis() as u64,
                        "Close not acknowledged before deadline"
                    );
                    CloseOutcome::DeadlineElapsed
                }
            },
        };

        if outcome != CloseOutcome::Acknowledged {
            // The handle has not yielded yet, so awaiting it after abort is sound.
            receive_loop.abort();
            let _ = receive_loop.await;
        }

        self.finish(manager, ShutdownSignal::OperatorInterrupt, outcome)
    }

    fn finish(
        mut self,
        manager: &mut ConnectionManager,
        trigger: ShutdownSignal,
        outcome: CloseOutcome,
    ) -> ShutdownReport {
        self.transition(CoordinatorState::Done);
        manager.release();
        ShutdownReport { trigger, outcome }
    }

    fn transition(&mut self, next: CoordinatorState) {
        tracing::debug!(from = ?self.state, to = ?next, "Shutdown state changed");
        self.state = next;
    }
}

fn loop_signal(joined: Result<ShutdownSignal, JoinError>) -> ShutdownSignal {
    joined.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Receive loop task failed");
        ShutdownSignal::LocalReadError
    })
}
