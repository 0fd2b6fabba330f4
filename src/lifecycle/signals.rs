//! OS signal handling.
//!
//! # Responsibilities
//! - Turn the first Ctrl-C / SIGINT into a graceful shutdown request
//! - Force exit on a second interrupt while the close handshake is pending
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - If the handler cannot be installed, the interrupt never fires and the
//!   client runs until the server closes the stream

/// Exit status used when a second interrupt forces termination.
pub const FORCED_EXIT_CODE: i32 = 130;

/// Resolve on the first operator interrupt.
pub async fn interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");

    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Second interrupt, exiting immediately");
            std::process::exit(FORCED_EXIT_CODE);
        }
    });
}
