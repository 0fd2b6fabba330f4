//! Gotify Desktop Notifier
//!
//! Holds one WebSocket stream to a Gotify server and turns every pushed
//! message into a desktop notification.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────────┐
//!                       │                  GOTIFY-NOTIFY                   │
//!                       │                                                  │
//!   ws://host/stream    │  ┌────────────┐   ┌──────────────┐   ┌────────┐  │
//!   ────────────────────┼─▶│    net     │──▶│ notification │──▶│  sink  │──┼──▶ Desktop
//!   X-Gotify-Key        │  │ connection │   │   decoder    │   │        │  │
//!                       │  └─────▲──────┘   └──────────────┘   └────────┘  │
//!                       │        │ close / release                         │
//!                       │  ┌─────┴──────────────────────────────────────┐  │
//!   SIGINT ─────────────┼─▶│      lifecycle: shutdown coordinator       │  │
//!                       │  └────────────────────────────────────────────┘  │
//!                       │  ┌──────────┐ ┌───────────────┐                  │
//!                       │  │  config  │ │ observability │                  │
//!                       │  └──────────┘ └───────────────┘                  │
//!                       └──────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::process::ExitCode;

use gotify_notify::config::{BuildInfo, Cli};
use gotify_notify::lifecycle::{launch, signals};
use gotify_notify::notification::build_sink;
use gotify_notify::observability::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.version {
        println!("{}", BuildInfo::current().banner());
        return ExitCode::SUCCESS;
    }

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(2);
        }
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!(version = BuildInfo::current().version, "gotify-notify starting");

    let sink = build_sink(&config.sink);
    match launch(config, sink, signals::interrupt()).await {
        Ok(_) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            e.exit_code()
        }
    }
}
