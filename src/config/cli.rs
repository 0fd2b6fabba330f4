//! Command-line flags and build metadata.

use clap::Parser;
use std::path::PathBuf;

use crate::config::loader::{read_config, ConfigError};
use crate::config::schema::{ClientConfig, SinkKind};

/// Version information baked in at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: &'static str,
    pub build_time: &'static str,
    pub commit: &'static str,
}

impl BuildInfo {
    /// Metadata for the running binary.
    pub const fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            build_time: match option_env!("GOTIFY_NOTIFY_BUILD_TIME") {
                Some(t) => t,
                None => "unknown",
            },
            commit: match option_env!("GOTIFY_NOTIFY_COMMIT") {
                Some(c) => c,
                None => "unknown",
            },
        }
    }

    /// Three-line version banner.
    pub fn banner(&self) -> String {
        format!(
            "gotify-notify version {}\nBuilt: {}\nCommit: {}",
            self.version, self.build_time, self.commit
        )
    }
}

#[derive(Debug, Parser)]
#[command(name = "gotify-notify")]
#[command(about = "Forward Gotify push messages to desktop notifications", long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Gotify server address
    #[arg(long, env = "GOTIFY_HOST")]
    pub host: Option<String>,

    /// Client token obtained from Gotify
    #[arg(long, env = "GOTIFY_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Notification sink (desktop, log)
    #[arg(long)]
    pub sink: Option<SinkKind>,

    /// Show version information
    #[arg(short = 'V', long)]
    pub version: bool,
}

impl Cli {
    /// Build the effective configuration: defaults, then file, then flags.
    ///
    /// The result is not validated.
    pub fn resolve(&self) -> Result<ClientConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => ClientConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut ClientConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(token) = &self.token {
            config.server.token = token.clone();
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
        if let Some(kind) = self.sink {
            config.sink.kind = kind;
        }
    }
}
