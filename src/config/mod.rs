//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → loader.rs (optional TOML file)
//!     → cli.rs (flags / environment override file values)
//!     → validation.rs (semantic checks)
//!     → ClientConfig (validated, immutable)
//!     → passed by value to the stream runner
//! ```
//!
//! # Design Decisions
//! - Config is built once at startup; there is no process-wide config state
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cli::{BuildInfo, Cli};
pub use loader::ConfigError;
pub use schema::ClientConfig;
pub use schema::ObservabilityConfig;
pub use schema::ServerConfig;
pub use schema::ShutdownConfig;
pub use schema::{SinkConfig, SinkKind};
pub use validation::{validate_config, ValidationError};
