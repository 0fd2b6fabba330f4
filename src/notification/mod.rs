//! Notification subsystem.
//!
//! # Data Flow
//! ```text
//! raw frame bytes
//!     → decoder.rs (JSON → NotificationEvent, errors are values)
//!     → sink.rs (desktop notification or log line)
//! ```
//!
//! # Design Decisions
//! - Decoding is pure and permissive: unknown fields ignored, missing fields zeroed
//! - Sinks are synchronous; the caller decides where they run

pub mod decoder;
pub mod sink;
pub mod types;

pub use decoder::{decode, encode};
pub use sink::{build_sink, DesktopSink, LogSink, NotificationSink};
pub use types::{DecodeError, NotificationEvent, SinkError};
