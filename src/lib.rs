//! Gotify desktop notification client library.

pub mod config;
pub mod lifecycle;
pub mod net;
pub mod notification;
pub mod observability;
pub mod stream;

pub use config::ClientConfig;
pub use lifecycle::{launch, ShutdownReport, ShutdownSignal};
pub use stream::StreamRunner;
