//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validate config → Metrics → Connect → Spawn receive loop
//!
//! Shutdown (shutdown.rs):
//!     Loop finished → Release
//!     Interrupt → Close frame → Wait (bounded) for peer → Release
//!
//! Signals (signals.rs):
//!     SIGINT → Trigger graceful shutdown
//!     Second SIGINT → Forced exit
//! ```
//!
//! # Design Decisions
//! - Config errors are reported before any network activity
//! - The close handshake has a deadline: release happens even without an ack

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{CloseOutcome, CoordinatorState, ShutdownCoordinator, ShutdownReport, ShutdownSignal};
pub use startup::{launch, StartupError};
