//! Stream subsystem.
//!
//! # Data Flow
//! ```text
//! runner.rs
//!     → ConnectionManager::connect (fatal on failure)
//!     → spawn receive_loop.rs (receive → decode → deliver, repeated)
//!     → ShutdownCoordinator::run (loop finished | interrupt)
//! ```

pub mod receive_loop;
pub mod runner;

pub use receive_loop::run_receive_loop;
pub use runner::StreamRunner;
