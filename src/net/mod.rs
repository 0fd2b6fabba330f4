//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ServerConfig { host, token }
//!     → endpoint.rs (ws://<host>/stream + X-Gotify-Key header)
//!     → connection.rs (dial, state machine, send half, close, release)
//!     → receiver.rs (receive half, one data frame per call)
//!
//! Connection States:
//!     Disconnected → Connecting → Open → ClosingLocal → ClosingPeerAck → Closed
//! ```
//!
//! # Design Decisions
//! - Exactly one session per manager; a failed dial is final
//! - The socket is split so the receive loop never contends with the close frame
//! - Release is idempotent and also runs on drop

pub mod connection;
pub mod endpoint;
pub mod receiver;

pub use connection::{CloseError, ConnectError, ConnectionManager, ConnectionState, SessionId};
pub use receiver::{FrameReceiver, RawFrame, ReadError};
