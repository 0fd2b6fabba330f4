//! Connection state machine and session ownership.
//!
//! # Responsibilities
//! - Track connection state (Disconnected → Connecting → Open → Closing → Closed)
//! - Dial the stream endpoint with the client token
//! - Send the normal-closure close frame on request
//! - Flush the reply to a close started by the server
//! - Release the transport exactly once, on every exit path
//!
//! # State Transitions
//! ```text
//! Disconnected → Connecting      dial starts
//! Connecting   → Open            handshake succeeded
//! Connecting   → Closed          dial failed
//! Open         → ClosingLocal    close frame sent
//! ClosingLocal → ClosingPeerAck  receive loop ended after our close frame
//! any          → Closed          release
//! ```

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{self, Message, Utf8Bytes};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::config::ServerConfig;
use crate::net::endpoint::{stream_request, stream_url};
use crate::net::receiver::FrameReceiver;
use crate::observability::metrics;

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Global atomic counter for session IDs.
static SESSION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identifier for one stream session, used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    fn next() -> Self {
        Self(SESSION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Connection state for lifecycle tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No dial attempted yet.
    Disconnected,
    /// Dial and upgrade handshake in progress.
    Connecting,
    /// Session established; frames are flowing.
    Open,
    /// We sent a close frame and are waiting for the peer.
    ClosingLocal,
    /// The peer answered our close frame.
    ClosingPeerAck,
    /// Transport released.
    Closed,
}

impl ConnectionState {
    /// Whether `self → next` is a legal transition.
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Disconnected, Connecting)
                | (Connecting, Open)
                | (Connecting, Closed)
                | (Open, ClosingLocal)
                | (ClosingLocal, ClosingPeerAck)
                | (_, Closed)
        )
    }

    /// Numeric form for the state gauge.
    pub fn as_gauge(self) -> f64 {
        match self {
            ConnectionState::Disconnected => 0.0,
            ConnectionState::Connecting => 1.0,
            ConnectionState::Open => 2.0,
            ConnectionState::ClosingLocal => 3.0,
            ConnectionState::ClosingPeerAck => 4.0,
            ConnectionState::Closed => 5.0,
        }
    }
}

/// Errors establishing the stream session. All are fatal; there is no retry.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("invalid server host '{host}': {reason}")]
    InvalidUrl { host: String, reason: String },

    #[error("client token contains characters not allowed in an HTTP header")]
    InvalidToken,

    #[error("server rejected the stream upgrade with HTTP {0}")]
    Rejected(u16),

    #[error("websocket handshake failed: {0}")]
    Handshake(tungstenite::Error),

    #[error("connection timed out after {0} seconds")]
    Timeout(u64),

    #[error("connection already attempted (state {0:?})")]
    AlreadyConnected(ConnectionState),
}

impl From<tungstenite::Error> for ConnectError {
    fn from(err: tungstenite::Error) -> Self {
        match err {
            tungstenite::Error::Http(response) => ConnectError::Rejected(response.status().as_u16()),
            other => ConnectError::Handshake(other),
        }
    }
}

/// Errors sending the close frame.
#[derive(Debug, Error)]
pub enum CloseError {
    #[error("cannot close a connection in state {0:?}")]
    NotOpen(ConnectionState),

    #[error("failed to send close frame: {0}")]
    Send(#[from] tungstenite::Error),

    #[error("close frame not written within {0} ms")]
    Timeout(u64),
}

/// Owns the single stream session and its send half.
///
/// The receive half is handed out by [`connect`](Self::connect) and lives in
/// the receive loop. The TCP socket closes once both halves are dropped.
pub struct ConnectionManager {
    server: ServerConfig,
    state: ConnectionState,
    session: Option<SessionId>,
    writer: Option<SplitSink<WsStream, Message>>,
}

impl ConnectionManager {
    pub fn new(server: ServerConfig) -> Self {
        Self {
            server,
            state: ConnectionState::Disconnected,
            session: None,
            writer: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn session(&self) -> Option<SessionId> {
        self.session
    }

    /// Dial the stream endpoint and return the receive half of the session.
    pub async fn connect(&mut self) -> Result<FrameReceiver, ConnectError> {
        if self.state != ConnectionState::Disconnected {
            return Err(ConnectError::AlreadyConnected(self.state));
        }
        self.transition(ConnectionState::Connecting);

        match self.dial().await {
            Ok(ws) => {
                let session = SessionId::next();
                let (writer, reader) = ws.split();
                self.writer = Some(writer);
                self.session = Some(session);
                self.transition(ConnectionState::Open);
                tracing::info!(session = %session, host = %self.server.host, "Websocket connected");
                Ok(FrameReceiver::new(session, reader))
            }
            Err(e) => {
                self.transition(ConnectionState::Closed);
                Err(e)
            }
        }
    }

    async fn dial(&self) -> Result<WsStream, ConnectError> {
        let url = stream_url(&self.server.host)?;
        let request = stream_request(&url, &self.server.token)?;
        let timeout = self.server.connect_timeout();

        tracing::info!(url = %url, "Websocket connecting");

        match tokio::time::timeout(timeout, tokio_tungstenite::connect_async(request)).await {
            Ok(Ok((ws, response))) => {
                tracing::debug!(status = %response.status(), "Upgrade accepted");
                Ok(ws)
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(ConnectError::Timeout(self.server.connect_timeout_secs)),
        }
    }

    /// Send a normal-closure close frame, giving up after `limit`.
    pub async fn initiate_close(&mut self, limit: Duration) -> Result<(), CloseError> {
        if self.state != ConnectionState::Open {
            return Err(CloseError::NotOpen(self.state));
        }
        let writer = self
            .writer
            .as_mut()
            .ok_or(CloseError::NotOpen(self.state))?;

        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: Utf8Bytes::from_static(""),
        };
        match tokio::time::timeout(limit, writer.send(Message::Close(Some(frame)))).await {
            Ok(sent) => sent?,
            Err(_) => return Err(CloseError::Timeout(limit.as_millis() as u64)),
        }

        self.transition(ConnectionState::ClosingLocal);
        tracing::debug!(session = ?self.session, "Close frame sent");
        Ok(())
    }

    /// Flush the reply to a close frame the peer sent, giving up after `limit`.
    ///
    /// The reply is queued by the read half but only reaches the wire on the
    /// next write, so it must be pushed out before the transport is released.
    pub async fn complete_close(&mut self, limit: Duration) -> Result<(), CloseError> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        match tokio::time::timeout(limit, writer.close()).await {
            Ok(Ok(())) | Ok(Err(tungstenite::Error::ConnectionClosed)) => {
                tracing::debug!(session = ?self.session, "Close reply flushed");
                Ok(())
            }
            Ok(Err(e)) => Err(CloseError::Send(e)),
            Err(_) => Err(CloseError::Timeout(limit.as_millis() as u64)),
        }
    }

    /// Record that the receive loop ended after our close frame.
    pub fn acknowledge_close(&mut self) {
        if self.state == ConnectionState::ClosingLocal {
            self.transition(ConnectionState::ClosingPeerAck);
        }
    }

    /// Drop the send half and mark the connection closed. Idempotent.
    pub fn release(&mut self) {
        if self.state == ConnectionState::Closed && self.writer.is_none() {
            return;
        }
        if self.writer.take().is_some() {
            tracing::debug!(session = ?self.session, "Transport released");
        }
        self.transition(ConnectionState::Closed);
    }

    fn transition(&mut self, next: ConnectionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {:?} -> {:?}",
            self.state,
            next
        );
        tracing::debug!(from = ?self.state, to = ?next, "Connection state changed");
        self.state = next;
        metrics::record_connection_state(next);
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("server", &self.server)
            .field("state", &self.state)
            .field("session", &self.session)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tokio::net::TcpListener;

    fn server_config(host: String) -> ServerConfig {
        ServerConfig {
            host,
            token: "test-token".to_string(),
            connect_timeout_secs: 2,
        }
    }

    /// An address nothing is listening on.
    async fn dead_address() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        addr.to_string()
    }

    #[test]
    fn test_legal_transitions() {
        use ConnectionState::*;
        assert!(Disconnected.can_transition_to(Connecting));
        assert!(Connecting.can_transition_to(Open));
        assert!(Open.can_transition_to(ClosingLocal));
        assert!(ClosingLocal.can_transition_to(ClosingPeerAck));
        for state in [Disconnected, Connecting, Open, ClosingLocal, ClosingPeerAck, Closed] {
            assert!(state.can_transition_to(Closed));
        }

        assert!(!Disconnected.can_transition_to(Open));
        assert!(!Open.can_transition_to(ClosingPeerAck));
        assert!(!Closed.can_transition_to(Open));
        assert!(!ClosingLocal.can_transition_to(Open));
    }

    #[test]
    fn test_session_id_unique() {
        assert_ne!(SessionId::next(), SessionId::next());
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut manager = ConnectionManager::new(server_config("localhost:1".to_string()));
        assert_eq!(manager.state(), ConnectionState::Disconnected);

        manager.release();
        assert_eq!(manager.state(), ConnectionState::Closed);
        manager.release();
        manager.release();
        assert_eq!(manager.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_dial_failure_closes() {
        let mut manager = ConnectionManager::new(server_config(dead_address().await));
        let result = manager.connect().await;
        assert!(matches!(result, Err(ConnectError::Handshake(_))));
        assert_eq!(manager.state(), ConnectionState::Closed);

        let again = manager.connect().await;
        assert!(matches!(again, Err(ConnectError::AlreadyConnected(ConnectionState::Closed))));
    }

    #[tokio::test]
    async fn test_invalid_host_fails_before_dial() {
        let mut manager = ConnectionManager::new(server_config("bad host/with/path".to_string()));
        assert!(matches!(manager.connect().await, Err(ConnectError::InvalidUrl { .. })));
        assert_eq!(manager.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_close_requires_open() {
        let mut manager = ConnectionManager::new(server_config("localhost:1".to_string()));
        let err = manager.initiate_close(Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, CloseError::NotOpen(ConnectionState::Disconnected)));
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_close_send_is_bounded_when_peer_stops_reading() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (hold_tx, hold_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let ws = tokio_tungstenite::accept_async(socket).await.unwrap();
            // Keep the socket open but never read from it.
            let _ = hold_rx.await;
            drop(ws);
        });

        let mut manager = ConnectionManager::new(server_config(addr.to_string()));
        let _receiver = manager.connect().await.unwrap();

        // Fill the socket buffers until a write stalls.
        let chunk = vec![0u8; 1 << 20];
        let writer = manager.writer.as_mut().unwrap();
        let mut stalled = false;
        for _ in 0..256 {
            let send = writer.send(Message::Binary(chunk.clone().into()));
            if tokio::time::timeout(Duration::from_millis(200), send).await.is_err() {
                stalled = true;
                break;
            }
        }
        assert!(stalled, "socket buffers never filled");

        let started = Instant::now();
        let result = manager.initiate_close(Duration::from_millis(200)).await;
        assert!(matches!(result, Err(CloseError::Timeout(200))));
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(manager.state(), ConnectionState::Open);

        manager.release();
        let _ = hold_tx.send(());
    }

    #[tokio::test]
    async fn test_complete_close_without_session_is_noop() {
        let mut manager = ConnectionManager::new(server_config("localhost:1".to_string()));
        assert!(manager.complete_close(Duration::from_millis(10)).await.is_ok());
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_rejected_status_mapping() {
        let response = tokio_tungstenite::tungstenite::http::Response::builder()
            .status(401)
            .body(None::<Vec<u8>>)
            .unwrap();
        let err = ConnectError::from(tungstenite::Error::Http(response.into()));
        assert!(matches!(err, ConnectError::Rejected(401)));
    }

    #[test]
    fn test_debug_hides_token() {
        let manager = ConnectionManager::new(server_config("localhost:1".to_string()));
        assert!(!format!("{:?}", manager).contains("test-token"));
    }
}
