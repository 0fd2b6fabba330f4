//! Shared utilities for integration testing: a scriptable Gotify stream server.

#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message;

use gotify_notify::config::{ClientConfig, SinkKind};
use gotify_notify::notification::{NotificationSink, SinkError};

/// How the mock server treats each accepted stream.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Push the frames, then close the stream and wait for the client's reply.
    SendThenClose(Vec<String>),
    /// Push the frames, then wait; answers a client close frame.
    SendThenIdle(Vec<String>),
    /// Complete the upgrade, then never write again. Client close frames are
    /// counted off the raw socket and never answered.
    Unresponsive,
    /// Refuse the upgrade with this HTTP status.
    Reject(u16),
}

/// What the mock server observed.
#[derive(Debug, Default)]
pub struct Observed {
    pub accepted: AtomicUsize,
    pub close_frames: AtomicUsize,
    pub transport_errors: AtomicUsize,
    pub client_hung_up: AtomicBool,
    pub token: Mutex<Option<String>>,
    pub path: Mutex<Option<String>>,
}

pub struct MockGotify {
    pub addr: SocketAddr,
    pub observed: Arc<Observed>,
}

impl MockGotify {
    pub fn host(&self) -> String {
        self.addr.to_string()
    }

    pub fn close_frames(&self) -> usize {
        self.observed.close_frames.load(Ordering::SeqCst)
    }

    /// Reads that failed instead of ending cleanly, e.g. a reset before the
    /// close handshake completed.
    pub fn transport_errors(&self) -> usize {
        self.observed.transport_errors.load(Ordering::SeqCst)
    }

    pub fn accepted(&self) -> usize {
        self.observed.accepted.load(Ordering::SeqCst)
    }

    pub fn token(&self) -> Option<String> {
        self.observed.token.lock().unwrap().clone()
    }

    pub fn path(&self) -> Option<String> {
        self.observed.path.lock().unwrap().clone()
    }

    /// Wait up to `limit` for the client to drop its socket.
    pub async fn wait_for_hangup(&self, limit: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + limit;
        while tokio::time::Instant::now() < deadline {
            if self.observed.client_hung_up.load(Ordering::SeqCst) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

/// Start a mock Gotify server on an ephemeral port.
pub async fn start_mock_gotify(behavior: Behavior) -> MockGotify {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let observed = Arc::new(Observed::default());

    let obs = observed.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            obs.accepted.fetch_add(1, Ordering::SeqCst);
            let obs = obs.clone();
            let behavior = behavior.clone();
            tokio::spawn(async move {
                serve(socket, behavior, obs).await;
            });
        }
    });

    MockGotify { addr, observed }
}

async fn serve(socket: TcpStream, behavior: Behavior, obs: Arc<Observed>) {
    let reject = match behavior {
        Behavior::Reject(status) => Some(status),
        _ => None,
    };

    let seen = obs.clone();
    let callback = move |req: &Request, response: Response| -> Result<Response, ErrorResponse> {
        let token = req
            .headers()
            .get("x-gotify-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        *seen.token.lock().unwrap() = token;
        *seen.path.lock().unwrap() = Some(req.uri().path().to_string());

        match reject {
            Some(status) => {
                let mut error = ErrorResponse::new(Some("unauthorized".to_string()));
                *error.status_mut() = StatusCode::from_u16(status).unwrap();
                Err(error)
            }
            None => Ok(response),
        }
    };

    let mut ws = match tokio_tungstenite::accept_hdr_async(socket, callback).await {
        Ok(ws) => ws,
        Err(_) => return,
    };

    match behavior {
        Behavior::SendThenClose(frames) => {
            for frame in frames {
                if ws.send(Message::Text(frame.into())).await.is_err() {
                    return;
                }
            }
            let _ = ws.close(None).await;
            // Drain until the client's close reply arrives.
            while let Some(message) = ws.next().await {
                match message {
                    Ok(Message::Close(_)) => {
                        obs.close_frames.fetch_add(1, Ordering::SeqCst);
                    }
                    Ok(_) => {}
                    Err(_) => {
                        obs.transport_errors.fetch_add(1, Ordering::SeqCst);
                        break;
                    }
                }
            }
            obs.client_hung_up.store(true, Ordering::SeqCst);
        }
        Behavior::SendThenIdle(frames) => {
            for frame in frames {
                if ws.send(Message::Text(frame.into())).await.is_err() {
                    return;
                }
            }
            while let Some(message) = ws.next().await {
                match message {
                    Ok(Message::Close(_)) => {
                        obs.close_frames.fetch_add(1, Ordering::SeqCst);
                        let _ = ws.close(None).await;
                    }
                    Ok(_) => {}
                    Err(_) => break,
                }
            }
            obs.client_hung_up.store(true, Ordering::SeqCst);
        }
        Behavior::Unresponsive => {
            count_raw_close_frames(ws.get_mut(), &obs).await;
            obs.client_hung_up.store(true, Ordering::SeqCst);
        }
        Behavior::Reject(_) => {}
    }
}

/// Parse client frames straight off the socket so nothing is ever answered.
async fn count_raw_close_frames(socket: &mut TcpStream, obs: &Observed) {
    loop {
        let mut header = [0u8; 2];
        if socket.read_exact(&mut header).await.is_err() {
            return;
        }
        let opcode = header[0] & 0x0f;
        let masked = header[1] & 0x80 != 0;
        let mut len = u64::from(header[1] & 0x7f);
        if len == 126 {
            let mut ext = [0u8; 2];
            if socket.read_exact(&mut ext).await.is_err() {
                return;
            }
            len = u64::from(u16::from_be_bytes(ext));
        } else if len == 127 {
            let mut ext = [0u8; 8];
            if socket.read_exact(&mut ext).await.is_err() {
                return;
            }
            len = u64::from_be_bytes(ext);
        }
        let skip = len + if masked { 4 } else { 0 };
        let mut rest = vec![0u8; skip as usize];
        if socket.read_exact(&mut rest).await.is_err() {
            return;
        }
        if opcode == 0x8 {
            obs.close_frames.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Sink that records every delivery.
#[derive(Debug, Default)]
pub struct RecordingSink {
    delivered: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingSink {
    /// A sink that records calls but reports every one as failed.
    pub fn failing() -> Self {
        Self {
            delivered: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn delivered(&self) -> Vec<(String, String)> {
        self.delivered.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn deliver(&self, title: &str, body: &str) -> Result<(), SinkError> {
        self.delivered
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
        if self.fail {
            Err(SinkError::Delivery("notification service unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Client configuration pointing at `server`.
pub fn client_config(server: &MockGotify, close_timeout_ms: u64) -> ClientConfig {
    let mut config = ClientConfig::default();
    config.server.host = server.host();
    config.server.token = "test-client-token".to_string();
    config.server.connect_timeout_secs = 5;
    config.shutdown.close_timeout_ms = close_timeout_ms;
    config.sink.kind = SinkKind::Log;
    config
}

/// JSON for one Gotify message.
pub fn message_json(id: i64, title: &str, message: &str) -> String {
    serde_json::json!({
        "appid": 1,
        "date": "2024-01-01T00:00:00Z",
        "id": id,
        "message": message,
        "priority": 5,
        "title": title,
    })
    .to_string()
}
