//! Receive half of the stream session.

use futures_util::stream::SplitStream;
use futures_util::StreamExt;
use thiserror::Error;
use tokio_tungstenite::tungstenite::{self, Message};

use crate::net::connection::{SessionId, WsStream};

/// Payload of one data frame, not yet decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame(Vec<u8>);

impl RawFrame {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for RawFrame {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Conditions that end the receive loop.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The peer sent a close frame or the stream ended.
    #[error("peer closed the stream (code {code:?})")]
    PeerClosed { code: Option<u16> },

    /// The transport failed underneath us.
    #[error("websocket read failed: {0}")]
    Transport(#[from] tungstenite::Error),
}

/// Blocking reader over the receive half of a session.
pub struct FrameReceiver {
    session: SessionId,
    reader: SplitStream<WsStream>,
}

impl FrameReceiver {
    pub(crate) fn new(session: SessionId, reader: SplitStream<WsStream>) -> Self {
        Self { session, reader }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Wait for the next data frame. Control frames are skipped.
    pub async fn receive(&mut self) -> Result<RawFrame, ReadError> {
        loop {
            match self.reader.next().await {
                Some(Ok(Message::Text(text))) => return Ok(RawFrame(text.as_str().as_bytes().to_vec())),
                Some(Ok(Message::Binary(data))) => return Ok(RawFrame(data.to_vec())),
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {
                    tracing::trace!(session = %self.session, "Control frame");
                }
                Some(Ok(Message::Close(frame))) => {
                    return Err(ReadError::PeerClosed {
                        code: frame.map(|f| u16::from(f.code)),
                    });
                }
                Some(Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed))
                | None => return Err(ReadError::PeerClosed { code: None }),
                Some(Err(e)) => return Err(ReadError::Transport(e)),
            }
        }
    }
}
