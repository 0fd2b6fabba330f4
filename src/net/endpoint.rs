//! Stream endpoint addressing.
//!
//! # Responsibilities
//! - Build the `ws://<host>/stream` URL from the configured host
//! - Attach the client token header to the upgrade request

use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use url::Url;

use crate::net::connection::ConnectError;

/// Path of the Gotify message stream.
pub const STREAM_PATH: &str = "/stream";

/// Header carrying the client token (`X-Gotify-Key`).
pub const AUTH_HEADER: HeaderName = HeaderName::from_static("x-gotify-key");

/// Build the stream URL for a `host[:port]` string.
pub fn stream_url(host: &str) -> Result<Url, ConnectError> {
    let invalid = |reason: String| ConnectError::InvalidUrl {
        host: host.to_string(),
        reason,
    };

    let url = Url::parse(&format!("ws://{}{}", host.trim(), STREAM_PATH))
        .map_err(|e| invalid(e.to_string()))?;

    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    // A host containing '/', '?' or '#' would smuggle in its own path.
    if url.path() != STREAM_PATH || url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("host must not contain a path, query or fragment".to_string()));
    }

    Ok(url)
}

/// Build the authenticated upgrade request.
pub fn stream_request(url: &Url, token: &str) -> Result<Request, ConnectError> {
    let mut request = url.as_str().into_client_request()?;
    let value = HeaderValue::from_str(token).map_err(|_| ConnectError::InvalidToken)?;
    request.headers_mut().insert(AUTH_HEADER, value);
    Ok(request)
}
