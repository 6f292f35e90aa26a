//! WebSocket connections authenticated with the session's access token.
//!
//! The token is read once, at connect time. A socket opened before a token
//! refresh keeps its original credentials; features that need the new token
//! reconnect themselves.

use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::client::ApiClient;
use crate::error::Error;

pub type SocketStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

impl ApiClient {
    /// Build the WebSocket handshake request for `path`.
    ///
    /// The scheme follows the API base URL (`http` → `ws`, `https` → `wss`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the base URL scheme has no WebSocket
    /// counterpart, or [`Error::Socket`] if the request cannot be built.
    pub fn socket_request(&self, path: &str) -> Result<Request, Error> {
        let mut url = self.config().endpoint(path)?;
        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            "http" | "ws" => "ws",
            other => {
                return Err(Error::Config(format!(
                    "no WebSocket scheme for base URL scheme '{other}'"
                )));
            }
        };
        url.set_scheme(scheme)
            .map_err(|()| Error::Config(format!("cannot switch {url} to {scheme}")))?;

        let mut request = url.as_str().into_client_request()?;
        if let Some(token) = self.session().token() {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.as_str()))
                .map_err(|e| Error::Config(format!("access token is not a valid header: {e}")))?;
            value.set_sensitive(true);
            request.headers_mut().insert(AUTHORIZATION, value);
        }
        Ok(request)
    }

    /// Open a WebSocket to `path` with the current access token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Socket`] if the connection or handshake fails.
    pub async fn connect_socket(&self, path: &str) -> Result<SocketStream, Error> {
        let request = self.socket_request(path)?;
        let (stream, _response) = tokio_tungstenite::connect_async(request).await?;
        tracing::debug!(path, "WebSocket connected");
        Ok(stream)
    }
}
