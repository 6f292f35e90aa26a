use reqwest::{Method, StatusCode};

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Transport failure: no response with a status code was received.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status that was not recovered.
    #[error("{method} {path} failed with status {status}")]
    Status {
        method: Method,
        path: String,
        status: StatusCode,
        body: String,
    },

    /// Token refresh failed; the session has been torn down.
    #[error("Token refresh failed: {detail}")]
    Refresh {
        status: Option<StatusCode>,
        detail: String,
    },

    /// A concurrent refresh failed and tore the session down while this request waited.
    #[error("Session ended during token refresh")]
    SessionEnded,

    /// The caller cancelled the request before it resolved.
    #[error("Request aborted")]
    Aborted,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "ws")]
    #[error("WebSocket error: {0}")]
    Socket(#[from] Box<tokio_tungstenite::tungstenite::Error>),
}

impl Error {
    /// HTTP status attached to this error, if the server produced one.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Refresh { status, .. } => *status,
            Self::Http(e) => e.status(),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }

    /// Consumes a failed response into [`Error::Status`], keeping the body for diagnostics.
    pub(crate) async fn from_response(
        method: &Method,
        path: &str,
        response: reqwest::Response,
    ) -> Self {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Self::Status {
            method: method.clone(),
            path: path.to_owned(),
            status,
            body,
        }
    }
}

#[cfg(feature = "ws")]
impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Socket(Box::new(e))
    }
}
