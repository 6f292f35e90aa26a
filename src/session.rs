use std::sync::Arc;

use derive_more::{From, Into};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Bearer access token issued by the login or refresh endpoint.
///
/// The value is never printed through `Debug`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, From, Into)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AccessToken {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Authenticated,
    Anonymous,
}

/// Holder of the current access token, shared by the client and the UI.
///
/// Clones share the same state. Every operation is a synchronous in-memory
/// read or write; none of them suspend.
///
/// ```rust,ignore
/// let session = SessionStore::new();
/// let client = ApiClient::new(config, session.clone())?;
///
/// // UI side: react to login / refresh / logout
/// let mut rx = session.subscribe();
/// while rx.changed().await.is_ok() { ... }
/// ```
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<watch::Sender<Option<AccessToken>>>,
}

impl SessionStore {
    /// Create an empty (anonymous) session.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { inner: Arc::new(tx) }
    }

    /// Create a session that already holds a token.
    #[must_use]
    pub fn with_token(token: impl Into<AccessToken>) -> Self {
        let session = Self::new();
        session.set_token(token);
        session
    }

    /// Replace the current token (after login or a successful refresh).
    pub fn set_token(&self, token: impl Into<AccessToken>) {
        self.inner.send_replace(Some(token.into()));
    }

    /// Remove the current token (logout or unrecoverable refresh failure).
    pub fn clear(&self) {
        self.inner.send_replace(None);
    }

    /// Remove the current token and return what was held.
    pub fn take(&self) -> Option<AccessToken> {
        self.inner.send_replace(None)
    }

    #[must_use]
    pub fn token(&self) -> Option<AccessToken> {
        self.inner.borrow().clone()
    }

    #[must_use]
    pub fn status(&self) -> AuthStatus {
        if self.inner.borrow().is_some() {
            AuthStatus::Authenticated
        } else {
            AuthStatus::Anonymous
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.status() == AuthStatus::Authenticated
    }

    /// Observe token changes. The receiver starts at the current value.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<AccessToken>> {
        self.inner.subscribe()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("status", &self.status())
            .finish()
    }
}
