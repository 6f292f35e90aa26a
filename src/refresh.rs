use std::future::Future;

use tokio::sync::Mutex;

use crate::config::RefreshMode;
use crate::error::Error;
use crate::session::{AccessToken, SessionStore};

/// Serializes token refreshes and commits their outcome to the session.
///
/// In [`RefreshMode::Coalesced`] only one refresh runs at a time. A waiter
/// that finds the session already holds a different token than the one its
/// request was sent with reuses it, so N concurrent 401s cost one refresh call.
pub(crate) struct RefreshCoordinator {
    mode: RefreshMode,
    gate: Mutex<()>,
}

impl RefreshCoordinator {
    pub(crate) fn new(mode: RefreshMode) -> Self {
        Self {
            mode,
            gate: Mutex::new(()),
        }
    }

    /// Obtain a token newer than `stale`, running `refresh` if needed.
    ///
    /// On success the token is stored in `session` before this returns.
    /// On failure the session is cleared before this returns.
    pub(crate) async fn refresh<F, Fut>(
        &self,
        session: &SessionStore,
        stale: Option<&AccessToken>,
        refresh: F,
    ) -> Result<AccessToken, Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AccessToken, Error>>,
    {
        match self.mode {
            RefreshMode::Independent => Self::commit(session, refresh().await),
            RefreshMode::Coalesced => {
                let _guard = self.gate.lock().await;
                match session.token() {
                    Some(current) if stale != Some(&current) => {
                        tracing::debug!("reusing token from a concurrent refresh");
                        Ok(current)
                    }
                    Some(_) => Self::commit(session, refresh().await),
                    None => Err(Error::SessionEnded),
                }
            }
        }
    }

    /// Run `refresh` regardless of the session contents, e.g. to resume a
    /// cookie-backed session when the application starts.
    pub(crate) async fn force<F, Fut>(
        &self,
        session: &SessionStore,
        refresh: F,
    ) -> Result<AccessToken, Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AccessToken, Error>>,
    {
        let _guard = match self.mode {
            RefreshMode::Coalesced => Some(self.gate.lock().await),
            RefreshMode::Independent => None,
        };
        Self::commit(session, refresh().await)
    }

    fn commit(
        session: &SessionStore,
        outcome: Result<AccessToken, Error>,
    ) -> Result<AccessToken, Error> {
        match outcome {
            Ok(token) => {
                session.set_token(token.clone());
                Ok(token)
            }
            Err(e) => {
                session.clear();
                Err(e)
            }
        }
    }
}
