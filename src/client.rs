use std::sync::Arc;

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::error::Error;
use crate::navigator::{LogoutReason, Navigator};
use crate::refresh::RefreshCoordinator;
use crate::request::{RequestContext, RequestDescriptor};
use crate::session::{AccessToken, SessionStore};
use crate::types::TokenResponse;

/// Authenticated client for the storefront REST API.
///
/// Every request carries `Authorization: Bearer <token>` while the shared
/// [`SessionStore`] holds a token. A request rejected as unauthenticated is
/// refreshed and re-sent at most once; callers only see the final outcome.
///
/// Cloning is cheap and clones share the session and refresh state.
#[derive(Clone)]
pub struct ApiClient {
    config: Arc<ClientConfig>,
    session: SessionStore,
    http: Client,
    navigator: Arc<dyn Navigator>,
    coordinator: Arc<RefreshCoordinator>,
}

impl ApiClient {
    /// Create a client bound to `session`.
    ///
    /// The underlying HTTP client keeps a cookie store, which carries the
    /// refresh credential set by the login endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the HTTP client cannot be built.
    pub fn new(config: ClientConfig, session: SessionStore) -> Result<Self, Error> {
        let http = Client::builder()
            .timeout(config.timeout())
            .cookie_store(true)
            .build()?;

        Ok(Self {
            coordinator: Arc::new(RefreshCoordinator::new(config.refresh_mode())),
            config: Arc::new(config),
            session,
            http,
            navigator: Arc::new(()),
        })
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Set the navigation hook run after a forced logout.
    #[must_use]
    pub fn with_navigator(mut self, navigator: impl Navigator) -> Self {
        self.navigator = Arc::new(navigator);
        self
    }

    /// Get the client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the session store shared with this client.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Send a request, refreshing the session once on an auth failure.
    ///
    /// # Errors
    ///
    /// - [`Error::Status`] for a non-success response that was not recovered
    /// - [`Error::Refresh`] if the session could not be refreshed (the user is logged out)
    /// - [`Error::Http`] on transport failure
    pub async fn send(&self, request: RequestDescriptor) -> Result<Response, Error> {
        self.execute(RequestContext::new(request), None).await
    }

    /// Like [`send`](Self::send), resolving to [`Error::Aborted`] once `abort` is cancelled.
    ///
    /// An aborted request never starts a token refresh.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send); additionally [`Error::Aborted`].
    pub async fn send_abortable(
        &self,
        request: RequestDescriptor,
        abort: &CancellationToken,
    ) -> Result<Response, Error> {
        self.execute(RequestContext::new(request), Some(abort)).await
    }

    /// Send a request and decode the success body as JSON.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send); decoding failures surface as [`Error::Http`].
    pub async fn json<T: DeserializeOwned>(&self, request: RequestDescriptor) -> Result<T, Error> {
        let response = self.send(request).await?;
        response.json::<T>().await.map_err(Into::into)
    }

    /// Send a `GET` request to `path`.
    pub async fn get(&self, path: &str) -> Result<Response, Error> {
        self.send(RequestDescriptor::get(path)).await
    }

    /// Send a `POST` request with `body` serialized as JSON.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Response, Error> {
        self.send(RequestDescriptor::post(path).with_json(body)?).await
    }

    /// Send a `PUT` request with `body` serialized as JSON.
    pub async fn put_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Response, Error> {
        self.send(RequestDescriptor::put(path).with_json(body)?).await
    }

    /// Send a `PATCH` request with `body` serialized as JSON.
    pub async fn patch_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Response, Error> {
        self.send(RequestDescriptor::patch(path).with_json(body)?).await
    }

    /// Send a `DELETE` request to `path`.
    pub async fn delete(&self, path: &str) -> Result<Response, Error> {
        self.send(RequestDescriptor::delete(path)).await
    }

    /// Log in with app-specific credentials and store the returned access token.
    ///
    /// A rejected login is returned as-is; it never enters the refresh flow.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Status`] if the login endpoint rejects the credentials,
    /// or [`Error::Http`] on network or decoding failure.
    pub async fn login<C: Serialize + ?Sized>(
        &self,
        credentials: &C,
    ) -> Result<TokenResponse, Error> {
        let request = RequestDescriptor::post(self.config.login_path()).with_json(credentials)?;
        let response = self
            .dispatch(&request, self.session.token().as_ref(), None)
            .await?;
        let response = Self::ensure_success(&request, response).await?;
        let tokens: TokenResponse = response.json().await?;

        self.session.set_token(tokens.access_token.clone());
        tracing::info!("Login successful");
        Ok(tokens)
    }

    /// Ask the refresh endpoint for a new access token.
    ///
    /// Works without a held token, so it can resume a cookie-backed session on
    /// start-up. If a token was held and the refresh fails, the user is logged
    /// out like on any other refresh failure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Refresh`] if the endpoint rejects the refresh.
    pub async fn refresh(&self) -> Result<AccessToken, Error> {
        let held = self.session.token();
        let result = self
            .coordinator
            .force(&self.session, || self.request_token())
            .await;

        if result.is_err() && held.is_some() {
            self.force_logout(LogoutReason::RefreshFailed, held).await;
        }
        result
    }

    /// End the session.
    ///
    /// The token is cleared before anything is awaited, so requests issued
    /// after this call starts go out anonymously. The logout endpoint is
    /// notified best-effort.
    pub async fn logout(&self) {
        let previous = self.session.take();
        self.notify_logout_endpoint(previous.as_ref()).await;
        tracing::info!("Logged out");
    }

    // ── Refresh-on-401 ─────────────────────────────────────────────

    async fn execute(
        &self,
        mut ctx: RequestContext,
        abort: Option<&CancellationToken>,
    ) -> Result<Response, Error> {
        loop {
            let bearer = match ctx.bearer() {
                Some(token) => Some(token.clone()),
                None => self.session.token(),
            };

            let response = self.dispatch(ctx.descriptor(), bearer.as_ref(), abort).await?;
            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            let error = Self::failure(ctx.descriptor(), response).await;
            if ctx.retried() || !self.config.auth_failure_policy().triggers_refresh(status) {
                return Err(error);
            }

            ctx = self.recover(ctx, bearer, error, abort).await?;
        }
    }

    /// Handle an auth failure on a first attempt: either produce the retry
    /// attempt carrying a fresh token, or the terminal error.
    async fn recover(
        &self,
        ctx: RequestContext,
        sent_with: Option<AccessToken>,
        error: Error,
        abort: Option<&CancellationToken>,
    ) -> Result<RequestContext, Error> {
        let path = ctx.descriptor().path();

        if !self.session.is_authenticated() {
            tracing::debug!(path, "Auth failure without a session, not refreshing");
            return Err(error);
        }

        if self.config.is_refresh_endpoint(path) {
            self.force_logout(LogoutReason::RefreshRejected, self.session.token())
                .await;
            return Err(Error::Refresh {
                status: error.status(),
                detail: error.to_string(),
            });
        }

        if abort.is_some_and(CancellationToken::is_cancelled) {
            return Err(Error::Aborted);
        }

        tracing::debug!(path, "Access token rejected, refreshing");
        // The coordinator clears the session on failure; keep the token for logout.
        let held = self.session.token();
        let refreshed = self
            .coordinator
            .refresh(&self.session, sent_with.as_ref(), || self.request_token())
            .await;

        match refreshed {
            Ok(token) => Ok(ctx.into_retry(token)),
            Err(Error::SessionEnded) => Err(Error::SessionEnded),
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed");
                self.force_logout(LogoutReason::RefreshFailed, held).await;
                Err(e)
            }
        }
    }

    /// Call the refresh endpoint. The refresh credential travels in a cookie.
    async fn request_token(&self) -> Result<AccessToken, Error> {
        let request = RequestDescriptor::post(self.config.refresh_path());
        let response = self
            .dispatch(&request, self.session.token().as_ref(), None)
            .await
            .map_err(|e| Error::Refresh {
                status: None,
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Refresh {
                status: Some(status),
                detail: if body.is_empty() { status.to_string() } else { body },
            });
        }

        let tokens: TokenResponse = response.json().await.map_err(|e| Error::Refresh {
            status: Some(status),
            detail: e.to_string(),
        })?;
        Ok(tokens.access_token)
    }

    /// Tear the session down and redirect. `previous` is the token held before
    /// the failure and is sent to the logout endpoint so the server can revoke it.
    async fn force_logout(&self, reason: LogoutReason, previous: Option<AccessToken>) {
        tracing::warn!(?reason, "Session ended, redirecting to login");
        self.session.clear();
        self.notify_logout_endpoint(previous.as_ref()).await;
        self.navigator.redirect_to_login(self.config.login_view(), reason);
    }

    async fn notify_logout_endpoint(&self, token: Option<&AccessToken>) {
        let request = RequestDescriptor::post(self.config.logout_path());
        match self.dispatch(&request, token, None).await {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                tracing::warn!(status = %response.status(), "Logout endpoint rejected request");
            }
            Err(e) => tracing::warn!(error = %e, "Logout endpoint unreachable"),
        }
    }

    // ── Transport ──────────────────────────────────────────────────

    /// Build and send one HTTP request. `bearer` overrides any
    /// `Authorization` header on the descriptor.
    async fn dispatch(
        &self,
        request: &RequestDescriptor,
        bearer: Option<&AccessToken>,
        abort: Option<&CancellationToken>,
    ) -> Result<Response, Error> {
        let url = self.config.endpoint(request.path())?;

        let mut headers = request.headers().clone();
        if let Some(token) = bearer {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.as_str()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder = self
            .http
            .request(request.method().clone(), url)
            .headers(headers);
        if !request.query().is_empty() {
            builder = builder.query(request.query());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let send = builder.send();
        match abort {
            Some(abort) => tokio::select! {
                biased;
                () = abort.cancelled() => Err(Error::Aborted),
                result = send => result.map_err(Into::into),
            },
            None => send.await.map_err(Into::into),
        }
    }

    async fn failure(request: &RequestDescriptor, response: Response) -> Error {
        Error::from_response(request.method(), request.path(), response).await
    }

    async fn ensure_success(
        request: &RequestDescriptor,
        response: Response,
    ) -> Result<Response, Error> {
        if response.status().is_success() {
            return Ok(response);
        }
        Err(Self::failure(request, response).await)
    }
}
