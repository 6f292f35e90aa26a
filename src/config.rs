use std::time::Duration;

use reqwest::StatusCode;
use url::Url;

use crate::error::Error;

/// Which response statuses enter the refresh-and-retry flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthFailurePolicy {
    /// Only `401 Unauthorized` triggers a refresh.
    #[default]
    UnauthorizedOnly,
    /// `401` and `403 Forbidden` both trigger a refresh.
    ///
    /// Treats "forbidden" as "needs refresh"; only enable this against an API
    /// that reports expired tokens with 403.
    UnauthorizedOrForbidden,
}

impl AuthFailurePolicy {
    #[must_use]
    pub fn triggers_refresh(self, status: StatusCode) -> bool {
        match self {
            Self::UnauthorizedOnly => status == StatusCode::UNAUTHORIZED,
            Self::UnauthorizedOrForbidden => {
                status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
            }
        }
    }
}

/// How concurrent auth failures share refresh calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshMode {
    /// One refresh call in flight at a time; waiters reuse its token.
    #[default]
    Coalesced,
    /// Every failing request performs its own refresh call.
    Independent,
}

/// Storefront API client configuration.
///
/// The base URL is the only required field:
///
/// ```rust,ignore
/// use storefront_client::ClientConfig;
///
/// let config = ClientConfig::new("https://api.shop.example/v1".parse()?)
///     .with_refresh_path("/token/refresh")
///     .with_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ClientConfig {
    pub(crate) base_url: Url,
    pub(crate) login_path: String,
    pub(crate) refresh_path: String,
    pub(crate) logout_path: String,
    pub(crate) login_view: String,
    pub(crate) timeout: Duration,
    pub(crate) auth_failure_policy: AuthFailurePolicy,
    pub(crate) refresh_mode: RefreshMode,
}

impl ClientConfig {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            login_path: "/auth/login".into(),
            refresh_path: "/auth/refresh".into(),
            logout_path: "/auth/logout".into(),
            login_view: "/login".into(),
            timeout: Duration::from_secs(30),
            auth_failure_policy: AuthFailurePolicy::default(),
            refresh_mode: RefreshMode::default(),
        }
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `STOREFRONT_API_URL`: API base URL
    ///
    /// # Optional env vars
    /// - `STOREFRONT_LOGIN_PATH`, `STOREFRONT_REFRESH_PATH`, `STOREFRONT_LOGOUT_PATH`: endpoint overrides
    /// - `STOREFRONT_LOGIN_VIEW`: client route shown after a forced logout
    /// - `STOREFRONT_TIMEOUT_SECS`: per-request timeout in seconds
    /// - `STOREFRONT_REFRESH_ON_FORBIDDEN`: `"1"` or `"true"` to refresh on 403 as well
    /// - `STOREFRONT_REFRESH_MODE`: `"coalesced"` (default) or `"independent"`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the base URL is missing or any value is malformed.
    pub fn from_env() -> Result<Self, Error> {
        let base_url = std::env::var("STOREFRONT_API_URL")
            .map_err(|_| Error::Config("STOREFRONT_API_URL is required".into()))?;
        let base_url: Url = base_url
            .parse()
            .map_err(|e| Error::Config(format!("STOREFRONT_API_URL: {e}")))?;

        let mut config = Self::new(base_url);

        if let Ok(path) = std::env::var("STOREFRONT_LOGIN_PATH") {
            config = config.with_login_path(path);
        }
        if let Ok(path) = std::env::var("STOREFRONT_REFRESH_PATH") {
            config = config.with_refresh_path(path);
        }
        if let Ok(path) = std::env::var("STOREFRONT_LOGOUT_PATH") {
            config = config.with_logout_path(path);
        }
        if let Ok(view) = std::env::var("STOREFRONT_LOGIN_VIEW") {
            config = config.with_login_view(view);
        }
        if let Ok(secs) = std::env::var("STOREFRONT_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("STOREFRONT_TIMEOUT_SECS: {e}")))?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        let refresh_on_forbidden = matches!(
            std::env::var("STOREFRONT_REFRESH_ON_FORBIDDEN").as_deref(),
            Ok("1") | Ok("true"),
        );
        if refresh_on_forbidden {
            config = config.with_auth_failure_policy(AuthFailurePolicy::UnauthorizedOrForbidden);
        }

        if let Ok(mode) = std::env::var("STOREFRONT_REFRESH_MODE") {
            let mode = match mode.trim() {
                "coalesced" => RefreshMode::Coalesced,
                "independent" => RefreshMode::Independent,
                other => {
                    return Err(Error::Config(format!(
                        "STOREFRONT_REFRESH_MODE: unknown mode '{other}'"
                    )));
                }
            };
            config = config.with_refresh_mode(mode);
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    #[must_use]
    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    #[must_use]
    pub fn with_logout_path(mut self, path: impl Into<String>) -> Self {
        self.logout_path = path.into();
        self
    }

    /// Client-side route the [`Navigator`](crate::Navigator) is sent to after a forced logout.
    #[must_use]
    pub fn with_login_view(mut self, view: impl Into<String>) -> Self {
        self.login_view = view.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_auth_failure_policy(mut self, policy: AuthFailurePolicy) -> Self {
        self.auth_failure_policy = policy;
        self
    }

    #[must_use]
    pub fn with_refresh_mode(mut self, mode: RefreshMode) -> Self {
        self.refresh_mode = mode;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    #[must_use]
    pub fn refresh_path(&self) -> &str {
        &self.refresh_path
    }

    #[must_use]
    pub fn logout_path(&self) -> &str {
        &self.logout_path
    }

    #[must_use]
    pub fn login_view(&self) -> &str {
        &self.login_view
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn auth_failure_policy(&self) -> AuthFailurePolicy {
        self.auth_failure_policy
    }

    #[must_use]
    pub fn refresh_mode(&self) -> RefreshMode {
        self.refresh_mode
    }

    /// Resolve an API path against the base URL, keeping any base path prefix.
    ///
    /// A `?query` on `path` becomes the URL query; a `#fragment` is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the base URL cannot carry a path (e.g. `mailto:`).
    pub fn endpoint(&self, path: &str) -> Result<Url, Error> {
        let (path, query) = split_path(path);
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| Error::Config(format!("base URL {} cannot be a base", self.base_url)))?;
            segments.pop_if_empty();
            let path = path.trim_matches('/');
            if !path.is_empty() {
                segments.extend(path.split('/'));
            }
        }
        if query.is_some() {
            url.set_query(query);
        }
        Ok(url)
    }

    /// Whether `path` names the refresh endpoint, ignoring any query.
    #[must_use]
    pub fn is_refresh_endpoint(&self, path: &str) -> bool {
        let (path, _) = split_path(path);
        path.trim_matches('/') == self.refresh_path.trim_matches('/')
    }
}

/// Split `path?query#fragment` into the path and a non-empty query.
fn split_path(path: &str) -> (&str, Option<&str>) {
    let path = path.split_once('#').map_or(path, |(path, _)| path);
    match path.split_once('?') {
        Some((path, query)) if !query.is_empty() => (path, Some(query)),
        Some((path, _)) => (path, None),
        None => (path, None),
    }
}
