/// Why the client tore the session down on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum LogoutReason {
    /// The refresh endpoint call failed (error status, transport error, bad body).
    RefreshFailed,
    /// A request addressed to the refresh endpoint itself was rejected as unauthenticated.
    RefreshRejected,
}

/// Consumer-provided navigation, invoked after a forced logout.
///
/// The session has already been cleared when this is called; the host
/// application only has to show its login view.
///
/// # Example
///
/// ```rust,ignore
/// let client = ApiClient::new(config, session)?
///     .with_navigator(move |login_view: &str, reason| {
///         tracing::info!(?reason, "session ended");
///         router.replace(login_view);
///     });
/// ```
pub trait Navigator: Send + Sync + 'static {
    fn redirect_to_login(&self, login_view: &str, reason: LogoutReason);
}

/// No navigation (headless use, tests).
impl Navigator for () {
    fn redirect_to_login(&self, _login_view: &str, _reason: LogoutReason) {}
}

impl<F> Navigator for F
where
    F: Fn(&str, LogoutReason) + Send + Sync + 'static,
{
    fn redirect_to_login(&self, login_view: &str, reason: LogoutReason) {
        self(login_view, reason);
    }
}
