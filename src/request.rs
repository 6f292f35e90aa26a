use std::sync::Arc;

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;

use crate::error::Error;
use crate::session::AccessToken;

/// Everything needed to (re-)dispatch a REST call.
///
/// Bodies are kept as JSON values so the same descriptor can be sent again
/// after a token refresh.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<serde_json::Value>,
}

impl RequestDescriptor {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a header. An `Authorization` header set here is replaced by the
    /// session token whenever one is held.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if `body` cannot be serialized.
    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, Error> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }
}

/// One attempt at an original request.
///
/// Never mutated: the retry after a refresh is a new value carrying the
/// refreshed token, so an attempt can be retried at most once.
#[derive(Debug, Clone)]
pub(crate) struct RequestContext {
    descriptor: Arc<RequestDescriptor>,
    retried: bool,
    bearer: Option<AccessToken>,
}

impl RequestContext {
    pub(crate) fn new(descriptor: RequestDescriptor) -> Self {
        Self {
            descriptor: Arc::new(descriptor),
            retried: false,
            bearer: None,
        }
    }

    pub(crate) fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }

    pub(crate) fn retried(&self) -> bool {
        self.retried
    }

    /// Token pinned to this attempt. `None` means "read the session at dispatch".
    pub(crate) fn bearer(&self) -> Option<&AccessToken> {
        self.bearer.as_ref()
    }

    pub(crate) fn into_retry(self, token: AccessToken) -> Self {
        Self {
            descriptor: self.descriptor,
            retried: true,
            bearer: Some(token),
        }
    }
}
