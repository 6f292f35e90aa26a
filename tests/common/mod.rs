//! Shared helpers for storefront-client integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use serde_json::json;
use storefront_client::{ApiClient, ClientConfig, LogoutReason, SessionStore};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub type Redirects = Arc<Mutex<Vec<(String, LogoutReason)>>>;

/// Client wired to a mock server, recording every login redirect.
pub struct Harness {
    pub client: ApiClient,
    pub session: SessionStore,
    pub redirects: Redirects,
}

impl Harness {
    pub fn redirects(&self) -> Vec<(String, LogoutReason)> {
        self.redirects.lock().unwrap().clone()
    }
}

pub fn config(server: &MockServer) -> ClientConfig {
    ClientConfig::new(server.uri().parse().unwrap())
}

pub fn harness(config: ClientConfig, session: SessionStore) -> Harness {
    let redirects: Redirects = Arc::default();
    let recorder = redirects.clone();
    let client = ApiClient::new(config, session.clone())
        .unwrap()
        .with_navigator(move |login_view: &str, reason: LogoutReason| {
            recorder.lock().unwrap().push((login_view.to_owned(), reason));
        });

    Harness {
        client,
        session,
        redirects,
    }
}

/// Refresh endpoint answering with `token`, expected `times` times.
pub async fn mount_refresh(server: &MockServer, token: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": token })))
        .expect(times)
        .mount(server)
        .await;
}

/// Logout endpoint accepting any call.
pub async fn mount_logout(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(204))
        .mount(server)
        .await;
}

/// `Authorization` header values of received requests to `request_path`, in arrival order.
pub async fn authorization_headers(server: &MockServer, request_path: &str) -> Vec<Option<String>> {
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == request_path)
        .map(|r| {
            r.headers
                .get("authorization")
                .map(|v| v.to_str().unwrap().to_owned())
        })
        .collect()
}
