#![doc = include_str!("../README.md")]

pub mod client;
pub mod config;
pub mod error;
pub mod navigator;
mod refresh;
pub mod request;
pub mod session;
#[cfg(feature = "ws")]
pub mod socket;
pub mod types;

// Re-exports for convenient access
pub use client::ApiClient;
pub use config::{AuthFailurePolicy, ClientConfig, RefreshMode};
pub use error::Error;
pub use navigator::{LogoutReason, Navigator};
pub use request::RequestDescriptor;
pub use session::{AccessToken, AuthStatus, SessionStore};
#[cfg(feature = "ws")]
pub use socket::SocketStream;
pub use types::TokenResponse;

/// Re-export cancellation token type for abortable requests.
pub use tokio_util::sync::CancellationToken;
