//! Outbound HTTP collaborators.
//!
//! Each client owns its base URL so tests can point it at a local mock.

pub mod identity;
pub mod oauth;
pub mod payments;
pub mod push;

pub use identity::{IdentityClient, IdentityProfile};
pub use oauth::{MusicOAuth, MusicTokens};
pub use payments::{CheckoutSession, PaymentsClient};
pub use push::{PushPayload, PushRelay};

use std::time::Duration;

use reqwest::Client;

const USER_AGENT: &str = concat!("poncik/", env!("CARGO_PKG_VERSION"));

/// Shared client settings for every outbound call.
pub(crate) fn http_client() -> Client {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(15))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default http client");
            Client::new()
        })
}
