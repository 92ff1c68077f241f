//! Session-id exchange against the external identity service.

use reqwest::Client;
use serde::Deserialize;

use crate::error::{CoreError, Result};
use crate::storage::AuthConfig;

/// Profile returned for a valid one-time session id.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityProfile {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub session_token: Option<String>,
}

pub struct IdentityClient {
    url: String,
    http: Client,
}

impl IdentityClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http: super::http_client(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.identity_url.clone())
    }

    /// Resolves `session_id` to a profile. Any non-200 answer means the id
    /// is not valid.
    pub async fn exchange(&self, session_id: &str) -> Result<IdentityProfile> {
        let resp = self
            .http
            .get(&self.url)
            .header("X-Session-ID", session_id)
            .send()
            .await
            .map_err(|e| CoreError::upstream("identity", e))?;

        if resp.status() != reqwest::StatusCode::OK {
            tracing::warn!(status = %resp.status(), "identity exchange rejected");
            return Err(CoreError::Unauthenticated("Invalid session_id".into()));
        }

        resp.json::<IdentityProfile>()
            .await
            .map_err(|e| CoreError::upstream("identity", e))
    }
}
