//! Browser push delivery through a signing relay.
//!
//! The relay holds the VAPID private key; this side only forwards the stored
//! subscription and the notification body, signed with a shared secret.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{CoreError, Result};
use crate::signing::hmac_hex;
use crate::storage::PushConfig;

/// Header carrying `sha256=<hex hmac of the body>`.
pub const SIGNATURE_HEADER: &str = "X-Poncik-Signature";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    pub icon: String,
}

pub struct PushRelay {
    relay_url: Option<String>,
    secret: String,
    http: Client,
}

impl PushRelay {
    pub fn new(config: &PushConfig) -> Self {
        Self {
            relay_url: config.relay_url.clone().filter(|u| !u.is_empty()),
            secret: config.relay_secret.clone(),
            http: super::http_client(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.relay_url.is_some()
    }

    /// Signs `body` for the relay.
    pub fn signature(&self, body: &[u8]) -> Result<String> {
        Ok(format!("sha256={}", hmac_hex(self.secret.as_bytes(), body)?))
    }

    pub async fn send(&self, subscription: &Value, payload: &PushPayload) -> Result<()> {
        let url = self
            .relay_url
            .as_deref()
            .ok_or_else(|| CoreError::upstream("push", "relay not configured"))?;

        let body = serde_json::to_vec(&json!({
            "subscription": subscription,
            "payload": payload,
        }))?;

        let resp = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(SIGNATURE_HEADER, self.signature(&body)?)
            .body(body)
            .send()
            .await
            .map_err(|e| CoreError::upstream("push", e))?;

        let status = resp.status();
        if !status.is_success() {
            tracing::error!(%status, "push relay rejected notification");
            return Err(CoreError::upstream("push", "Failed to send notification"));
        }
        Ok(())
    }
}
