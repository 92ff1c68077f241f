//! Authorization-code flow against the music provider's token endpoint.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CoreError, OAuthError, Result};
use crate::storage::MusicConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicTokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

pub struct MusicOAuth {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    token_url: String,
    authorize_url: String,
    http: Client,
}

/// Playback and profile scopes requested from the provider.
pub const MUSIC_SCOPES: &[&str] = &[
    "user-read-playback-state",
    "user-modify-playback-state",
    "user-read-currently-playing",
    "streaming",
    "user-read-email",
    "user-read-private",
];

impl MusicOAuth {
    pub fn new(config: &MusicConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            token_url: config.token_url.clone(),
            authorize_url: config.authorize_url.clone(),
            http: super::http_client(),
        }
    }

    fn ensure_configured(&self) -> Result<()> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(OAuthError::CredentialsNotConfigured {
                service: "spotify".into(),
            }
            .into());
        }
        Ok(())
    }

    /// Provider consent page URL; `state` is echoed back to the callback.
    pub fn authorize_url(&self, state: &str) -> Result<String> {
        self.ensure_configured()?;
        let scopes = MUSIC_SCOPES.join(" ");
        let url = Url::parse_with_params(
            &self.authorize_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", scopes.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| OAuthError::InvalidUrl(e.to_string()))?;
        Ok(url.into())
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<MusicTokens> {
        self.ensure_configured()?;
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        self.request(&params).await.map_err(|e| {
            tracing::warn!(error = %e, "music code exchange failed");
            CoreError::invalid("Spotify auth failed")
        })
    }

    /// Refresh an access token. The provider may omit a new refresh token,
    /// in which case the old one is kept.
    pub async fn refresh(&self, refresh_token: &str) -> Result<MusicTokens> {
        self.ensure_configured()?;
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        let mut tokens = self.request(&params).await.map_err(|e| {
            tracing::warn!(error = %e, "music token refresh failed");
            CoreError::invalid("Refresh failed")
        })?;
        if tokens.refresh_token.is_none() {
            tokens.refresh_token = Some(refresh_token.to_string());
        }
        Ok(tokens)
    }

    async fn request(&self, params: &[(&str, &str)]) -> Result<MusicTokens, OAuthError> {
        let resp = self
            .http
            .post(&self.token_url)
            .form(params)
            .send()
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(OAuthError::TokenExchangeFailed(format!("HTTP {status}: {text}")));
        }

        resp.json::<MusicTokens>()
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_url_carries_client_and_scopes() {
        let oauth = MusicOAuth::new(&MusicConfig {
            client_id: "client 1".into(),
            client_secret: "secret".into(),
            ..MusicConfig::default()
        });
        let url = Url::parse(&oauth.authorize_url("user_1").unwrap()).unwrap();
        assert_eq!(url.host_str(), Some("accounts.spotify.com"));
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("client_id".into(), "client 1".into())));
        assert!(pairs.contains(&("state".into(), "user_1".into())));
        assert!(pairs.contains(&("scope".into(), MUSIC_SCOPES.join(" "))));
    }

    #[test]
    fn unconfigured_client_is_rejected() {
        let oauth = MusicOAuth::new(&MusicConfig::default());
        assert!(matches!(
            oauth.authorize_url("x"),
            Err(CoreError::OAuth(OAuthError::CredentialsNotConfigured { .. }))
        ));
    }
}
