//! TOML-based server configuration.
//!
//! Covers the listener and CORS origins, the database location, session
//! settings, payment provider credentials, push relay, music OAuth client
//! and chat limits.
//!
//! Configuration is stored at `~/.config/poncik/config.toml`. Secrets may
//! be supplied through environment variables instead of the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_origins")]
    pub cors_origins: Vec<String>,
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file; `<data_dir>/poncik.db` when unset.
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_identity_url")]
    pub identity_url: String,
    #[serde(default = "default_session_days")]
    pub session_days: i64,
    #[serde(default = "default_true")]
    pub secure_cookie: bool,
    /// Enables `POST /api/auth/test-login`.
    #[serde(default)]
    pub allow_test_login: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentsConfig {
    #[serde(default = "default_payments_api")]
    pub api_base: String,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default)]
    pub webhook_secret: String,
    #[serde(default = "default_webhook_tolerance")]
    pub webhook_tolerance_secs: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    #[serde(default)]
    pub vapid_public_key: String,
    #[serde(default)]
    pub relay_url: Option<String>,
    #[serde(default)]
    pub relay_secret: String,
    #[serde(default = "default_push_icon")]
    pub default_icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_music_redirect")]
    pub redirect_uri: String,
    #[serde(default = "default_music_token_url")]
    pub token_url: String,
    #[serde(default = "default_music_authorize_url")]
    pub authorize_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_group_limit")]
    pub free_group_limit: i64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/poncik/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub payments: PaymentsConfig,
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub music: MusicConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

// Default functions
fn default_bind() -> String {
    "0.0.0.0:8001".into()
}
fn default_origins() -> Vec<String> {
    vec!["http://localhost:3000".into()]
}
fn default_frontend_url() -> String {
    "http://localhost:3000".into()
}
fn default_identity_url() -> String {
    "https://demobackend.emergentagent.com/auth/v1/env/oauth/session-data".into()
}
fn default_session_days() -> i64 {
    7
}
fn default_true() -> bool {
    true
}
fn default_payments_api() -> String {
    "https://api.stripe.com".into()
}
fn default_webhook_tolerance() -> i64 {
    300
}
fn default_currency() -> String {
    "try".into()
}
fn default_push_icon() -> String {
    "/logo192.png".into()
}
fn default_music_redirect() -> String {
    "http://localhost:3000/spotify-callback".into()
}
fn default_music_token_url() -> String {
    "https://accounts.spotify.com/api/token".into()
}
fn default_music_authorize_url() -> String {
    "https://accounts.spotify.com/authorize".into()
}
fn default_group_limit() -> i64 {
    3
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_origins: default_origins(),
            frontend_url: default_frontend_url(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            identity_url: default_identity_url(),
            session_days: default_session_days(),
            secure_cookie: true,
            allow_test_login: false,
        }
    }
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            api_base: default_payments_api(),
            secret_key: String::new(),
            webhook_secret: String::new(),
            webhook_tolerance_secs: default_webhook_tolerance(),
            currency: default_currency(),
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            vapid_public_key: String::new(),
            relay_url: None,
            relay_secret: String::new(),
            default_icon: default_push_icon(),
        }
    }
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: default_music_redirect(),
            token_url: default_music_token_url(),
            authorize_url: default_music_authorize_url(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            free_group_limit: default_group_limit(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<i64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Array(_) => {
                        if value.trim_start().starts_with('[') {
                            serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                        } else {
                            serde_json::Value::Array(
                                value
                                    .split(',')
                                    .map(|s| serde_json::Value::String(s.trim().to_string()))
                                    .collect(),
                            )
                        }
                    }
                    serde_json::Value::Object(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value in memory by dot-separated key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// into the key's type.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Set a config value by key and save to the default location.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.set_value(key, value)?;
        self.save()
    }

    /// Overlays secrets from the environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut apply = |name: &str, slot: &mut String| {
            if let Some(v) = lookup(name).filter(|v| !v.is_empty()) {
                *slot = v;
            }
        };
        apply("PONCIK_PAYMENTS_SECRET_KEY", &mut self.payments.secret_key);
        apply("PONCIK_PAYMENTS_WEBHOOK_SECRET", &mut self.payments.webhook_secret);
        apply("PONCIK_MUSIC_CLIENT_SECRET", &mut self.music.client_secret);
        apply("PONCIK_PUSH_RELAY_SECRET", &mut self.push.relay_secret);
        self
    }

    /// Database file, falling back to `<data_dir>/poncik.db`.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.database.path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Ok(data_dir()?.join("poncik.db")),
        }
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}
