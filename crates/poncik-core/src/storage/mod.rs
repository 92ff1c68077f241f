mod config;
pub mod database;
pub mod migrations;

pub use config::{
    AuthConfig, ChatConfig, Config, DatabaseConfig, MusicConfig, PaymentsConfig, PushConfig,
    ServerConfig,
};
pub use database::Database;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/poncik[-dev]/` based on PONCIK_ENV.
///
/// Set PONCIK_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("PONCIK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("poncik-dev")
    } else {
        base_dir.join("poncik")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::SaveFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
