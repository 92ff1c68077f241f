//! Core error types for poncik-core.
//!
//! Domain failures (`Unauthenticated`, `NotFound`, `InvalidState`, ...) are
//! surfaced to callers as-is; infrastructure failures are wrapped in their
//! own enums so the server can tell a missing row from a broken database.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for poncik-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Missing, unknown or expired credential
    #[error("{0}")]
    Unauthenticated(String),

    /// Entity absent or not owned by the caller
    #[error("{0}")]
    NotFound(String),

    /// Operation not allowed in the current state (quest incomplete,
    /// insufficient balance, ...)
    #[error("{0}")]
    InvalidState(String),

    /// Action gated by level or premium status
    #[error("{0}")]
    Locked(String),

    /// One-time reward already taken
    #[error("{0}")]
    AlreadyClaimed(String),

    /// Chat spam guard tripped
    #[error("{0}")]
    RateLimited(String),

    /// External provider call failed
    #[error("{service} request failed: {message}")]
    Upstream { service: String, message: String },

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// OAuth-related errors
    #[error("OAuth error: {0}")]
    OAuth(#[from] OAuthError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        CoreError::NotFound(what.into())
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        CoreError::InvalidState(reason.into())
    }

    pub fn upstream(service: impl Into<String>, message: impl ToString) -> Self {
        CoreError::Upstream {
            service: service.into(),
            message: message.to_string(),
        }
    }
}

/// Storage failures, kept apart from domain errors so a broken database
/// surfaces as a 500 rather than a 404.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("cannot open database {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("schema migration failed: {0}")]
    MigrationFailed(String),

    /// SQLITE_BUSY / SQLITE_LOCKED from a concurrent writer
    #[error("database busy")]
    Busy,

    #[error("sqlite: {0}")]
    Sqlite(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    #[error("cannot write config {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    #[error("bad value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("no such config key: {0}")]
    UnknownKey(String),
}

/// Music provider handshake failures.
#[derive(Error, Debug)]
pub enum OAuthError {
    #[error("token endpoint rejected the request: {0}")]
    TokenExchangeFailed(String),

    #[error("cannot build provider URL: {0}")]
    InvalidUrl(String),

    /// Client id or secret left empty in the config
    #[error("{service} credentials are not configured")]
    CredentialsNotConfigured { service: String },
}

/// Malformed client input.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("{0} required")]
    Missing(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked) => DatabaseError::Busy,
            _ => DatabaseError::Sqlite(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_display_their_reason_verbatim() {
        assert_eq!(
            CoreError::invalid("Not enough credits").to_string(),
            "Not enough credits"
        );
        assert_eq!(
            CoreError::not_found("Session not found").to_string(),
            "Session not found"
        );
    }

    #[test]
    fn sqlite_failures_are_wrapped() {
        let err: DatabaseError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, DatabaseError::Sqlite(_)));
    }

    #[test]
    fn upstream_error_names_the_service() {
        let err = CoreError::upstream("payments", "HTTP 500");
        assert_eq!(err.to_string(), "payments request failed: HTTP 500");
    }
}
