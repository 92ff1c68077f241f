//! Session tokens and credential lookup rules.

use chrono::{DateTime, Duration, Utc};

use crate::error::{CoreError, Result};
use crate::models::AuthSession;

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session_token";

/// Random opaque token of the form `session_<32 hex chars>`.
pub fn generate_session_token() -> String {
    let bytes: [u8; 16] = rand::random();
    format!("session_{}", hex::encode(bytes))
}

pub fn session_expiry(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now + Duration::days(days)
}

/// Checks a stored session against the clock.
pub fn ensure_active(session: Option<AuthSession>, now: DateTime<Utc>) -> Result<AuthSession> {
    let session = session.ok_or_else(|| CoreError::Unauthenticated("Invalid session".into()))?;
    if session.expires_at < now {
        return Err(CoreError::Unauthenticated("Session expired".into()));
    }
    Ok(session)
}

/// Reads the session token out of a raw `Cookie` header value.
pub fn token_from_cookie_header(header: &str) -> Option<&str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim_matches('"'))
        .filter(|v| !v.is_empty())
}

/// Reads a bearer token out of an `Authorization` header value.
pub fn token_from_authorization(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
        Some(token.trim())
    } else {
        None
    }
}

/// `Set-Cookie` value establishing a session.
pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=None; Max-Age={max_age_secs}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value clearing the session.
pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_are_unique_and_prefixed() {
        let a = generate_session_token();
        let b = generate_session_token();
        assert!(a.starts_with("session_"));
        assert_eq!(a.len(), "session_".len() + 32);
        assert_ne!(a, b);
    }

    #[test]
    fn cookie_header_parsing() {
        assert_eq!(
            token_from_cookie_header("theme=dark; session_token=abc123; lang=tr"),
            Some("abc123")
        );
        assert_eq!(token_from_cookie_header("theme=dark"), None);
        assert_eq!(token_from_cookie_header("session_token="), None);
    }

    #[test]
    fn bearer_parsing() {
        assert_eq!(token_from_authorization("Bearer tok"), Some("tok"));
        assert_eq!(token_from_authorization("bearer tok"), Some("tok"));
        assert_eq!(token_from_authorization("Basic dXNlcg=="), None);
        assert_eq!(token_from_authorization("Bearer "), None);
    }

    #[test]
    fn expired_session_is_rejected() {
        let now = Utc::now();
        let session = AuthSession {
            user_id: "user_1".into(),
            session_token: "t".into(),
            expires_at: now - Duration::seconds(1),
            created_at: now - Duration::days(7),
        };
        let err = ensure_active(Some(session), now).unwrap_err();
        assert_eq!(err.to_string(), "Session expired");
        let err = ensure_active(None, now).unwrap_err();
        assert_eq!(err.to_string(), "Invalid session");
    }

    #[test]
    fn cookie_attributes() {
        let c = session_cookie("tok", 604800, true);
        assert!(c.starts_with("session_token=tok;"));
        assert!(c.contains("HttpOnly"));
        assert!(c.contains("Max-Age=604800"));
        assert!(c.ends_with("; Secure"));
        assert!(!clear_session_cookie(false).contains("Secure"));
    }
}
