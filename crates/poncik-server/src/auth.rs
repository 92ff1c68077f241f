//! Caller resolution for authenticated handlers.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use chrono::Utc;
use poncik_core::auth::{ensure_active, token_from_authorization, token_from_cookie_header};
use poncik_core::User;

use crate::error::ApiError;
use crate::AppState;

/// The user owning the request's session.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Session token from the cookie, falling back to a bearer header.
pub fn credential_from_headers(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(token_from_cookie_header);
    from_cookie
        .or_else(|| {
            headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(token_from_authorization)
        })
        .map(str::to_string)
}

/// Loads the user behind `token`, checking session expiry.
pub async fn resolve_user(state: &AppState, token: &str) -> Result<User, ApiError> {
    let db = state.db.lock().await;
    let session = ensure_active(db.get_session(token)?, Utc::now())?;
    Ok(db.require_user(&session.user_id)?)
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = credential_from_headers(&parts.headers)
            .ok_or_else(|| ApiError::unauthenticated("Not authenticated"))?;
        resolve_user(state, &token).await.map(CurrentUser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn cookie_wins_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("session_token=from_cookie"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from_header"));
        assert_eq!(credential_from_headers(&headers).as_deref(), Some("from_cookie"));
    }

    #[test]
    fn bearer_is_the_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer tok"));
        assert_eq!(credential_from_headers(&headers).as_deref(), Some("tok"));
        assert_eq!(credential_from_headers(&HeaderMap::new()), None);
    }
}
