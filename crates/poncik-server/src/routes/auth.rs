//! Login, test login, current user and logout.

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use poncik_core::auth::{clear_session_cookie, generate_session_token, session_cookie, session_expiry};
use poncik_core::models::{short_id, AuthSession};
use poncik_core::{CoreError, Database, User};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{credential_from_headers, CurrentUser};
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Replaces the user's sessions with a fresh one and builds the response
/// carrying the cookie.
fn start_session(
    db: &Database,
    state: &AppState,
    user: User,
    token: String,
    now: DateTime<Utc>,
) -> ApiResult<Response> {
    let days = state.config.auth.session_days;
    let session = AuthSession {
        user_id: user.user_id.clone(),
        session_token: token,
        expires_at: session_expiry(now, days),
        created_at: now,
    };
    db.replace_sessions(&session)?;
    tracing::info!(user_id = %user.user_id, "session started");

    let cookie = session_cookie(&session.session_token, days * 86_400, state.config.auth.secure_cookie);
    Ok(([(SET_COOKIE, cookie)], Json(user)).into_response())
}

pub async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<SessionRequest>,
) -> ApiResult<Response> {
    let session_id = body
        .session_id
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| CoreError::invalid("session_id required"))?;

    let profile = state.identity.exchange(&session_id).await?;
    let now = Utc::now();

    let db = state.db.lock().await;
    let user = db.upsert_identity(&profile.email, &profile.name, profile.picture.clone(), now)?;
    let token = profile
        .session_token
        .filter(|t| !t.is_empty())
        .unwrap_or_else(generate_session_token);
    start_session(&db, &state, user, token, now)
}

/// Development login that mints a well-stocked throwaway account.
pub async fn test_login(State(state): State<AppState>) -> ApiResult<Response> {
    if !state.config.auth.allow_test_login {
        return Err(CoreError::not_found("Not found").into());
    }
    let now = Utc::now();
    let suffix = short_id();
    let mut user = User::new(&format!("test_{suffix}@poncik.app"), "Test User", None, now);
    user.user_id = format!("test_{suffix}");
    user.credits = 1000;
    user.level = 5;
    user.xp = 500;
    user.streak_days = 3;
    user.total_focus_minutes = 250;

    let db = state.db.lock().await;
    db.insert_user(&user)?;
    start_session(&db, &state, user, generate_session_token(), now)
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    if let Some(token) = credential_from_headers(&headers) {
        state.db.lock().await.delete_session(&token)?;
    }
    let cookie = clear_session_cookie(state.config.auth.secure_cookie);
    Ok(([(SET_COOKIE, cookie)], Json(json!({ "message": "Logged out" }))).into_response())
}
