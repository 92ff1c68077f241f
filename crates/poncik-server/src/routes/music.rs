//! Music provider account linking.

use axum::extract::State;
use axum::Json;
use poncik_core::models::UserUpdate;
use poncik_core::CoreError;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CallbackRequest {
    pub code: String,
}

/// Consent page URL; the caller's id rides along as OAuth `state`.
pub async fn authorize(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> ApiResult<Json<Value>> {
    let url = state.music.authorize_url(&user.user_id)?;
    Ok(Json(json!({ "url": url })))
}

pub async fn callback(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<CallbackRequest>,
) -> ApiResult<Json<Value>> {
    let tokens = state.music.exchange_code(&body.code).await?;
    let update = UserUpdate {
        spotify_access_token: Some(tokens.access_token.clone()),
        spotify_refresh_token: tokens.refresh_token.clone(),
        ..Default::default()
    };
    state.db.lock().await.update_user(&user.user_id, &update)?;
    tracing::info!(user_id = %user.user_id, "music account linked");
    Ok(Json(json!({ "success": true, "access_token": tokens.access_token })))
}

pub async fn token(CurrentUser(user): CurrentUser) -> ApiResult<Json<Value>> {
    let access_token = user
        .spotify_access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| CoreError::not_found("Spotify not connected"))?;
    Ok(Json(json!({ "access_token": access_token })))
}

pub async fn refresh(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> ApiResult<Json<Value>> {
    let refresh_token = user
        .spotify_refresh_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| CoreError::not_found("No refresh token"))?;

    let tokens = state.music.refresh(&refresh_token).await?;
    let update = UserUpdate {
        spotify_access_token: Some(tokens.access_token.clone()),
        spotify_refresh_token: tokens.refresh_token.clone(),
        ..Default::default()
    };
    state.db.lock().await.update_user(&user.user_id, &update)?;
    Ok(Json(json!({ "access_token": tokens.access_token })))
}
