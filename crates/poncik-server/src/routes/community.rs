//! Leaderboard and friendships.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use poncik_core::models::{PublicProfile, INVITE_BONUS_CREDITS};
use serde::Deserialize;
use serde_json::{json, Value};

use super::required_text;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::AppState;

const LEADERBOARD_SIZE: usize = 20;

#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    pub target_email: String,
}

pub async fn leaderboard(State(state): State<AppState>) -> ApiResult<Json<Vec<PublicProfile>>> {
    Ok(Json(state.db.lock().await.leaderboard(LEADERBOARD_SIZE)?))
}

pub async fn friends(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> ApiResult<Json<Vec<PublicProfile>>> {
    Ok(Json(state.db.lock().await.friends(&user.user_id)?))
}

pub async fn invite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<InviteRequest>,
) -> ApiResult<Json<Value>> {
    let email = required_text("target_email", &body.target_email)?;
    let friendship = state
        .db
        .lock()
        .await
        .invite_friend(&user.user_id, &email, Utc::now())?;
    tracing::info!(user_id = %user.user_id, friend_id = %friendship.friend_id, "friend added");
    Ok(Json(json!({
        "message": format!("Friend added! +{INVITE_BONUS_CREDITS} bonus credits"),
        "bonus_credits": INVITE_BONUS_CREDITS,
    })))
}
