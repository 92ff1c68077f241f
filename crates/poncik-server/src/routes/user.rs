//! Profile settings and aggregate stats.

use axum::extract::State;
use axum::Json;
use poncik_core::models::{SettingsUpdate, UserStats, UserUpdate};
use poncik_core::User;

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::AppState;

pub async fn settings(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<SettingsUpdate>,
) -> ApiResult<Json<User>> {
    let update = UserUpdate::from(body);
    Ok(Json(state.db.lock().await.update_user(&user.user_id, &update)?))
}

pub async fn stats(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> ApiResult<Json<UserStats>> {
    Ok(Json(state.db.lock().await.user_stats(&user.user_id)?))
}
