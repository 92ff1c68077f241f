//! Badges, daily quests and achievements.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use poncik_core::models::Award;
use poncik_core::quests::Quest;
use poncik_core::unlocks::{achievement_progress, AchievementProgress, Badge, BADGES};
use serde_json::{json, Value};

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::AppState;

pub async fn badges() -> Json<&'static [Badge]> {
    Json(BADGES)
}

pub async fn earned_badges(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> ApiResult<Json<Vec<Award>>> {
    Ok(Json(state.db.lock().await.earned_badges(&user.user_id)?))
}

pub async fn daily_quests(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<Quest>>> {
    let now = Utc::now();
    let set = state.db.lock().await.daily_quests(&user.user_id, now.date_naive(), now)?;
    Ok(Json(set.quests))
}

pub async fn claim_quest(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(quest_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let today = Utc::now().date_naive();
    let reward = state.db.lock().await.claim_quest(&user.user_id, today, &quest_id)?;
    Ok(Json(json!({
        "message": "Quest completed!",
        "credits_earned": reward.credits,
        "xp_earned": reward.xp,
    })))
}

pub async fn achievements(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<AchievementProgress>>> {
    let db = state.db.lock().await;
    let metrics = db.user_metrics(&user.user_id)?;
    let earned = db.earned_achievement_ids(&user.user_id)?;
    Ok(Json(achievement_progress(&metrics, &earned)))
}

pub async fn claim_achievement(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(achievement_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let reward = state
        .db
        .lock()
        .await
        .claim_achievement(&user.user_id, &achievement_id, Utc::now())?;
    Ok(Json(json!({
        "message": "Achievement claimed!",
        "credits_earned": reward,
    })))
}
