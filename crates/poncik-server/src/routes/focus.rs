//! Focus session lifecycle.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use poncik_core::error::ValidationError;
use poncik_core::models::{short_id, FocusEnd, FocusSession, FocusStart, FocusStatus};
use serde_json::{json, Value};

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::AppState;

const HISTORY_LIMIT: usize = 50;

pub async fn start(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<FocusStart>,
) -> ApiResult<Json<Value>> {
    if body.duration_minutes <= 0 {
        return Err(ValidationError::InvalidValue {
            field: "duration_minutes".into(),
            message: "must be positive".into(),
        }
        .into());
    }
    let session = FocusSession {
        session_id: format!("focus_{}", short_id()),
        user_id: user.user_id,
        duration_minutes: body.duration_minutes,
        started_at: Utc::now(),
        status: FocusStatus::Active,
        ended_at: None,
        actual_minutes: None,
        credits_earned: None,
        double_credits: None,
    };
    state.db.lock().await.insert_focus_session(&session)?;
    Ok(Json(json!({
        "session_id": session.session_id,
        "started_at": session.started_at,
    })))
}

pub async fn end(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<String>,
    Json(body): Json<FocusEnd>,
) -> ApiResult<Json<Value>> {
    let done = state.db.lock().await.complete_focus_session(
        &user.user_id,
        &session_id,
        body.actual_minutes,
        body.double_credits,
        Utc::now(),
    )?;
    Ok(Json(json!({
        "credits_earned": done.outcome.credits_earned,
        "xp_earned": done.outcome.xp_earned,
        "new_level": done.outcome.level,
        "streak_days": done.outcome.streak_days,
        "leveled_up": done.outcome.leveled_up_from(done.previous_level),
        "new_badges": done.new_badges,
    })))
}

pub async fn history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<FocusSession>>> {
    Ok(Json(state.db.lock().await.focus_history(&user.user_id, HISTORY_LIMIT)?))
}
