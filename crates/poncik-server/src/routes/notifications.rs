//! Browser push subscriptions and delivery.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use poncik_core::integrations::PushPayload;
use poncik_core::models::PushSubscription;
use poncik_core::CoreError;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NotificationSend {
    pub user_id: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub icon: Option<String>,
}

pub async fn vapid_public_key(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "public_key": state.config.push.vapid_public_key }))
}

/// Stores the browser's subscription payload as-is.
pub async fn subscribe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(subscription): Json<Value>,
) -> ApiResult<Json<Value>> {
    let sub = PushSubscription {
        user_id: user.user_id,
        subscription,
        created_at: Utc::now(),
    };
    state.db.lock().await.upsert_push_subscription(&sub)?;
    Ok(Json(json!({ "success": true })))
}

pub async fn unsubscribe(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> ApiResult<Json<Value>> {
    state.db.lock().await.delete_push_subscription(&user.user_id)?;
    Ok(Json(json!({ "success": true })))
}

pub async fn send(
    State(state): State<AppState>,
    CurrentUser(_sender): CurrentUser,
    Json(body): Json<NotificationSend>,
) -> ApiResult<Json<Value>> {
    let target = state
        .db
        .lock()
        .await
        .get_push_subscription(&body.user_id)?
        .ok_or_else(|| CoreError::not_found("User not subscribed"))?;

    let payload = PushPayload {
        title: body.title,
        body: body.body,
        icon: body
            .icon
            .unwrap_or_else(|| state.config.push.default_icon.clone()),
    };
    state.push.send(&target.subscription, &payload).await?;
    Ok(Json(json!({ "success": true })))
}
