//! Avatar customization shop and outfit.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use poncik_core::models::Customization;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::AppState;

/// Any client-sent price is ignored; the catalog price is charged.
#[derive(Debug, Deserialize)]
pub struct CustomizationPurchase {
    pub item_id: String,
}

pub async fn purchase(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<CustomizationPurchase>,
) -> ApiResult<Json<Value>> {
    let updated = state
        .db
        .lock()
        .await
        .purchase_customization(&user.user_id, &body.item_id, Utc::now())?;
    tracing::info!(user_id = %user.user_id, item_id = %body.item_id, "customization purchased");
    Ok(Json(json!({
        "success": true,
        "item_id": body.item_id,
        "credits": updated.credits,
    })))
}

pub async fn equip(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<Customization>,
) -> ApiResult<Json<Value>> {
    let updated = state.db.lock().await.equip_customization(&user.user_id, &body)?;
    Ok(Json(json!({
        "success": true,
        "customization": updated.customization,
    })))
}

pub async fn owned(CurrentUser(user): CurrentUser) -> Json<Value> {
    Json(json!({ "owned": user.owned_customization }))
}
