//! Shop catalog, purchases and the music track list.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use poncik_core::catalog::{MusicTrack, ShopItem};
use poncik_core::models::Purchase;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub item_id: String,
}

pub async fn items(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> ApiResult<Json<Vec<ShopItem>>> {
    let items = state.db.lock().await.shop_items()?;
    Ok(Json(items.into_iter().map(|i| i.with_lock_for(user.level)).collect()))
}

pub async fn purchase(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<PurchaseRequest>,
) -> ApiResult<Json<Value>> {
    let (purchase, item) = state
        .db
        .lock()
        .await
        .purchase_item(&user.user_id, &body.item_id, Utc::now())?;
    tracing::info!(user_id = %user.user_id, item_id = %item.item_id, price = purchase.price, "item purchased");
    Ok(Json(json!({
        "message": "Purchase successful",
        "item": item,
    })))
}

pub async fn purchases(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> ApiResult<Json<Vec<Purchase>>> {
    Ok(Json(state.db.lock().await.purchases(&user.user_id)?))
}

pub async fn music_tracks(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<MusicTrack>>> {
    let tracks = state.db.lock().await.music_tracks()?;
    Ok(Json(tracks.into_iter().map(|t| t.with_lock_for(user.level)).collect()))
}
