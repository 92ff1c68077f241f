//! Service banner and health check.

use axum::extract::State;
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::AppState;

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "PoncikFocus API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn health(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let users_count = state.db.lock().await.count_users()?;
    Ok(Json(json!({
        "status": "healthy",
        "users_count": users_count,
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    })))
}
