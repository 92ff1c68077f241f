//! Per-user todo list.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use poncik_core::models::{short_id, Todo, TodoCreate, TodoUpdate};
use serde_json::{json, Value};

use super::required_text;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::AppState;

const LIST_LIMIT: usize = 100;

pub async fn list(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> ApiResult<Json<Vec<Todo>>> {
    Ok(Json(state.db.lock().await.list_todos(&user.user_id, LIST_LIMIT)?))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<TodoCreate>,
) -> ApiResult<(StatusCode, Json<Todo>)> {
    let todo = Todo {
        todo_id: format!("todo_{}", short_id()),
        user_id: user.user_id,
        text: required_text("text", &body.text)?,
        completed: false,
        created_at: Utc::now(),
    };
    state.db.lock().await.insert_todo(&todo)?;
    Ok((StatusCode::CREATED, Json(todo)))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(todo_id): Path<String>,
    Json(mut body): Json<TodoUpdate>,
) -> ApiResult<Json<Todo>> {
    if let Some(text) = &body.text {
        body.text = Some(required_text("text", text)?);
    }
    let todo = state
        .db
        .lock()
        .await
        .update_todo(&user.user_id, &todo_id, &body, Utc::now())?;
    Ok(Json(todo))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(todo_id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.db.lock().await.delete_todo(&user.user_id, &todo_id)?;
    Ok(Json(json!({ "message": "Todo deleted" })))
}
