//! Chat groups, messages and the realtime socket.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use poncik_core::chat::{
    check_group_quota, check_rate, ChatGroup, ChatMessage, ChatSend, GroupCreate, RATE_WINDOW,
};
use poncik_core::models::PublicProfile;
use poncik_core::{CoreError, RealtimeEvent};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::required_text;
use crate::auth::{credential_from_headers, resolve_user, CurrentUser};
use crate::error::{ApiError, ApiResult};
use crate::realtime::ConnectionRegistry;
use crate::AppState;

const MESSAGE_LIMIT: usize = 100;

#[derive(Debug, Serialize)]
pub struct GroupSummary {
    #[serde(flatten)]
    pub group: ChatGroup,
    pub members_count: usize,
}

pub async fn groups(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> ApiResult<Json<Vec<GroupSummary>>> {
    let groups = state.db.lock().await.groups_for_member(&user.user_id)?;
    Ok(Json(
        groups
            .into_iter()
            .map(|group| GroupSummary {
                members_count: group.members.len(),
                group,
            })
            .collect(),
    ))
}

pub async fn friends(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> ApiResult<Json<Vec<PublicProfile>>> {
    Ok(Json(state.db.lock().await.friends(&user.user_id)?))
}

pub async fn messages(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(chat_id): Path<String>,
) -> ApiResult<Json<Vec<ChatMessage>>> {
    Ok(Json(
        state
            .db
            .lock()
            .await
            .chat_messages(&chat_id, &user.user_id, MESSAGE_LIMIT)?,
    ))
}

/// Stores a message, then pushes it to every connected recipient.
pub async fn send(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<ChatSend>,
) -> ApiResult<Json<Value>> {
    let text = required_text("message", &body.message)?;
    let now = Utc::now();

    let (message, recipients) = {
        let db = state.db.lock().await;
        check_rate(db.count_messages_since(&user.user_id, now - RATE_WINDOW)?)?;

        let message = ChatMessage::new(&body.chat_id, &user.user_id, &user.name, &text, now);
        db.insert_message(&message)?;

        let recipients = db.chat_recipients(&body.chat_id)?;
        (message, recipients)
    };

    let event = RealtimeEvent::NewMessage {
        message: message.clone(),
    };
    let delivered = state.registry.deliver(&recipients, &event).await;
    tracing::debug!(chat_id = %message.chat_id, recipients = recipients.len(), delivered, "message sent");

    Ok(Json(json!({ "success": true, "message": message })))
}

pub async fn create_group(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<GroupCreate>,
) -> ApiResult<Json<Value>> {
    let name = required_text("name", &body.name)?;
    let now = Utc::now();

    let db = state.db.lock().await;
    check_group_quota(
        db.count_groups_created_by(&user.user_id)?,
        state.config.chat.free_group_limit,
        user.has_active_premium(now),
    )?;
    let group = ChatGroup::new(&name, &user.user_id, &body.member_ids, now);
    db.insert_group(&group)?;
    tracing::info!(user_id = %user.user_id, group_id = %group.group_id, "chat group created");

    Ok(Json(json!({ "success": true, "group": group })))
}

#[derive(Debug, Deserialize)]
pub struct SocketQuery {
    pub token: Option<String>,
}

/// Upgrades to the chat socket. The session must belong to the path user.
pub async fn socket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<SocketQuery>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let token = credential_from_headers(&headers)
        .or(query.token)
        .ok_or_else(|| ApiError::unauthenticated("Not authenticated"))?;
    let user = resolve_user(&state, &token).await?;
    if user.user_id != user_id {
        return Err(CoreError::Unauthenticated("Session does not match user".into()).into());
    }

    let registry = state.registry.clone();
    Ok(ws.on_upgrade(move |socket| run_socket(socket, user_id, registry)))
}

/// Drains the user's outbound queue into the socket. Inbound frames are
/// keep-alive only and are discarded.
async fn run_socket(socket: WebSocket, user_id: String, registry: Arc<ConnectionRegistry>) {
    let (mut sink, mut stream) = socket.split();
    let (connection_id, mut outbound) = registry.connect(&user_id).await;

    let writer = tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            let closing = matches!(message, Message::Close(_));
            if sink.send(message).await.is_err() || closing {
                break;
            }
        }
    });

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(user_id = %user_id, error = %e, "websocket read failed");
                break;
            }
        }
    }

    registry.disconnect(&user_id, connection_id).await;
    writer.abort();
}
