//! Route table. Everything except `/health` and the chat socket lives under
//! `/api`.

mod auth;
mod chat;
mod community;
mod customization;
mod focus;
mod music;
mod notifications;
mod premium;
mod rewards;
mod shop;
mod system;
mod todos;
mod user;

use axum::routing::{get, post, put};
use axum::Router;
use poncik_core::error::ValidationError;
use poncik_core::CoreError;

use crate::AppState;

/// Trimmed non-empty text, or a `<field> required` validation error.
pub(crate) fn required_text(field: &str, value: &str) -> Result<String, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Missing(field.to_string()).into());
    }
    Ok(trimmed.to_string())
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/", get(system::root))
        // auth
        .route("/auth/session", post(auth::create_session))
        .route("/auth/test-login", post(auth::test_login))
        .route("/auth/me", get(auth::me))
        .route("/auth/logout", post(auth::logout))
        // todos
        .route("/todos", get(todos::list).post(todos::create))
        .route("/todos/:todo_id", put(todos::update).delete(todos::delete))
        // focus
        .route("/focus/start", post(focus::start))
        .route("/focus/end/:session_id", post(focus::end))
        .route("/focus/history", get(focus::history))
        // shop and music catalog
        .route("/shop/items", get(shop::items))
        .route("/shop/purchase", post(shop::purchase))
        .route("/shop/purchases", get(shop::purchases))
        .route("/music/tracks", get(shop::music_tracks))
        // community
        .route("/community/leaderboard", get(community::leaderboard))
        .route("/community/friends", get(community::friends))
        .route("/community/invite", post(community::invite))
        // rewards
        .route("/badges", get(rewards::badges))
        .route("/badges/earned", get(rewards::earned_badges))
        .route("/quests/daily", get(rewards::daily_quests))
        .route("/quests/claim/:quest_id", post(rewards::claim_quest))
        .route("/achievements", get(rewards::achievements))
        .route("/achievements/claim/:achievement_id", post(rewards::claim_achievement))
        // user
        .route("/user/settings", put(user::settings))
        .route("/user/stats", get(user::stats))
        // customization
        .route("/customization/purchase", post(customization::purchase))
        .route("/customization/equip", post(customization::equip))
        .route("/customization/owned", get(customization::owned))
        // chat
        .route("/chat/groups", get(chat::groups))
        .route("/chat/groups/create", post(chat::create_group))
        .route("/chat/friends", get(chat::friends))
        .route("/chat/messages/:chat_id", get(chat::messages))
        .route("/chat/send", post(chat::send))
        // premium
        .route("/premium/subscribe", post(premium::subscribe))
        .route("/premium/webhook", post(premium::webhook))
        .route("/premium/status", get(premium::status))
        // notifications
        .route("/notifications/vapid-public-key", get(notifications::vapid_public_key))
        .route("/notifications/subscribe", post(notifications::subscribe))
        .route("/notifications/unsubscribe", post(notifications::unsubscribe))
        .route("/notifications/send", post(notifications::send))
        // music provider
        .route("/spotify/authorize", get(music::authorize))
        .route("/spotify/callback", post(music::callback))
        .route("/spotify/token", get(music::token))
        .route("/spotify/refresh", post(music::refresh));

    Router::new()
        .route("/health", get(system::health))
        .route("/ws/chat/:user_id", get(chat::socket))
        .nest("/api", api)
        .with_state(state)
}
