//! Drives the full router over a real socket.

use std::sync::Arc;

use axum::extract::ws::Message;
use chrono::Utc;
use poncik_core::premium::sign_webhook_payload;
use poncik_core::{Config, Database};
use poncik_server::{app, AppState, ConnectionRegistry};
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::StatusCode;
use serde_json::{json, Value};

const WEBHOOK_SECRET: &str = "whsec_test";

fn test_config() -> Config {
    let mut config = Config::default();
    config.auth.allow_test_login = true;
    config.auth.secure_cookie = false;
    config.payments.webhook_secret = WEBHOOK_SECRET.into();
    config.server.cors_origins = vec!["http://localhost:3000".into()];
    config
}

async fn spawn_with(config: Config) -> String {
    spawn_with_registry(config, Arc::new(ConnectionRegistry::new())).await
}

async fn spawn_with_registry(config: Config, registry: Arc<ConnectionRegistry>) -> String {
    let db = Database::open_memory().unwrap();
    let state = AppState::new(db, config, registry);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app(state)).await.unwrap();
    });
    format!("http://{addr}")
}

async fn spawn() -> String {
    spawn_with(test_config()).await
}

/// Logged-in test account: returns the cookie pair and the user body.
async fn login(client: &reqwest::Client, base: &str) -> (String, Value) {
    let resp = client
        .post(format!("{base}/api/auth/test-login"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp
        .headers()
        .get(SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    let user: Value = resp.json().await.unwrap();
    (cookie, user)
}

#[tokio::test]
async fn health_and_root() {
    let base = spawn().await;
    let client = reqwest::Client::new();

    let health: Value = client
        .get(format!("{base}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["users_count"], 0);

    let resp = client.get(format!("{base}/api/")).send().await.unwrap();
    assert!(resp.headers().contains_key("x-request-id"));
    let root: Value = resp.json().await.unwrap();
    assert_eq!(root["message"], "PoncikFocus API");
}

#[tokio::test]
async fn protected_routes_require_session() {
    let base = spawn().await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/api/auth/me")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["detail"], "Not authenticated");

    let resp = client
        .get(format!("{base}/api/todos"))
        .header(COOKIE, "session_token=session_bogus")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_disabled_is_not_found() {
    let mut config = test_config();
    config.auth.allow_test_login = false;
    let base = spawn_with(config).await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/api/auth/test-login"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn session_lifecycle() {
    let base = spawn().await;
    let client = reqwest::Client::new();
    let (cookie, user) = login(&client, &base).await;
    assert_eq!(user["credits"], 1000);
    assert_eq!(user["level"], 5);

    let me: Value = client
        .get(format!("{base}/api/auth/me"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["user_id"], user["user_id"]);

    let token = cookie.trim_start_matches("session_token=");
    let resp = client
        .get(format!("{base}/api/auth/me"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(format!("{base}/api/auth/logout"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{base}/api/auth/me"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn identity_login_creates_user_once() {
    let mut identity = mockito::Server::new_async().await;
    identity
        .mock("GET", "/session-data")
        .match_header("x-session-id", "sid_ok")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"email":"ada@example.com","name":"Ada","session_token":"session_from_identity"}"#)
        .expect(2)
        .create_async()
        .await;

    let mut config = test_config();
    config.auth.identity_url = format!("{}/session-data", identity.url());
    let base = spawn_with(config).await;
    let client = reqwest::Client::new();

    let mut ids = Vec::new();
    for _ in 0..2 {
        let resp = client
            .post(format!("{base}/api/auth/session"))
            .json(&json!({ "session_id": "sid_ok" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let cookie = resp.headers().get(SET_COOKIE).unwrap().to_str().unwrap().to_string();
        assert!(cookie.starts_with("session_token=session_from_identity;"));
        let user: Value = resp.json().await.unwrap();
        ids.push(user["user_id"].as_str().unwrap().to_string());
    }
    assert_eq!(ids[0], ids[1]);

    let resp = client
        .post(format!("{base}/api/auth/session"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn todo_crud() {
    let base = spawn().await;
    let client = reqwest::Client::new();
    let (cookie, _) = login(&client, &base).await;

    let resp = client
        .post(format!("{base}/api/todos"))
        .header(COOKIE, &cookie)
        .json(&json!({ "text": "Read chapter 3" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let todo: Value = resp.json().await.unwrap();
    let todo_id = todo["todo_id"].as_str().unwrap();

    let updated: Value = client
        .put(format!("{base}/api/todos/{todo_id}"))
        .header(COOKIE, &cookie)
        .json(&json!({ "completed": true }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["completed"], true);
    assert_eq!(updated["text"], "Read chapter 3");

    let resp = client
        .delete(format!("{base}/api/todos/{todo_id}"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .delete(format!("{base}/api/todos/{todo_id}"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let list: Vec<Value> = client
        .get(format!("{base}/api/todos"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(list.is_empty());
}

#[tokio::test]
async fn focus_session_rewards() {
    let base = spawn().await;
    let client = reqwest::Client::new();
    let (cookie, _) = login(&client, &base).await;

    let started: Value = client
        .post(format!("{base}/api/focus/start"))
        .header(COOKIE, &cookie)
        .json(&json!({ "duration_minutes": 25 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let session_id = started["session_id"].as_str().unwrap();

    let ended: Value = client
        .post(format!("{base}/api/focus/end/{session_id}"))
        .header(COOKIE, &cookie)
        .json(&json!({ "actual_minutes": 25, "double_credits": true }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ended["credits_earned"], 50);
    assert_eq!(ended["xp_earned"], 250);
    assert_eq!(ended["leveled_up"], false);

    let resp = client
        .post(format!("{base}/api/focus/end/{session_id}"))
        .header(COOKIE, &cookie)
        .json(&json!({ "actual_minutes": 25 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .post(format!("{base}/api/focus/start"))
        .header(COOKIE, &cookie)
        .json(&json!({ "duration_minutes": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let stats: Value = client
        .get(format!("{base}/api/user/stats"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["total_sessions"], 1);
    assert_eq!(stats["credits"], 1050);
    assert_eq!(stats["total_focus_minutes"], 275);
}

#[tokio::test]
async fn shop_purchase_and_ownership() {
    let base = spawn().await;
    let client = reqwest::Client::new();
    let (cookie, _) = login(&client, &base).await;

    let items: Vec<Value> = client
        .get(format!("{base}/api/shop/items"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(items.len(), 20);

    let resp = client
        .post(format!("{base}/api/shop/purchase"))
        .header(COOKIE, &cookie)
        .json(&json!({ "item_id": "latte" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Purchase successful");

    // repeat purchases are allowed; ownership stays a set
    let resp = client
        .post(format!("{base}/api/shop/purchase"))
        .header(COOKIE, &cookie)
        .json(&json!({ "item_id": "latte" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(format!("{base}/api/shop/purchase"))
        .header(COOKIE, &cookie)
        .json(&json!({ "item_id": "no_such_item" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let purchases: Vec<Value> = client
        .get(format!("{base}/api/shop/purchases"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(purchases.len(), 2);
    assert_eq!(purchases[0]["price"], 30);

    let me: Value = client
        .get(format!("{base}/api/auth/me"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["credits"], 940);
    assert_eq!(me["owned_items"], json!(["latte"]));
}

#[tokio::test]
async fn quests_cannot_be_claimed_early() {
    let base = spawn().await;
    let client = reqwest::Client::new();
    let (cookie, _) = login(&client, &base).await;

    let quests: Vec<Value> = client
        .get(format!("{base}/api/quests/daily"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(quests.len(), 3);
    let quest_id = quests[0]["quest_id"].as_str().unwrap();

    let resp = client
        .post(format!("{base}/api/quests/claim/{quest_id}"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn webhook_activates_premium() {
    let base = spawn().await;
    let client = reqwest::Client::new();
    let (cookie, user) = login(&client, &base).await;
    let user_id = user["user_id"].as_str().unwrap();

    let event = serde_json::to_vec(&json!({
        "type": "checkout.session.completed",
        "data": { "object": {
            "subscription": "sub_1",
            "metadata": { "user_id": user_id, "plan": "monthly" }
        }}
    }))
    .unwrap();

    let resp = client
        .post(format!("{base}/api/premium/webhook"))
        .header("stripe-signature", "t=1,v1=deadbeef")
        .body(event.clone())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let signature = sign_webhook_payload(&event, WEBHOOK_SECRET, Utc::now().timestamp()).unwrap();
    let resp = client
        .post(format!("{base}/api/premium/webhook"))
        .header("stripe-signature", signature)
        .body(event)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let status: Value = client
        .get(format!("{base}/api/premium/status"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["is_premium"], true);
    assert!(status["expires_at"].is_string());
}

#[tokio::test]
async fn chat_rate_limit() {
    let base = spawn().await;
    let client = reqwest::Client::new();
    let (cookie, _) = login(&client, &base).await;

    let mut statuses = Vec::new();
    for i in 0..4 {
        let resp = client
            .post(format!("{base}/api/chat/send"))
            .header(COOKIE, &cookie)
            .json(&json!({ "chat_id": "lobby", "message": format!("hello {i}") }))
            .send()
            .await
            .unwrap();
        statuses.push(resp.status());
    }
    assert_eq!(
        statuses,
        vec![
            StatusCode::OK,
            StatusCode::OK,
            StatusCode::OK,
            StatusCode::TOO_MANY_REQUESTS
        ]
    );

    let messages: Vec<Value> = client
        .get(format!("{base}/api/chat/messages/lobby"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(messages.len(), 3);
}

#[tokio::test]
async fn cors_preflight() {
    let base = spawn().await;
    let resp = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, format!("{base}/api/todos"))
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "POST")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        resp.headers()["access-control-allow-origin"],
        "http://localhost:3000"
    );
    assert_eq!(resp.headers()["access-control-allow-credentials"], "true");
}

fn pushed_event(queue: &mut tokio::sync::mpsc::UnboundedReceiver<Message>) -> Option<Value> {
    match queue.try_recv().ok()? {
        Message::Text(text) => serde_json::from_str(&text).ok(),
        _ => None,
    }
}

#[tokio::test]
async fn chat_messages_reach_connected_recipients() {
    let registry = Arc::new(ConnectionRegistry::new());
    let base = spawn_with_registry(test_config(), registry.clone()).await;
    let client = reqwest::Client::new();
    let (owner_cookie, _) = login(&client, &base).await;
    let (_, member) = login(&client, &base).await;
    let (_, outsider) = login(&client, &base).await;
    let member_id = member["user_id"].as_str().unwrap();
    let outsider_id = outsider["user_id"].as_str().unwrap();

    let (_, mut member_queue) = registry.connect(member_id).await;
    let (_, mut outsider_queue) = registry.connect(outsider_id).await;

    let created: Value = client
        .post(format!("{base}/api/chat/groups/create"))
        .header(COOKIE, &owner_cookie)
        .json(&json!({ "name": "finals", "member_ids": [member_id] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let group_id = created["group"]["group_id"].as_str().unwrap();

    let resp = client
        .post(format!("{base}/api/chat/send"))
        .header(COOKIE, &owner_cookie)
        .json(&json!({ "chat_id": format!("group_{group_id}"), "message": "library at 6?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let event = pushed_event(&mut member_queue).unwrap();
    assert_eq!(event["type"], "new_message");
    assert_eq!(event["message"]["message"], "library at 6?");
    assert!(pushed_event(&mut outsider_queue).is_none());

    client
        .post(format!("{base}/api/chat/send"))
        .header(COOKIE, &owner_cookie)
        .json(&json!({ "chat_id": format!("friend_{outsider_id}"), "message": "hey" }))
        .send()
        .await
        .unwrap();
    let event = pushed_event(&mut outsider_queue).unwrap();
    assert_eq!(event["message"]["chat_id"], format!("friend_{outsider_id}"));
    assert!(pushed_event(&mut member_queue).is_none());

    client
        .post(format!("{base}/api/chat/send"))
        .header(COOKIE, &owner_cookie)
        .json(&json!({ "chat_id": "lobby", "message": "anyone?" }))
        .send()
        .await
        .unwrap();
    assert!(pushed_event(&mut member_queue).is_none());
    assert!(pushed_event(&mut outsider_queue).is_none());
}
