//! Process-local registry of open chat sockets.
//!
//! Created once by the server entry point, handed to handlers through
//! [`AppState`](crate::AppState) and drained on shutdown. Delivery is best
//! effort: a missing or broken socket is logged and skipped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::ws::Message;
use poncik_core::RealtimeEvent;
use tokio::sync::{mpsc, RwLock};

struct Connection {
    id: u64,
    tx: mpsc::UnboundedSender<Message>,
}

#[derive(Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<String, Connection>>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a socket for `user_id`, replacing any previous one. Returns
    /// the connection id and the queue the socket writer drains.
    pub async fn connect(&self, user_id: &str) -> (u64, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let previous = self
            .connections
            .write()
            .await
            .insert(user_id.to_string(), Connection { id, tx });
        if previous.is_some() {
            tracing::info!(user_id, "websocket replaced");
        } else {
            tracing::info!(user_id, "websocket connected");
        }
        (id, rx)
    }

    /// Removes the entry for `user_id` if it still belongs to `connection_id`.
    pub async fn disconnect(&self, user_id: &str, connection_id: u64) {
        let mut connections = self.connections.write().await;
        if connections.get(user_id).is_some_and(|c| c.id == connection_id) {
            connections.remove(user_id);
            tracing::info!(user_id, "websocket disconnected");
        }
    }

    pub async fn is_connected(&self, user_id: &str) -> bool {
        self.connections.read().await.contains_key(user_id)
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Queues `text` for `user_id`. Returns whether a live socket took it.
    pub async fn send(&self, user_id: &str, text: &str) -> bool {
        let connections = self.connections.read().await;
        let Some(conn) = connections.get(user_id) else {
            return false;
        };
        match conn.tx.send(Message::Text(text.to_string())) {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!(user_id, "delivery failed, socket closed");
                false
            }
        }
    }

    /// Sends `event` to every recipient with an open socket. Returns the
    /// number of sockets reached.
    pub async fn deliver(&self, recipients: &[String], event: &RealtimeEvent) -> usize {
        let text = match event.to_json() {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode realtime event");
                return 0;
            }
        };
        let mut delivered = 0;
        for user_id in recipients {
            if self.send(user_id, &text).await {
                delivered += 1;
            }
        }
        delivered
    }

    /// Asks every socket to close and empties the registry.
    pub async fn close_all(&self) {
        let drained: Vec<(String, Connection)> = self.connections.write().await.drain().collect();
        for (user_id, conn) in drained {
            if conn.tx.send(Message::Close(None)).is_err() {
                tracing::debug!(user_id, "socket already gone at shutdown");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use poncik_core::chat::ChatMessage;

    fn event() -> RealtimeEvent {
        RealtimeEvent::NewMessage {
            message: ChatMessage::new("friend_b", "user_a", "Ada", "hi", Utc::now()),
        }
    }

    #[tokio::test]
    async fn delivers_only_to_connected_users() {
        let registry = ConnectionRegistry::new();
        let (_, mut rx) = registry.connect("user_b").await;

        let delivered = registry
            .deliver(&["user_b".to_string(), "user_c".to_string()], &event())
            .await;
        assert_eq!(delivered, 1);

        match rx.recv().await {
            Some(Message::Text(text)) => assert!(text.contains("\"type\":\"new_message\"")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn stale_disconnect_keeps_newer_socket() {
        let registry = ConnectionRegistry::new();
        let (first, _rx1) = registry.connect("user_a").await;
        let (_second, _rx2) = registry.connect("user_a").await;
        registry.disconnect("user_a", first).await;
        assert!(registry.is_connected("user_a").await);
    }

    #[tokio::test]
    async fn close_all_drains_registry() {
        let registry = ConnectionRegistry::new();
        let (_, mut rx) = registry.connect("user_a").await;
        registry.close_all().await;
        assert!(registry.is_empty().await);
        assert!(matches!(rx.recv().await, Some(Message::Close(None))));
        assert!(rx.recv().await.is_none());
    }
}
