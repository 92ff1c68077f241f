use serde::{Deserialize, Serialize};

use crate::chat::ChatMessage;

/// Envelope pushed to connected clients over the realtime socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RealtimeEvent {
    NewMessage { message: ChatMessage },
}

impl RealtimeEvent {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn new_message_envelope_shape() {
        let msg = ChatMessage::new("friend_user_b", "user_a", "Ada", "hi", Utc::now());
        let json: serde_json::Value =
            serde_json::from_str(&RealtimeEvent::NewMessage { message: msg }.to_json().unwrap())
                .unwrap();
        assert_eq!(json["type"], "new_message");
        assert_eq!(json["message"]["message"], "hi");
        assert_eq!(json["message"]["chat_id"], "friend_user_b");
    }
}
