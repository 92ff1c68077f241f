//! Chat messages, groups and addressing rules.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Messages a sender may post inside [`RATE_WINDOW`].
pub const RATE_LIMIT: usize = 3;
/// Trailing window used by the anti-spam check.
pub const RATE_WINDOW: Duration = Duration::seconds(5);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub message_id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(chat_id: &str, sender_id: &str, sender_name: &str, message: &str, now: DateTime<Utc>) -> Self {
        Self {
            message_id: uuid::Uuid::new_v4().to_string(),
            chat_id: chat_id.to_string(),
            sender_id: sender_id.to_string(),
            sender_name: sender_name.to_string(),
            message: message.to_string(),
            read: false,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatSend {
    pub chat_id: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatGroup {
    pub group_id: String,
    pub name: String,
    pub members: Vec<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl ChatGroup {
    /// New group with the creator listed first, duplicates dropped.
    pub fn new(name: &str, creator: &str, member_ids: &[String], now: DateTime<Utc>) -> Self {
        let mut members = vec![creator.to_string()];
        for id in member_ids {
            if !members.contains(id) {
                members.push(id.clone());
            }
        }
        Self {
            group_id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            members,
            created_by: creator.to_string(),
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupCreate {
    pub name: String,
    #[serde(default)]
    pub member_ids: Vec<String>,
}

/// Recipient set encoded in a chat id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatTarget {
    /// `group_<group_id>`: every member of the group.
    Group(String),
    /// `friend_<user_id>`: a single peer.
    Friend(String),
    /// Any other id is stored but delivered to nobody.
    Unaddressed,
}

impl ChatTarget {
    pub fn parse(chat_id: &str) -> Self {
        if let Some(group_id) = chat_id.strip_prefix("group_") {
            ChatTarget::Group(group_id.to_string())
        } else if let Some(user_id) = chat_id.strip_prefix("friend_") {
            ChatTarget::Friend(user_id.to_string())
        } else {
            ChatTarget::Unaddressed
        }
    }
}

/// Fails when the sender already has [`RATE_LIMIT`] messages in the window.
pub fn check_rate(recent_in_window: usize) -> Result<()> {
    if recent_in_window >= RATE_LIMIT {
        return Err(CoreError::RateLimited("Too many messages".into()));
    }
    Ok(())
}

/// Free users may create up to `limit` groups; premium users are unlimited.
pub fn check_group_quota(created: i64, limit: i64, premium_active: bool) -> Result<()> {
    if !premium_active && created >= limit {
        return Err(CoreError::Locked("Group limit reached. Upgrade to premium.".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_ids_resolve_targets() {
        assert_eq!(ChatTarget::parse("group_abc"), ChatTarget::Group("abc".into()));
        assert_eq!(ChatTarget::parse("friend_user_1"), ChatTarget::Friend("user_1".into()));
        assert_eq!(ChatTarget::parse("lobby"), ChatTarget::Unaddressed);
    }

    #[test]
    fn fourth_message_in_window_is_rejected() {
        for recent in 0..RATE_LIMIT {
            assert!(check_rate(recent).is_ok());
        }
        let err = check_rate(3).unwrap_err();
        assert!(matches!(err, CoreError::RateLimited(_)));
    }

    #[test]
    fn group_lists_creator_first_once() {
        let g = ChatGroup::new(
            "study",
            "user_a",
            &["user_b".into(), "user_a".into(), "user_b".into()],
            Utc::now(),
        );
        assert_eq!(g.members, vec!["user_a", "user_b"]);
        assert_eq!(g.created_by, "user_a");
    }

    #[test]
    fn premium_lifts_group_quota() {
        assert!(check_group_quota(2, 3, false).is_ok());
        assert!(matches!(check_group_quota(3, 3, false), Err(CoreError::Locked(_))));
        assert!(check_group_quota(30, 3, true).is_ok());
    }
}
