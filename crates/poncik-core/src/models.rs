//! Persistent entities and the request/update shapes that mutate them.
//!
//! Every mutable entity has an explicit update struct whose `None` fields
//! are left untouched, so a partial update can never write a field the
//! caller did not name.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Starting balance granted on first login.
pub const STARTING_CREDITS: i64 = 50;
/// Credits granted to the inviter when a friendship is created.
pub const INVITE_BONUS_CREDITS: i64 = 25;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customization {
    pub skin: String,
    pub outfit: String,
    pub accessory: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    pub credits: i64,
    pub level: i64,
    pub xp: i64,
    pub streak_days: i64,
    pub last_study_date: Option<NaiveDate>,
    pub total_focus_minutes: i64,
    pub owned_items: Vec<String>,
    pub active_theme: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub is_premium: bool,
    pub premium_expires_at: Option<DateTime<Utc>>,
    pub owned_customization: Vec<String>,
    pub customization: Option<Customization>,
    #[serde(skip_serializing, default)]
    pub spotify_access_token: Option<String>,
    #[serde(skip_serializing, default)]
    pub spotify_refresh_token: Option<String>,
}

impl User {
    /// A freshly registered account.
    pub fn new(email: &str, name: &str, picture: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: format!("user_{}", short_id()),
            email: email.to_string(),
            name: name.to_string(),
            picture,
            credits: STARTING_CREDITS,
            level: 1,
            xp: 0,
            streak_days: 0,
            last_study_date: None,
            total_focus_minutes: 0,
            owned_items: Vec::new(),
            active_theme: "light".to_string(),
            language: "tr".to_string(),
            created_at: now,
            is_premium: false,
            premium_expires_at: None,
            owned_customization: Vec::new(),
            customization: None,
            spotify_access_token: None,
            spotify_refresh_token: None,
        }
    }

    /// Premium is active when flagged and either open-ended or not yet expired.
    pub fn has_active_premium(&self, now: DateTime<Utc>) -> bool {
        if !self.is_premium {
            return false;
        }
        match self.premium_expires_at {
            Some(expires) => expires >= now,
            None => true,
        }
    }
}

/// Named-field update for a user row. `None` leaves the column alone.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub picture: Option<Option<String>>,
    pub credits: Option<i64>,
    pub level: Option<i64>,
    pub xp: Option<i64>,
    pub streak_days: Option<i64>,
    pub last_study_date: Option<NaiveDate>,
    pub total_focus_minutes: Option<i64>,
    pub owned_items: Option<Vec<String>>,
    pub active_theme: Option<String>,
    pub language: Option<String>,
    pub is_premium: Option<bool>,
    pub premium_expires_at: Option<Option<DateTime<Utc>>>,
    pub owned_customization: Option<Vec<String>>,
    pub customization: Option<Customization>,
    pub spotify_access_token: Option<String>,
    pub spotify_refresh_token: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.picture.is_none()
            && self.credits.is_none()
            && self.level.is_none()
            && self.xp.is_none()
            && self.streak_days.is_none()
            && self.last_study_date.is_none()
            && self.total_focus_minutes.is_none()
            && self.owned_items.is_none()
            && self.active_theme.is_none()
            && self.language.is_none()
            && self.is_premium.is_none()
            && self.premium_expires_at.is_none()
            && self.owned_customization.is_none()
            && self.customization.is_none()
            && self.spotify_access_token.is_none()
            && self.spotify_refresh_token.is_none()
    }
}

/// User-editable preferences.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub language: Option<String>,
    pub active_theme: Option<String>,
}

impl From<SettingsUpdate> for UserUpdate {
    fn from(s: SettingsUpdate) -> Self {
        UserUpdate {
            language: s.language,
            active_theme: s.active_theme,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user_id: String,
    pub session_token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todo {
    pub todo_id: String,
    pub user_id: String,
    pub text: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TodoCreate {
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TodoUpdate {
    pub text: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusStatus {
    Active,
    Completed,
}

impl FocusStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FocusStatus::Active => "active",
            FocusStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "completed" => FocusStatus::Completed,
            _ => FocusStatus::Active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusSession {
    pub session_id: String,
    pub user_id: String,
    pub duration_minutes: i64,
    pub started_at: DateTime<Utc>,
    pub status: FocusStatus,
    pub ended_at: Option<DateTime<Utc>>,
    pub actual_minutes: Option<i64>,
    pub credits_earned: Option<i64>,
    pub double_credits: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FocusStart {
    #[serde(default = "default_focus_minutes")]
    pub duration_minutes: i64,
}

fn default_focus_minutes() -> i64 {
    25
}

#[derive(Debug, Clone, Deserialize)]
pub struct FocusEnd {
    pub actual_minutes: i64,
    #[serde(default)]
    pub double_credits: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    pub purchase_id: String,
    pub user_id: String,
    pub item_id: String,
    pub price: i64,
    pub purchased_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Friendship {
    pub friendship_id: String,
    pub user_id: String,
    pub friend_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Public projection of a user shown on leaderboards and friend lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicProfile {
    pub user_id: String,
    pub name: String,
    pub picture: Option<String>,
    pub level: i64,
    pub total_focus_minutes: i64,
    pub streak_days: i64,
}

/// Append-only record of an unlocked badge or claimed achievement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Award {
    pub user_id: String,
    pub award_id: String,
    pub earned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStats {
    pub total_sessions: i64,
    pub total_focus_minutes: i64,
    pub total_purchases: i64,
    pub total_friends: i64,
    pub total_badges: i64,
    pub credits: i64,
    pub level: i64,
    pub xp: i64,
    pub streak_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushSubscription {
    pub user_id: String,
    pub subscription: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PremiumSubscription {
    pub subscription_id: String,
    pub user_id: String,
    pub plan: String,
    pub status: String,
    pub provider_subscription_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Twelve hex characters of a fresh v4 uuid, used as id suffix.
pub fn short_id() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    hex[..12].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn new_user_starts_at_level_one_with_bonus_credits() {
        let user = User::new("a@b.c", "Ada", None, Utc::now());
        assert!(user.user_id.starts_with("user_"));
        assert_eq!(user.user_id.len(), "user_".len() + 12);
        assert_eq!(user.credits, STARTING_CREDITS);
        assert_eq!(user.level, 1);
        assert_eq!(user.xp, 0);
        assert!(user.last_study_date.is_none());
    }

    #[test]
    fn premium_requires_flag_and_unexpired_date() {
        let now = Utc::now();
        let mut user = User::new("a@b.c", "Ada", None, now);
        assert!(!user.has_active_premium(now));

        user.is_premium = true;
        assert!(user.has_active_premium(now));

        user.premium_expires_at = Some(now - Duration::days(1));
        assert!(!user.has_active_premium(now));

        user.premium_expires_at = Some(now + Duration::days(1));
        assert!(user.has_active_premium(now));
    }

    #[test]
    fn oauth_tokens_are_not_serialized() {
        let mut user = User::new("a@b.c", "Ada", None, Utc::now());
        user.spotify_access_token = Some("secret".into());
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("spotify_access_token").is_none());
        assert_eq!(json["last_study_date"], serde_json::Value::Null);
    }

    #[test]
    fn settings_update_only_touches_preferences() {
        let update: UserUpdate = SettingsUpdate {
            language: Some("en".into()),
            active_theme: None,
        }
        .into();
        assert_eq!(update.language.as_deref(), Some("en"));
        assert!(update.active_theme.is_none());
        assert!(update.credits.is_none());
        assert!(!update.is_empty());
        assert!(UserUpdate::default().is_empty());
    }

    #[test]
    fn focus_start_defaults_to_pomodoro_length() {
        let start: FocusStart = serde_json::from_str("{}").unwrap();
        assert_eq!(start.duration_minutes, 25);
    }
}
