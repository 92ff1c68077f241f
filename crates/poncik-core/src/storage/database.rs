//! SQLite-backed document store.
//!
//! Provides persistent storage for:
//! - Users, login sessions and todos
//! - Focus sessions and the progression they produce
//! - Shop and music catalogs, the purchase ledger and customization
//! - Friendships, badges, achievements and daily quests
//! - Chat messages and groups
//! - Premium subscriptions and browser push subscriptions
//!
//! Lists and nested documents are stored as JSON text columns. Timestamps
//! are RFC 3339 UTC strings with a fixed precision so they sort
//! lexicographically.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;

use super::migrations;
use super::Config;
use crate::catalog::{
    self, add_owned, check_customization_purchase, check_purchase, find_customization,
    CustomizationKind, MusicTrack, ShopItem,
};
use crate::chat::{ChatGroup, ChatMessage, ChatTarget};
use crate::error::{CoreError, DatabaseError, Result, ValidationError};
use crate::models::{
    AuthSession, Award, Customization, FocusSession, FocusStatus, Friendship, PremiumSubscription,
    PublicProfile, Purchase, PushSubscription, Todo, TodoUpdate, User, UserStats, UserUpdate,
    INVITE_BONUS_CREDITS,
};
use crate::premium::Plan;
use crate::progression::{self, SessionOutcome};
use crate::quests::{DailyQuestSet, QuestReward, QuestType};
use crate::unlocks::{self, UserMetrics};

const USER_COLUMNS: &str = "user_id, email, name, picture, credits, level, xp, streak_days,
    last_study_date, total_focus_minutes, owned_items, active_theme, language, created_at,
    is_premium, premium_expires_at, owned_customization, customization,
    spotify_access_token, spotify_refresh_token";

const FOCUS_COLUMNS: &str = "session_id, user_id, duration_minutes, started_at, status,
    ended_at, actual_minutes, credits_earned, double_credits";

const MESSAGE_COLUMNS: &str =
    "message_id, chat_id, sender_id, sender_name, message, read, created_at";

/// Result of finalizing a focus session.
#[derive(Debug, Clone)]
pub struct FocusCompletion {
    pub outcome: SessionOutcome,
    pub previous_level: i64,
    pub new_badges: Vec<&'static str>,
}

/// SQLite database holding every collection of the backend.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database configured in `config`, defaulting to
    /// `~/.config/poncik/poncik.db`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(config: &Config) -> Result<Self> {
        let path = config.database_path()?;
        Self::open_at(&path)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        migrations::migrate(&self.conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        self.seed_catalogs()
    }

    pub fn schema_version(&self) -> i32 {
        migrations::get_schema_version(&self.conn)
    }

    fn seed_catalogs(&self) -> Result<()> {
        let shop_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM shop_items", [], |row| row.get(0))?;
        if shop_count == 0 {
            let tx = self.conn.unchecked_transaction()?;
            for item in catalog::default_shop_items() {
                tx.execute(
                    "INSERT INTO shop_items (item_id, name_tr, name_en, description_tr,
                        description_en, price, category, image_url, unlock_level)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        item.item_id,
                        item.name_tr,
                        item.name_en,
                        item.description_tr,
                        item.description_en,
                        item.price,
                        item.category,
                        item.image_url,
                        item.unlock_level,
                    ],
                )?;
            }
            tx.commit()?;
            tracing::info!("seeded shop catalog");
        }

        let track_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM music_tracks", [], |row| row.get(0))?;
        if track_count == 0 {
            let tx = self.conn.unchecked_transaction()?;
            for track in catalog::default_music_tracks() {
                tx.execute(
                    "INSERT INTO music_tracks (track_id, name, artist, url, category, unlock_level)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        track.track_id,
                        track.name,
                        track.artist,
                        track.url,
                        track.category,
                        track.unlock_level,
                    ],
                )?;
            }
            tx.commit()?;
            tracing::info!("seeded music catalog");
        }
        Ok(())
    }

    // ── users ────────────────────────────────────────────────────────────

    pub fn insert_user(&self, user: &User) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO users ({USER_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                         ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)"
            ),
            params![
                user.user_id,
                user.email,
                user.name,
                user.picture,
                user.credits,
                user.level,
                user.xp,
                user.streak_days,
                user.last_study_date.map(|d| d.to_string()),
                user.total_focus_minutes,
                to_json(&user.owned_items)?,
                user.active_theme,
                user.language,
                ts(&user.created_at),
                user.is_premium,
                user.premium_expires_at.as_ref().map(ts),
                to_json(&user.owned_customization)?,
                user.customization.as_ref().map(to_json).transpose()?,
                user.spotify_access_token,
                user.spotify_refresh_token,
            ],
        )?;
        Ok(())
    }

    pub fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        query_user(&self.conn, user_id)
    }

    /// Like [`get_user`](Self::get_user) but a missing row is an error.
    pub fn require_user(&self, user_id: &str) -> Result<User> {
        self.get_user(user_id)?
            .ok_or_else(|| CoreError::not_found("User not found"))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email],
                user_from_row,
            )
            .optional()?)
    }

    /// Applies the named fields of `update` and returns the stored user.
    pub fn update_user(&self, user_id: &str, update: &UserUpdate) -> Result<User> {
        apply_user_update(&self.conn, user_id, update)?;
        self.require_user(user_id)
    }

    pub fn count_users(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?)
    }

    /// Finds the account for `email`, refreshing its profile, or creates one.
    pub fn upsert_identity(
        &self,
        email: &str,
        name: &str,
        picture: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<User> {
        match self.get_user_by_email(email)? {
            Some(existing) => self.update_user(
                &existing.user_id,
                &UserUpdate {
                    name: Some(name.to_string()),
                    picture: Some(picture),
                    ..Default::default()
                },
            ),
            None => {
                let user = User::new(email, name, picture, now);
                self.insert_user(&user)?;
                tracing::info!(user_id = %user.user_id, "registered new user");
                Ok(user)
            }
        }
    }

    /// Top users by cumulative focus minutes.
    pub fn leaderboard(&self, limit: usize) -> Result<Vec<PublicProfile>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, name, picture, level, total_focus_minutes, streak_days
             FROM users ORDER BY total_focus_minutes DESC, user_id LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], profile_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    // ── login sessions ──────────────────────────────────────────────────

    /// Drops every session of the user and stores `session` as the only one.
    pub fn replace_sessions(&self, session: &AuthSession) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM auth_sessions WHERE user_id = ?1",
            params![session.user_id],
        )?;
        tx.execute(
            "INSERT INTO auth_sessions (session_token, user_id, expires_at, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                session.session_token,
                session.user_id,
                ts(&session.expires_at),
                ts(&session.created_at),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn get_session(&self, token: &str) -> Result<Option<AuthSession>> {
        Ok(self
            .conn
            .query_row(
                "SELECT user_id, session_token, expires_at, created_at
                 FROM auth_sessions WHERE session_token = ?1",
                params![token],
                |row| {
                    Ok(AuthSession {
                        user_id: row.get(0)?,
                        session_token: row.get(1)?,
                        expires_at: get_ts(row, 2)?,
                        created_at: get_ts(row, 3)?,
                    })
                },
            )
            .optional()?)
    }

    pub fn delete_session(&self, token: &str) -> Result<bool> {
        let n = self.conn.execute(
            "DELETE FROM auth_sessions WHERE session_token = ?1",
            params![token],
        )?;
        Ok(n > 0)
    }

    // ── todos ───────────────────────────────────────────────────────────

    pub fn list_todos(&self, user_id: &str, limit: usize) -> Result<Vec<Todo>> {
        let mut stmt = self.conn.prepare(
            "SELECT todo_id, user_id, text, completed, created_at
             FROM todos WHERE user_id = ?1 ORDER BY created_at LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user_id, limit as i64], todo_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    pub fn insert_todo(&self, todo: &Todo) -> Result<()> {
        self.conn.execute(
            "INSERT INTO todos (todo_id, user_id, text, completed, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                todo.todo_id,
                todo.user_id,
                todo.text,
                todo.completed,
                ts(&todo.created_at),
            ],
        )?;
        Ok(())
    }

    fn get_todo(&self, user_id: &str, todo_id: &str) -> Result<Option<Todo>> {
        Ok(self
            .conn
            .query_row(
                "SELECT todo_id, user_id, text, completed, created_at
                 FROM todos WHERE todo_id = ?1 AND user_id = ?2",
                params![todo_id, user_id],
                todo_from_row,
            )
            .optional()?)
    }

    /// Applies a partial todo update. Completing a todo counts toward the
    /// day's todo quest.
    pub fn update_todo(
        &self,
        user_id: &str,
        todo_id: &str,
        update: &TodoUpdate,
        now: DateTime<Utc>,
    ) -> Result<Todo> {
        let mut todo = self
            .get_todo(user_id, todo_id)?
            .ok_or_else(|| CoreError::not_found("Todo not found"))?;
        let was_completed = todo.completed;

        if let Some(text) = &update.text {
            todo.text = text.clone();
        }
        if let Some(completed) = update.completed {
            todo.completed = completed;
        }

        self.conn.execute(
            "UPDATE todos SET text = ?1, completed = ?2 WHERE todo_id = ?3 AND user_id = ?4",
            params![todo.text, todo.completed, todo_id, user_id],
        )?;

        if !was_completed && todo.completed {
            if let Err(e) = self.record_quest_progress(user_id, now.date_naive(), QuestType::CompleteTodos, 1, now) {
                tracing::warn!(user_id, error = %e, "todo quest progress not recorded");
            }
        }
        Ok(todo)
    }

    pub fn delete_todo(&self, user_id: &str, todo_id: &str) -> Result<()> {
        let n = self.conn.execute(
            "DELETE FROM todos WHERE todo_id = ?1 AND user_id = ?2",
            params![todo_id, user_id],
        )?;
        if n == 0 {
            return Err(CoreError::not_found("Todo not found"));
        }
        Ok(())
    }

    // ── focus sessions ──────────────────────────────────────────────────

    pub fn insert_focus_session(&self, session: &FocusSession) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO focus_sessions ({FOCUS_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
            ),
            params![
                session.session_id,
                session.user_id,
                session.duration_minutes,
                ts(&session.started_at),
                session.status.as_str(),
                session.ended_at.as_ref().map(ts),
                session.actual_minutes,
                session.credits_earned,
                session.double_credits,
            ],
        )?;
        Ok(())
    }

    pub fn get_focus_session(&self, user_id: &str, session_id: &str) -> Result<Option<FocusSession>> {
        query_focus_session(&self.conn, user_id, session_id)
    }

    /// Finalizes a focus session and applies its rewards.
    ///
    /// The session row and the user's stats change in one transaction.
    /// Badge evaluation and quest progress run after commit; their failures
    /// are logged and do not affect the result.
    pub fn complete_focus_session(
        &self,
        user_id: &str,
        session_id: &str,
        actual_minutes: i64,
        double_credits: bool,
        now: DateTime<Utc>,
    ) -> Result<FocusCompletion> {
        if actual_minutes < 0 {
            return Err(ValidationError::InvalidValue {
                field: "actual_minutes".into(),
                message: "must not be negative".into(),
            }
            .into());
        }
        let today = now.date_naive();

        let tx = self.conn.unchecked_transaction()?;
        let session = query_focus_session(&tx, user_id, session_id)?
            .ok_or_else(|| CoreError::not_found("Session not found"))?;
        if session.status == FocusStatus::Completed {
            return Err(CoreError::invalid("Session already completed"));
        }
        let user = query_user(&tx, user_id)?.ok_or_else(|| CoreError::not_found("User not found"))?;

        let outcome = progression::apply_session(&user, actual_minutes, double_credits, today);

        tx.execute(
            "UPDATE focus_sessions
             SET status = ?1, ended_at = ?2, actual_minutes = ?3, credits_earned = ?4,
                 double_credits = ?5
             WHERE session_id = ?6",
            params![
                FocusStatus::Completed.as_str(),
                ts(&now),
                actual_minutes,
                outcome.credits_earned,
                double_credits,
                session_id,
            ],
        )?;
        tx.execute(
            "UPDATE users
             SET credits = ?1, xp = ?2, level = ?3, streak_days = ?4,
                 last_study_date = ?5, total_focus_minutes = ?6
             WHERE user_id = ?7",
            params![
                outcome.credits,
                outcome.xp,
                outcome.level,
                outcome.streak_days,
                outcome.last_study_date.to_string(),
                outcome.total_focus_minutes,
                user_id,
            ],
        )?;
        tx.commit()?;

        if outcome.leveled_up_from(user.level) {
            tracing::info!(user_id, from = user.level, to = outcome.level, "level up");
        }

        let new_badges = self.evaluate_badges(user_id, now).unwrap_or_else(|e| {
            tracing::warn!(user_id, error = %e, "badge evaluation failed");
            Vec::new()
        });
        for (quest_type, amount) in [
            (QuestType::FocusTime, actual_minutes),
            (QuestType::MaintainStreak, 1),
        ] {
            if let Err(e) = self.record_quest_progress(user_id, today, quest_type, amount, now) {
                tracing::warn!(user_id, error = %e, "quest progress update failed");
            }
        }

        Ok(FocusCompletion {
            outcome,
            previous_level: user.level,
            new_badges,
        })
    }

    /// Completed sessions, most recently ended first.
    pub fn focus_history(&self, user_id: &str, limit: usize) -> Result<Vec<FocusSession>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {FOCUS_COLUMNS} FROM focus_sessions
             WHERE user_id = ?1 AND status = 'completed'
             ORDER BY ended_at DESC LIMIT ?2"
        ))?;
        let rows = stmt.query_map(params![user_id, limit as i64], focus_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    // ── shop ────────────────────────────────────────────────────────────

    pub fn shop_items(&self) -> Result<Vec<ShopItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT item_id, name_tr, name_en, description_tr, description_en, price,
                    category, image_url, unlock_level
             FROM shop_items ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], shop_item_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    pub fn get_shop_item(&self, item_id: &str) -> Result<Option<ShopItem>> {
        query_shop_item(&self.conn, item_id)
    }

    /// Buys a shop item: debits the price, records ownership and appends a
    /// ledger row, all or nothing.
    pub fn purchase_item(&self, user_id: &str, item_id: &str, now: DateTime<Utc>) -> Result<(Purchase, ShopItem)> {
        let tx = self.conn.unchecked_transaction()?;
        let item = query_shop_item(&tx, item_id)?
            .ok_or_else(|| CoreError::not_found("Item not found"))?;
        let user = query_user(&tx, user_id)?.ok_or_else(|| CoreError::not_found("User not found"))?;
        check_purchase(&item, user.level, user.credits)?;

        let mut owned = user.owned_items;
        add_owned(&mut owned, item_id);
        tx.execute(
            "UPDATE users SET credits = credits - ?1, owned_items = ?2 WHERE user_id = ?3",
            params![item.price, to_json(&owned)?, user_id],
        )?;

        let purchase = Purchase {
            purchase_id: format!("purchase_{}", crate::models::short_id()),
            user_id: user_id.to_string(),
            item_id: item_id.to_string(),
            price: item.price,
            purchased_at: now,
        };
        tx.execute(
            "INSERT INTO purchases (purchase_id, user_id, item_id, price, purchased_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                purchase.purchase_id,
                purchase.user_id,
                purchase.item_id,
                purchase.price,
                ts(&purchase.purchased_at),
            ],
        )?;
        tx.commit()?;

        if let Err(e) = self.evaluate_badges(user_id, now) {
            tracing::warn!(user_id, error = %e, "badge evaluation failed");
        }
        Ok((purchase, item.with_lock_for(user.level)))
    }

    pub fn purchases(&self, user_id: &str) -> Result<Vec<Purchase>> {
        let mut stmt = self.conn.prepare(
            "SELECT purchase_id, user_id, item_id, price, purchased_at
             FROM purchases WHERE user_id = ?1 ORDER BY purchased_at LIMIT 100",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(Purchase {
                purchase_id: row.get(0)?,
                user_id: row.get(1)?,
                item_id: row.get(2)?,
                price: row.get(3)?,
                purchased_at: get_ts(row, 4)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    pub fn music_tracks(&self) -> Result<Vec<MusicTrack>> {
        let mut stmt = self.conn.prepare(
            "SELECT track_id, name, artist, url, category, unlock_level
             FROM music_tracks ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(MusicTrack {
                track_id: row.get(0)?,
                name: row.get(1)?,
                artist: row.get(2)?,
                url: row.get(3)?,
                category: row.get(4)?,
                unlock_level: row.get(5)?,
                locked: false,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    // ── customization ───────────────────────────────────────────────────

    /// Buys a customization item priced by the server catalog.
    pub fn purchase_customization(&self, user_id: &str, key: &str, now: DateTime<Utc>) -> Result<User> {
        let item = find_customization(key).ok_or_else(|| CoreError::not_found("Item not found"))?;

        let tx = self.conn.unchecked_transaction()?;
        let user = query_user(&tx, user_id)?.ok_or_else(|| CoreError::not_found("User not found"))?;
        let price = check_customization_purchase(
            item,
            &user.owned_customization,
            user.credits,
            user.has_active_premium(now),
        )?;

        let mut owned = user.owned_customization;
        add_owned(&mut owned, key);
        tx.execute(
            "UPDATE users SET credits = credits - ?1, owned_customization = ?2 WHERE user_id = ?3",
            params![price, to_json(&owned)?, user_id],
        )?;
        tx.commit()?;
        self.require_user(user_id)
    }

    /// Equips an outfit; every part must be owned or free.
    pub fn equip_customization(&self, user_id: &str, equip: &Customization) -> Result<User> {
        let user = self.require_user(user_id)?;
        for (kind, id) in [
            (CustomizationKind::Skin, &equip.skin),
            (CustomizationKind::Outfit, &equip.outfit),
            (CustomizationKind::Accessory, &equip.accessory),
        ] {
            if !catalog::can_equip(kind, id, &user.owned_customization) {
                return Err(CoreError::invalid(format!(
                    "{} '{id}' is not owned",
                    kind.as_str()
                )));
            }
        }
        self.update_user(
            user_id,
            &UserUpdate {
                customization: Some(equip.clone()),
                ..Default::default()
            },
        )
    }

    // ── social graph ────────────────────────────────────────────────────

    /// Creates an accepted friendship from `user_id` to the account with
    /// `target_email` and credits the inviter.
    pub fn invite_friend(&self, user_id: &str, target_email: &str, now: DateTime<Utc>) -> Result<Friendship> {
        let tx = self.conn.unchecked_transaction()?;
        let target: Option<String> = tx
            .query_row(
                "SELECT user_id FROM users WHERE email = ?1",
                params![target_email],
                |row| row.get(0),
            )
            .optional()?;
        let target = target.ok_or_else(|| CoreError::not_found("User not found"))?;
        if target == user_id {
            return Err(CoreError::invalid("Cannot invite yourself"));
        }

        let key = pair_key(user_id, &target);
        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM friendships WHERE pair_key = ?1)",
            params![key],
            |row| row.get(0),
        )?;
        if exists {
            return Err(CoreError::invalid("Friendship already exists"));
        }

        let friendship = Friendship {
            friendship_id: format!("friend_{}", crate::models::short_id()),
            user_id: user_id.to_string(),
            friend_id: target,
            status: "accepted".to_string(),
            created_at: now,
        };
        tx.execute(
            "INSERT INTO friendships (friendship_id, user_id, friend_id, status, pair_key, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                friendship.friendship_id,
                friendship.user_id,
                friendship.friend_id,
                friendship.status,
                key,
                ts(&friendship.created_at),
            ],
        )?;
        tx.execute(
            "UPDATE users SET credits = credits + ?1 WHERE user_id = ?2",
            params![INVITE_BONUS_CREDITS, user_id],
        )?;
        tx.commit()?;

        if let Err(e) = self.evaluate_badges(user_id, now) {
            tracing::warn!(user_id, error = %e, "badge evaluation failed");
        }
        Ok(friendship)
    }

    /// Public profiles of every accepted friend, in either direction.
    pub fn friends(&self, user_id: &str) -> Result<Vec<PublicProfile>> {
        let mut stmt = self.conn.prepare(
            "SELECT u.user_id, u.name, u.picture, u.level, u.total_focus_minutes, u.streak_days
             FROM friendships f
             JOIN users u ON u.user_id =
                 CASE WHEN f.user_id = ?1 THEN f.friend_id ELSE f.user_id END
             WHERE (f.user_id = ?1 OR f.friend_id = ?1) AND f.status = 'accepted'
             ORDER BY f.created_at LIMIT 100",
        )?;
        let rows = stmt.query_map(params![user_id], profile_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    // ── badges and achievements ─────────────────────────────────────────

    pub fn user_metrics(&self, user_id: &str) -> Result<UserMetrics> {
        query_metrics(&self.conn, user_id)
    }

    /// Awards every badge the user newly qualifies for.
    pub fn evaluate_badges(&self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<&'static str>> {
        let metrics = self.user_metrics(user_id)?;
        let earned = self.earned_badge_ids(user_id)?;
        let new_badges = unlocks::newly_earned_badges(&metrics, &earned);
        for badge_id in &new_badges {
            self.conn.execute(
                "INSERT OR IGNORE INTO user_badges (user_id, badge_id, earned_at)
                 VALUES (?1, ?2, ?3)",
                params![user_id, badge_id, ts(&now)],
            )?;
            tracing::info!(user_id, badge_id, "badge awarded");
        }
        Ok(new_badges)
    }

    pub fn earned_badge_ids(&self, user_id: &str) -> Result<HashSet<String>> {
        Ok(self.earned_badges(user_id)?.into_iter().map(|a| a.award_id).collect())
    }

    pub fn earned_badges(&self, user_id: &str) -> Result<Vec<Award>> {
        self.awards("user_badges", "badge_id", user_id)
    }

    pub fn earned_achievement_ids(&self, user_id: &str) -> Result<HashSet<String>> {
        Ok(self
            .awards("user_achievements", "achievement_id", user_id)?
            .into_iter()
            .map(|a| a.award_id)
            .collect())
    }

    fn awards(&self, table: &str, id_column: &str, user_id: &str) -> Result<Vec<Award>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT user_id, {id_column}, earned_at FROM {table}
             WHERE user_id = ?1 ORDER BY earned_at"
        ))?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(Award {
                user_id: row.get(0)?,
                award_id: row.get(1)?,
                earned_at: get_ts(row, 2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Claims a completed achievement once and returns its credit reward.
    pub fn claim_achievement(&self, user_id: &str, achievement_id: &str, now: DateTime<Utc>) -> Result<i64> {
        let tx = self.conn.unchecked_transaction()?;
        let claimed: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM user_achievements
                           WHERE user_id = ?1 AND achievement_id = ?2)",
            params![user_id, achievement_id],
            |row| row.get(0),
        )?;
        if claimed {
            return Err(CoreError::AlreadyClaimed("Achievement already claimed".into()));
        }

        let achievement = unlocks::find_achievement(achievement_id)
            .ok_or_else(|| CoreError::not_found("Achievement not found"))?;
        let metrics = query_metrics(&tx, user_id)?;
        if !achievement.is_complete(&metrics) {
            return Err(CoreError::invalid("Achievement not completed"));
        }

        tx.execute(
            "INSERT INTO user_achievements (user_id, achievement_id, earned_at) VALUES (?1, ?2, ?3)",
            params![user_id, achievement_id, ts(&now)],
        )?;
        tx.execute(
            "UPDATE users SET credits = credits + ?1 WHERE user_id = ?2",
            params![achievement.reward, user_id],
        )?;
        tx.commit()?;

        tracing::info!(user_id, achievement_id, reward = achievement.reward, "achievement claimed");
        Ok(achievement.reward)
    }

    // ── daily quests ────────────────────────────────────────────────────

    /// Today's quest set, created on first access.
    pub fn daily_quests(&self, user_id: &str, date: NaiveDate, now: DateTime<Utc>) -> Result<DailyQuestSet> {
        if let Some(set) = query_quest_set(&self.conn, user_id, date)? {
            return Ok(set);
        }
        let set = DailyQuestSet::generate(user_id, date, now);
        self.conn.execute(
            "INSERT OR IGNORE INTO daily_quests (user_id, date, quests, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![user_id, date.to_string(), to_json(&set.quests)?, ts(&now)],
        )?;
        // A concurrent insert wins; re-read so both callers see the same set.
        query_quest_set(&self.conn, user_id, date)?
            .ok_or_else(|| CoreError::not_found("No quests found"))
    }

    pub fn record_quest_progress(
        &self,
        user_id: &str,
        date: NaiveDate,
        quest_type: QuestType,
        amount: i64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut set = self.daily_quests(user_id, date, now)?;
        if set.record_progress(quest_type, amount) {
            save_quests(&self.conn, &set)?;
        }
        Ok(())
    }

    /// Claims a ready quest from the day's set and pays its reward.
    pub fn claim_quest(&self, user_id: &str, date: NaiveDate, quest_id: &str) -> Result<QuestReward> {
        let tx = self.conn.unchecked_transaction()?;
        let mut set = query_quest_set(&tx, user_id, date)?
            .ok_or_else(|| CoreError::not_found("No quests found"))?;
        let reward = set.claim(quest_id)?;
        save_quests(&tx, &set)?;

        let user = query_user(&tx, user_id)?.ok_or_else(|| CoreError::not_found("User not found"))?;
        let (level, xp) = progression::grant_xp(user.level, user.xp, reward.xp);
        tx.execute(
            "UPDATE users SET credits = credits + ?1, level = ?2, xp = ?3 WHERE user_id = ?4",
            params![reward.credits, level, xp, user_id],
        )?;
        tx.commit()?;

        tracing::info!(user_id, quest_id, credits = reward.credits, xp = reward.xp, "quest claimed");
        Ok(reward)
    }

    // ── stats ───────────────────────────────────────────────────────────

    pub fn user_stats(&self, user_id: &str) -> Result<UserStats> {
        let user = self.require_user(user_id)?;
        let metrics = self.user_metrics(user_id)?;
        let count = |sql: &str| -> Result<i64> {
            Ok(self.conn.query_row(sql, params![user_id], |row| row.get(0))?)
        };
        Ok(UserStats {
            total_sessions: count(
                "SELECT COUNT(*) FROM focus_sessions WHERE user_id = ?1 AND status = 'completed'",
            )?,
            total_focus_minutes: user.total_focus_minutes,
            total_purchases: metrics.purchase_count,
            total_friends: metrics.friend_count,
            total_badges: count("SELECT COUNT(*) FROM user_badges WHERE user_id = ?1")?,
            credits: user.credits,
            level: user.level,
            xp: user.xp,
            streak_days: user.streak_days,
        })
    }

    // ── chat ────────────────────────────────────────────────────────────

    pub fn insert_message(&self, message: &ChatMessage) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO chat_messages ({MESSAGE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
            ),
            params![
                message.message_id,
                message.chat_id,
                message.sender_id,
                message.sender_name,
                message.message,
                message.read,
                ts(&message.created_at),
            ],
        )?;
        Ok(())
    }

    /// Messages sent by `sender_id` at or after `since`.
    pub fn count_messages_since(&self, sender_id: &str, since: DateTime<Utc>) -> Result<usize> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM chat_messages WHERE sender_id = ?1 AND created_at >= ?2",
            params![sender_id, ts(&since)],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }

    /// Oldest-first messages of a chat; marks other senders' messages read.
    pub fn chat_messages(&self, chat_id: &str, reader_id: &str, limit: usize) -> Result<Vec<ChatMessage>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM chat_messages
             WHERE chat_id = ?1 ORDER BY created_at LIMIT ?2"
        ))?;
        let messages = stmt
            .query_map(params![chat_id, limit as i64], message_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        self.conn.execute(
            "UPDATE chat_messages SET read = 1 WHERE chat_id = ?1 AND sender_id != ?2",
            params![chat_id, reader_id],
        )?;
        Ok(messages)
    }

    pub fn insert_group(&self, group: &ChatGroup) -> Result<()> {
        self.conn.execute(
            "INSERT INTO chat_groups (group_id, name, members, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                group.group_id,
                group.name,
                to_json(&group.members)?,
                group.created_by,
                ts(&group.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_group(&self, group_id: &str) -> Result<Option<ChatGroup>> {
        Ok(self
            .conn
            .query_row(
                "SELECT group_id, name, members, created_by, created_at
                 FROM chat_groups WHERE group_id = ?1",
                params![group_id],
                group_from_row,
            )
            .optional()?)
    }

    /// Groups listing `user_id` among their members.
    pub fn groups_for_member(&self, user_id: &str) -> Result<Vec<ChatGroup>> {
        let mut stmt = self.conn.prepare(
            "SELECT group_id, name, members, created_by, created_at FROM chat_groups
             WHERE EXISTS (SELECT 1 FROM json_each(chat_groups.members) WHERE value = ?1)
             ORDER BY created_at LIMIT 100",
        )?;
        let rows = stmt.query_map(params![user_id], group_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Users a message posted to `chat_id` fans out to.
    pub fn chat_recipients(&self, chat_id: &str) -> Result<Vec<String>> {
        Ok(match ChatTarget::parse(chat_id) {
            ChatTarget::Group(group_id) => self.get_group(&group_id)?.map(|g| g.members).unwrap_or_default(),
            ChatTarget::Friend(friend_id) => vec![friend_id],
            ChatTarget::Unaddressed => Vec::new(),
        })
    }

    pub fn count_groups_created_by(&self, user_id: &str) -> Result<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM chat_groups WHERE created_by = ?1",
            params![user_id],
            |row| row.get(0),
        )?)
    }

    // ── premium ─────────────────────────────────────────────────────────

    /// Activates premium for a completed checkout. Returns `false` when the
    /// user does not exist.
    pub fn activate_premium(
        &self,
        user_id: &str,
        plan: Plan,
        provider_subscription_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let expires_at = plan.expires_at(now);
        let tx = self.conn.unchecked_transaction()?;
        let updated = tx.execute(
            "UPDATE users SET is_premium = 1, premium_expires_at = ?1 WHERE user_id = ?2",
            params![ts(&expires_at), user_id],
        )?;
        if updated == 0 {
            return Ok(false);
        }
        let subscription = PremiumSubscription {
            subscription_id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            plan: plan.as_str().to_string(),
            status: "active".to_string(),
            provider_subscription_id: provider_subscription_id.map(str::to_string),
            started_at: now,
            expires_at,
        };
        tx.execute(
            "INSERT INTO premium_subscriptions (subscription_id, user_id, plan, status,
                provider_subscription_id, started_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                subscription.subscription_id,
                subscription.user_id,
                subscription.plan,
                subscription.status,
                subscription.provider_subscription_id,
                ts(&subscription.started_at),
                ts(&subscription.expires_at),
            ],
        )?;
        tx.commit()?;
        tracing::info!(user_id, plan = plan.as_str(), "premium activated");
        Ok(true)
    }

    /// Deactivates premium for the owners of a cancelled provider
    /// subscription and returns their ids.
    pub fn cancel_provider_subscription(&self, provider_subscription_id: &str) -> Result<Vec<String>> {
        let tx = self.conn.unchecked_transaction()?;
        let user_ids: Vec<String> = {
            let mut stmt = tx.prepare(
                "SELECT DISTINCT user_id FROM premium_subscriptions
                 WHERE provider_subscription_id = ?1",
            )?;
            let rows = stmt.query_map(params![provider_subscription_id], |row| row.get(0))?;
            rows.collect::<rusqlite::Result<_>>()?
        };
        for user_id in &user_ids {
            tx.execute(
                "UPDATE users SET is_premium = 0 WHERE user_id = ?1",
                params![user_id],
            )?;
        }
        tx.execute(
            "UPDATE premium_subscriptions SET status = 'canceled'
             WHERE provider_subscription_id = ?1",
            params![provider_subscription_id],
        )?;
        tx.commit()?;
        Ok(user_ids)
    }

    // ── push subscriptions ──────────────────────────────────────────────

    pub fn upsert_push_subscription(&self, sub: &PushSubscription) -> Result<()> {
        self.conn.execute(
            "INSERT INTO push_subscriptions (user_id, subscription, created_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET
                 subscription = excluded.subscription, created_at = excluded.created_at",
            params![sub.user_id, to_json(&sub.subscription)?, ts(&sub.created_at)],
        )?;
        Ok(())
    }

    pub fn get_push_subscription(&self, user_id: &str) -> Result<Option<PushSubscription>> {
        Ok(self
            .conn
            .query_row(
                "SELECT user_id, subscription, created_at FROM push_subscriptions WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(PushSubscription {
                        user_id: row.get(0)?,
                        subscription: get_json(row, 1)?,
                        created_at: get_ts(row, 2)?,
                    })
                },
            )
            .optional()?)
    }

    pub fn delete_push_subscription(&self, user_id: &str) -> Result<bool> {
        let n = self.conn.execute(
            "DELETE FROM push_subscriptions WHERE user_id = ?1",
            params![user_id],
        )?;
        Ok(n > 0)
    }
}

// ── connection-level helpers shared with transactions ──────────────────

fn query_user(conn: &Connection, user_id: &str) -> Result<Option<User>> {
    Ok(conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
            params![user_id],
            user_from_row,
        )
        .optional()?)
}

fn query_focus_session(conn: &Connection, user_id: &str, session_id: &str) -> Result<Option<FocusSession>> {
    Ok(conn
        .query_row(
            &format!(
                "SELECT {FOCUS_COLUMNS} FROM focus_sessions WHERE session_id = ?1 AND user_id = ?2"
            ),
            params![session_id, user_id],
            focus_from_row,
        )
        .optional()?)
}

fn query_shop_item(conn: &Connection, item_id: &str) -> Result<Option<ShopItem>> {
    Ok(conn
        .query_row(
            "SELECT item_id, name_tr, name_en, description_tr, description_en, price,
                    category, image_url, unlock_level
             FROM shop_items WHERE item_id = ?1",
            params![item_id],
            shop_item_from_row,
        )
        .optional()?)
}

fn query_metrics(conn: &Connection, user_id: &str) -> Result<UserMetrics> {
    let user = query_user(conn, user_id)?.ok_or_else(|| CoreError::not_found("User not found"))?;
    let purchase_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM purchases WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;
    let friend_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM friendships
         WHERE (user_id = ?1 OR friend_id = ?1) AND status = 'accepted'",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(UserMetrics {
        total_focus_minutes: user.total_focus_minutes,
        streak_days: user.streak_days,
        level: user.level,
        purchase_count,
        friend_count,
    })
}

fn query_quest_set(conn: &Connection, user_id: &str, date: NaiveDate) -> Result<Option<DailyQuestSet>> {
    Ok(conn
        .query_row(
            "SELECT user_id, date, quests, created_at FROM daily_quests
             WHERE user_id = ?1 AND date = ?2",
            params![user_id, date.to_string()],
            |row| {
                Ok(DailyQuestSet {
                    user_id: row.get(0)?,
                    date: get_date(row, 1)?.unwrap_or(date),
                    quests: get_json(row, 2)?,
                    created_at: get_ts(row, 3)?,
                })
            },
        )
        .optional()?)
}

fn save_quests(conn: &Connection, set: &DailyQuestSet) -> Result<()> {
    conn.execute(
        "UPDATE daily_quests SET quests = ?1 WHERE user_id = ?2 AND date = ?3",
        params![to_json(&set.quests)?, set.user_id, set.date.to_string()],
    )?;
    Ok(())
}

fn apply_user_update(conn: &Connection, user_id: &str, update: &UserUpdate) -> Result<()> {
    if update.is_empty() {
        return Ok(());
    }

    let mut columns: Vec<&str> = Vec::new();
    let mut values: Vec<Value> = Vec::new();
    let mut set = |column: &'static str, value: Value| {
        columns.push(column);
        values.push(value);
    };
    let text = |s: &str| Value::Text(s.to_string());
    let opt_text = |s: Option<String>| s.map(Value::Text).unwrap_or(Value::Null);

    if let Some(v) = &update.name {
        set("name", text(v));
    }
    if let Some(v) = &update.picture {
        set("picture", opt_text(v.clone()));
    }
    if let Some(v) = update.credits {
        set("credits", Value::Integer(v));
    }
    if let Some(v) = update.level {
        set("level", Value::Integer(v));
    }
    if let Some(v) = update.xp {
        set("xp", Value::Integer(v));
    }
    if let Some(v) = update.streak_days {
        set("streak_days", Value::Integer(v));
    }
    if let Some(v) = update.last_study_date {
        set("last_study_date", Value::Text(v.to_string()));
    }
    if let Some(v) = update.total_focus_minutes {
        set("total_focus_minutes", Value::Integer(v));
    }
    if let Some(v) = &update.owned_items {
        set("owned_items", Value::Text(to_json(v)?));
    }
    if let Some(v) = &update.active_theme {
        set("active_theme", text(v));
    }
    if let Some(v) = &update.language {
        set("language", text(v));
    }
    if let Some(v) = update.is_premium {
        set("is_premium", Value::Integer(i64::from(v)));
    }
    if let Some(v) = &update.premium_expires_at {
        set("premium_expires_at", opt_text(v.as_ref().map(ts)));
    }
    if let Some(v) = &update.owned_customization {
        set("owned_customization", Value::Text(to_json(v)?));
    }
    if let Some(v) = &update.customization {
        set("customization", Value::Text(to_json(v)?));
    }
    if let Some(v) = &update.spotify_access_token {
        set("spotify_access_token", text(v));
    }
    if let Some(v) = &update.spotify_refresh_token {
        set("spotify_refresh_token", text(v));
    }

    let assignments: Vec<String> = columns.iter().map(|c| format!("{c} = ?")).collect();
    values.push(Value::Text(user_id.to_string()));
    let n = conn.execute(
        &format!("UPDATE users SET {} WHERE user_id = ?", assignments.join(", ")),
        params_from_iter(values.iter()),
    )?;
    if n == 0 {
        return Err(CoreError::not_found("User not found"));
    }
    Ok(())
}

fn pair_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{a}|{b}")
    } else {
        format!("{b}|{a}")
    }
}

// ── row mapping ────────────────────────────────────────────────────────

fn ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn conversion_error(idx: usize, err: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn get_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn get_opt_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| conversion_error(idx, e))
    })
    .transpose()
}

fn get_date(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn get_json<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn get_opt_json<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| serde_json::from_str(&s).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        user_id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        picture: row.get(3)?,
        credits: row.get(4)?,
        level: row.get(5)?,
        xp: row.get(6)?,
        streak_days: row.get(7)?,
        last_study_date: get_date(row, 8)?,
        total_focus_minutes: row.get(9)?,
        owned_items: get_json(row, 10)?,
        active_theme: row.get(11)?,
        language: row.get(12)?,
        created_at: get_ts(row, 13)?,
        is_premium: row.get(14)?,
        premium_expires_at: get_opt_ts(row, 15)?,
        owned_customization: get_json(row, 16)?,
        customization: get_opt_json(row, 17)?,
        spotify_access_token: row.get(18)?,
        spotify_refresh_token: row.get(19)?,
    })
}

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<PublicProfile> {
    Ok(PublicProfile {
        user_id: row.get(0)?,
        name: row.get(1)?,
        picture: row.get(2)?,
        level: row.get(3)?,
        total_focus_minutes: row.get(4)?,
        streak_days: row.get(5)?,
    })
}

fn todo_from_row(row: &Row<'_>) -> rusqlite::Result<Todo> {
    Ok(Todo {
        todo_id: row.get(0)?,
        user_id: row.get(1)?,
        text: row.get(2)?,
        completed: row.get(3)?,
        created_at: get_ts(row, 4)?,
    })
}

fn focus_from_row(row: &Row<'_>) -> rusqlite::Result<FocusSession> {
    let status: String = row.get(4)?;
    Ok(FocusSession {
        session_id: row.get(0)?,
        user_id: row.get(1)?,
        duration_minutes: row.get(2)?,
        started_at: get_ts(row, 3)?,
        status: FocusStatus::parse(&status),
        ended_at: get_opt_ts(row, 5)?,
        actual_minutes: row.get(6)?,
        credits_earned: row.get(7)?,
        double_credits: row.get(8)?,
    })
}

fn shop_item_from_row(row: &Row<'_>) -> rusqlite::Result<ShopItem> {
    Ok(ShopItem {
        item_id: row.get(0)?,
        name_tr: row.get(1)?,
        name_en: row.get(2)?,
        description_tr: row.get(3)?,
        description_en: row.get(4)?,
        price: row.get(5)?,
        category: row.get(6)?,
        image_url: row.get(7)?,
        unlock_level: row.get(8)?,
        locked: false,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<ChatMessage> {
    Ok(ChatMessage {
        message_id: row.get(0)?,
        chat_id: row.get(1)?,
        sender_id: row.get(2)?,
        sender_name: row.get(3)?,
        message: row.get(4)?,
        read: row.get(5)?,
        created_at: get_ts(row, 6)?,
    })
}

fn group_from_row(row: &Row<'_>) -> rusqlite::Result<ChatGroup> {
    Ok(ChatGroup {
        group_id: row.get(0)?,
        name: row.get(1)?,
        members: get_json(row, 2)?,
        created_by: row.get(3)?,
        created_at: get_ts(row, 4)?,
    })
}
