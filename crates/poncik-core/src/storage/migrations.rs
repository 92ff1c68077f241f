//! Database schema migrations for poncik.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Latest schema version produced by [`migrate`].
pub const SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Current schema version, 0 for a fresh database.
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: accounts, focus tracking, shop, social and rewards.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            user_id             TEXT PRIMARY KEY,
            email               TEXT NOT NULL UNIQUE,
            name                TEXT NOT NULL,
            picture             TEXT,
            credits             INTEGER NOT NULL DEFAULT 50,
            level               INTEGER NOT NULL DEFAULT 1,
            xp                  INTEGER NOT NULL DEFAULT 0,
            streak_days         INTEGER NOT NULL DEFAULT 0,
            last_study_date     TEXT,
            total_focus_minutes INTEGER NOT NULL DEFAULT 0,
            owned_items         TEXT NOT NULL DEFAULT '[]',
            active_theme        TEXT NOT NULL DEFAULT 'light',
            language            TEXT NOT NULL DEFAULT 'tr',
            created_at          TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS auth_sessions (
            session_token TEXT PRIMARY KEY,
            user_id       TEXT NOT NULL,
            expires_at    TEXT NOT NULL,
            created_at    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS todos (
            todo_id    TEXT PRIMARY KEY,
            user_id    TEXT NOT NULL,
            text       TEXT NOT NULL,
            completed  INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS focus_sessions (
            session_id       TEXT PRIMARY KEY,
            user_id          TEXT NOT NULL,
            duration_minutes INTEGER NOT NULL,
            started_at       TEXT NOT NULL,
            status           TEXT NOT NULL DEFAULT 'active',
            ended_at         TEXT,
            actual_minutes   INTEGER,
            credits_earned   INTEGER,
            double_credits   INTEGER
        );

        CREATE TABLE IF NOT EXISTS shop_items (
            item_id        TEXT PRIMARY KEY,
            name_tr        TEXT NOT NULL,
            name_en        TEXT NOT NULL,
            description_tr TEXT NOT NULL,
            description_en TEXT NOT NULL,
            price          INTEGER NOT NULL,
            category       TEXT NOT NULL,
            image_url      TEXT NOT NULL,
            unlock_level   INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS music_tracks (
            track_id     TEXT PRIMARY KEY,
            name         TEXT NOT NULL,
            artist       TEXT NOT NULL,
            url          TEXT NOT NULL,
            category     TEXT NOT NULL,
            unlock_level INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS purchases (
            purchase_id  TEXT PRIMARY KEY,
            user_id      TEXT NOT NULL,
            item_id      TEXT NOT NULL,
            price        INTEGER NOT NULL,
            purchased_at TEXT NOT NULL
        );

        -- pair_key is the sorted 'a|b' id pair, one row per unordered pair
        CREATE TABLE IF NOT EXISTS friendships (
            friendship_id TEXT PRIMARY KEY,
            user_id       TEXT NOT NULL,
            friend_id     TEXT NOT NULL,
            status        TEXT NOT NULL,
            pair_key      TEXT NOT NULL UNIQUE,
            created_at    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS user_badges (
            user_id   TEXT NOT NULL,
            badge_id  TEXT NOT NULL,
            earned_at TEXT NOT NULL,
            PRIMARY KEY (user_id, badge_id)
        );

        CREATE TABLE IF NOT EXISTS user_achievements (
            user_id        TEXT NOT NULL,
            achievement_id TEXT NOT NULL,
            earned_at      TEXT NOT NULL,
            PRIMARY KEY (user_id, achievement_id)
        );

        CREATE TABLE IF NOT EXISTS daily_quests (
            user_id    TEXT NOT NULL,
            date       TEXT NOT NULL,
            quests     TEXT NOT NULL,
            created_at TEXT NOT NULL,
            PRIMARY KEY (user_id, date)
        );

        CREATE INDEX IF NOT EXISTS idx_auth_sessions_user ON auth_sessions(user_id);
        CREATE INDEX IF NOT EXISTS idx_todos_user ON todos(user_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_focus_user_status ON focus_sessions(user_id, status);
        CREATE INDEX IF NOT EXISTS idx_purchases_user ON purchases(user_id);
        CREATE INDEX IF NOT EXISTS idx_friendships_user ON friendships(user_id);
        CREATE INDEX IF NOT EXISTS idx_friendships_friend ON friendships(friend_id);
        CREATE INDEX IF NOT EXISTS idx_users_focus ON users(total_focus_minutes);",
    )?;

    set_schema_version(&tx, 1)?;
    tx.commit()?;
    Ok(())
}

/// Migration v2: premium, customization, music tokens, chat and push.
///
/// Adds to `users`:
/// - is_premium / premium_expires_at
/// - owned_customization / customization
/// - spotify_access_token / spotify_refresh_token
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "ALTER TABLE users ADD COLUMN is_premium INTEGER NOT NULL DEFAULT 0;
         ALTER TABLE users ADD COLUMN premium_expires_at TEXT;
         ALTER TABLE users ADD COLUMN owned_customization TEXT NOT NULL DEFAULT '[]';
         ALTER TABLE users ADD COLUMN customization TEXT;
         ALTER TABLE users ADD COLUMN spotify_access_token TEXT;
         ALTER TABLE users ADD COLUMN spotify_refresh_token TEXT;

         CREATE TABLE IF NOT EXISTS chat_messages (
            message_id  TEXT PRIMARY KEY,
            chat_id     TEXT NOT NULL,
            sender_id   TEXT NOT NULL,
            sender_name TEXT NOT NULL,
            message     TEXT NOT NULL,
            read        INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL
         );

         CREATE TABLE IF NOT EXISTS chat_groups (
            group_id   TEXT PRIMARY KEY,
            name       TEXT NOT NULL,
            members    TEXT NOT NULL DEFAULT '[]',
            created_by TEXT NOT NULL,
            created_at TEXT NOT NULL
         );

         CREATE TABLE IF NOT EXISTS premium_subscriptions (
            subscription_id          TEXT PRIMARY KEY,
            user_id                  TEXT NOT NULL,
            plan                     TEXT NOT NULL,
            status                   TEXT NOT NULL,
            provider_subscription_id TEXT,
            started_at               TEXT NOT NULL,
            expires_at               TEXT NOT NULL
         );

         CREATE TABLE IF NOT EXISTS push_subscriptions (
            user_id      TEXT PRIMARY KEY,
            subscription TEXT NOT NULL,
            created_at   TEXT NOT NULL
         );

         CREATE INDEX IF NOT EXISTS idx_chat_messages_chat ON chat_messages(chat_id, created_at);
         CREATE INDEX IF NOT EXISTS idx_chat_messages_sender ON chat_messages(sender_id, created_at);
         CREATE INDEX IF NOT EXISTS idx_chat_groups_creator ON chat_groups(created_by);
         CREATE INDEX IF NOT EXISTS idx_premium_provider ON premium_subscriptions(provider_subscription_id);",
    )?;

    set_schema_version(&tx, 2)?;
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column_names(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("SELECT name FROM pragma_table_info('{table}')"))
            .unwrap();
        stmt.query_map([], |row| row.get::<_, String>(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn migrate_from_scratch() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();

        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);
        let users = column_names(&conn, "users");
        assert!(users.contains(&"streak_days".to_string()));
        assert!(users.contains(&"is_premium".to_string()));
        assert!(users.contains(&"spotify_refresh_token".to_string()));
        assert!(!column_names(&conn, "chat_messages").is_empty());
    }

    #[test]
    fn migrate_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);
    }

    #[test]
    fn incremental_migration_keeps_rows() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema_version_table(&conn).unwrap();
        migrate_v1(&conn).unwrap();
        conn.execute(
            "INSERT INTO users (user_id, email, name, created_at)
             VALUES ('user_1', 'a@b.c', 'Ada', '2024-01-01T00:00:00Z')",
            [],
        )
        .unwrap();

        migrate(&conn).unwrap();

        let (premium, owned): (bool, String) = conn
            .query_row(
                "SELECT is_premium, owned_customization FROM users WHERE user_id = 'user_1'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert!(!premium);
        assert_eq!(owned, "[]");
        assert_eq!(get_schema_version(&conn), 2);
    }
}
