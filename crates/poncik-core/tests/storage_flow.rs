//! End-to-end flows against an on-disk database.

use chrono::{Duration, Utc};
use poncik_core::models::FocusSession;
use poncik_core::models::FocusStatus;
use poncik_core::premium::Plan;
use poncik_core::storage::migrations::SCHEMA_VERSION;
use poncik_core::{Config, CoreError, Database, User};

fn start(db: &Database, user_id: &str, id: &str) {
    db.insert_focus_session(&FocusSession {
        session_id: id.to_string(),
        user_id: user_id.to_string(),
        duration_minutes: 25,
        started_at: Utc::now(),
        status: FocusStatus::Active,
        ended_at: None,
        actual_minutes: None,
        credits_earned: None,
        double_credits: None,
    })
    .unwrap();
}

#[test]
fn data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("poncik.db");

    let user_id = {
        let db = Database::open_at(&path).unwrap();
        let user = db
            .upsert_identity("ada@example.com", "Ada", None, Utc::now())
            .unwrap();
        start(&db, &user.user_id, "focus_1");
        db.complete_focus_session(&user.user_id, "focus_1", 25, true, Utc::now())
            .unwrap();
        user.user_id
    };

    let db = Database::open_at(&path).unwrap();
    assert_eq!(db.schema_version(), SCHEMA_VERSION);
    assert_eq!(db.shop_items().unwrap().len(), 20);
    let user = db.require_user(&user_id).unwrap();
    assert_eq!(user.credits, 50 + 50);
    assert_eq!(user.xp, 250);
    assert_eq!(user.streak_days, 1);
}

#[test]
fn open_uses_configured_path() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.database.path = Some(dir.path().join("custom.db").to_string_lossy().into_owned());
    let db = Database::open(&config).unwrap();
    assert_eq!(db.count_users().unwrap(), 0);
    assert!(dir.path().join("custom.db").exists());
}

#[test]
fn login_refreshes_existing_profile() {
    let db = Database::open_memory().unwrap();
    let first = db
        .upsert_identity("ada@example.com", "Ada", None, Utc::now())
        .unwrap();
    let again = db
        .upsert_identity(
            "ada@example.com",
            "Ada L.",
            Some("https://img.example/ada.png".into()),
            Utc::now(),
        )
        .unwrap();
    assert_eq!(first.user_id, again.user_id);
    assert_eq!(again.name, "Ada L.");
    assert_eq!(again.picture.as_deref(), Some("https://img.example/ada.png"));
    assert_eq!(db.count_users().unwrap(), 1);
}

#[test]
fn streak_grows_over_consecutive_days() {
    let db = Database::open_memory().unwrap();
    let user = User::new("ada@example.com", "Ada", None, Utc::now());
    db.insert_user(&user).unwrap();

    let day1 = Utc::now() - Duration::days(2);
    let day2 = day1 + Duration::days(1);
    for (i, when) in [day1, day1, day2].into_iter().enumerate() {
        let id = format!("focus_{i}");
        start(&db, &user.user_id, &id);
        db.complete_focus_session(&user.user_id, &id, 5, false, when)
            .unwrap();
    }
    assert_eq!(db.require_user(&user.user_id).unwrap().streak_days, 2);
}

#[test]
fn leaderboard_orders_by_minutes() {
    let db = Database::open_memory().unwrap();
    for (email, minutes) in [("a@x.io", 30), ("b@x.io", 90), ("c@x.io", 60)] {
        let mut user = User::new(email, email, None, Utc::now());
        user.total_focus_minutes = minutes;
        db.insert_user(&user).unwrap();
    }
    let board = db.leaderboard(20).unwrap();
    let minutes: Vec<i64> = board.iter().map(|p| p.total_focus_minutes).collect();
    assert_eq!(minutes, vec![90, 60, 30]);
}

#[test]
fn premium_gates_premium_only_customization() {
    let db = Database::open_memory().unwrap();
    let user = User::new("ada@example.com", "Ada", None, Utc::now());
    db.insert_user(&user).unwrap();
    let now = Utc::now();

    let err = db
        .purchase_customization(&user.user_id, "skin_ninja", now)
        .unwrap_err();
    assert!(matches!(err, CoreError::Locked(_)));

    db.activate_premium(&user.user_id, Plan::Monthly, None, now)
        .unwrap();
    let after = db
        .purchase_customization(&user.user_id, "skin_ninja", now)
        .unwrap();
    assert!(after.owned_customization.contains(&"skin_ninja".to_string()));
    assert_eq!(after.credits, 50);
}
