//! # Poncik Core Library
//!
//! Business logic for the PoncikFocus study companion: focus sessions earn
//! credits and XP, streaks and levels unlock badges, daily quests and shop
//! items, and friends can chat while they study. The HTTP server is a thin
//! layer over this crate.
//!
//! ## Architecture
//!
//! - **Progression**: pure credit/XP/level/streak arithmetic
//! - **Unlocks**: badge and achievement catalogs evaluated against user metrics
//! - **Quests**: the per-day quest set and its claim rules
//! - **Storage**: SQLite document tables and TOML configuration
//! - **Integrations**: identity exchange, payments, push relay, music OAuth
//!
//! ## Key Components
//!
//! - [`Database`]: persistence for every collection
//! - [`Config`]: application configuration management
//! - [`progression::apply_session`]: stats after a completed session

pub mod auth;
pub mod catalog;
pub mod chat;
pub mod error;
pub mod events;
pub mod integrations;
pub mod models;
pub mod premium;
pub mod progression;
pub mod quests;
pub mod signing;
pub mod storage;
pub mod unlocks;

pub use error::{ConfigError, CoreError, DatabaseError, OAuthError, Result, ValidationError};
pub use events::RealtimeEvent;
pub use models::{User, UserUpdate};
pub use storage::{Config, Database};
