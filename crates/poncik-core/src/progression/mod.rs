//! Progression engine: credit and XP accounting, level rollover and streaks.
//!
//! All functions here are pure. Callers pass the current date in so the
//! rules can be exercised without a clock.

mod streak;

pub use streak::{is_streak_alive, next_streak};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::User;

/// XP granted per focused minute.
pub const XP_PER_MINUTE: i64 = 10;
/// XP needed to leave a level is `level * XP_PER_LEVEL`.
pub const XP_PER_LEVEL: i64 = 1000;

/// Credits for a session of `minutes`, doubled when the bonus is active.
pub fn credits_for(minutes: i64, double_credits: bool) -> i64 {
    let multiplier = if double_credits { 2 } else { 1 };
    minutes * multiplier
}

pub fn xp_for(minutes: i64) -> i64 {
    minutes * XP_PER_MINUTE
}

/// Rolls surplus XP into levels until `xp < level * XP_PER_LEVEL`.
///
/// Returns the normalized `(level, xp)` pair. Several levels can be gained
/// in one call.
pub fn normalize_level(mut level: i64, mut xp: i64) -> (i64, i64) {
    level = level.max(1);
    while xp >= level * XP_PER_LEVEL {
        xp -= level * XP_PER_LEVEL;
        level += 1;
    }
    (level, xp)
}

/// Result of applying a completed focus session to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub credits_earned: i64,
    pub xp_earned: i64,
    pub credits: i64,
    pub level: i64,
    pub xp: i64,
    pub streak_days: i64,
    pub total_focus_minutes: i64,
    pub last_study_date: NaiveDate,
}

impl SessionOutcome {
    pub fn leveled_up_from(&self, previous_level: i64) -> bool {
        self.level > previous_level
    }
}

/// Computes the user's stats after a session of `minutes` completed `today`.
pub fn apply_session(user: &User, minutes: i64, double_credits: bool, today: NaiveDate) -> SessionOutcome {
    let credits_earned = credits_for(minutes, double_credits);
    let xp_earned = xp_for(minutes);
    let (level, xp) = normalize_level(user.level, user.xp + xp_earned);

    SessionOutcome {
        credits_earned,
        xp_earned,
        credits: user.credits + credits_earned,
        level,
        xp,
        streak_days: next_streak(user.streak_days, user.last_study_date, today),
        total_focus_minutes: user.total_focus_minutes + minutes,
        last_study_date: today,
    }
}

/// Level and XP after granting a flat reward of `xp_reward`.
pub fn grant_xp(level: i64, xp: i64, xp_reward: i64) -> (i64, i64) {
    normalize_level(level, xp + xp_reward)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn user(level: i64, xp: i64) -> User {
        let mut u = User::new("a@b.c", "Ada", None, Utc::now());
        u.level = level;
        u.xp = xp;
        u
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    #[test]
    fn ten_minutes_at_950_xp_levels_up() {
        let outcome = apply_session(&user(1, 950), 10, false, today());
        assert_eq!(outcome.level, 2);
        assert_eq!(outcome.xp, 50);
        assert_eq!(outcome.credits_earned, 10);
        assert_eq!(outcome.xp_earned, 100);
        assert!(outcome.leveled_up_from(1));
    }

    #[test]
    fn double_credits_do_not_double_xp() {
        let outcome = apply_session(&user(1, 0), 25, true, today());
        assert_eq!(outcome.credits_earned, 50);
        assert_eq!(outcome.xp_earned, 250);
    }

    #[test]
    fn first_session_sets_streak_to_one() {
        let u = user(1, 0);
        assert_eq!(u.streak_days, 0);
        let outcome = apply_session(&u, 5, false, today());
        assert_eq!(outcome.streak_days, 1);
        assert_eq!(outcome.last_study_date, today());
    }

    #[test]
    fn zero_minutes_still_counts_for_streak() {
        let mut u = user(3, 120);
        u.last_study_date = today().pred_opt();
        u.streak_days = 4;
        let outcome = apply_session(&u, 0, true, today());
        assert_eq!(outcome.credits_earned, 0);
        assert_eq!((outcome.level, outcome.xp), (3, 120));
        assert_eq!(outcome.streak_days, 5);
    }

    #[test]
    fn large_reward_spans_several_levels() {
        // 1000 + 2000 + 3000 consumed, 500 left at level 4
        assert_eq!(normalize_level(1, 6500), (4, 500));
    }

    proptest! {
        #[test]
        fn credits_follow_multiplier(m in 0i64..10_000, double in any::<bool>()) {
            let expected = if double { m * 2 } else { m };
            prop_assert_eq!(credits_for(m, double), expected);
            prop_assert_eq!(xp_for(m), m * 10);
        }

        #[test]
        fn normalization_restores_invariant(level in 1i64..50, xp in 0i64..5_000_000) {
            let (new_level, new_xp) = normalize_level(level, xp);
            prop_assert!(new_xp >= 0);
            prop_assert!(new_xp < new_level * XP_PER_LEVEL);
            prop_assert!(new_level >= level);
        }

        #[test]
        fn session_preserves_unrelated_fields(minutes in 0i64..600, xp in 0i64..1000) {
            let u = user(1, xp);
            let outcome = apply_session(&u, minutes, false, today());
            prop_assert_eq!(outcome.credits, u.credits + minutes);
            prop_assert_eq!(outcome.total_focus_minutes, minutes);
            prop_assert!(outcome.xp < outcome.level * XP_PER_LEVEL);
        }
    }
}
