//! Day-based study streak continuity.

use chrono::NaiveDate;

/// Streak after a focus session completed on `today`.
///
/// A session on the day after the last study day extends the streak, a gap
/// of two or more days restarts it at 1, and a session on the same day (or
/// a stored date ahead of `today`) leaves it unchanged.
pub fn next_streak(current: i64, last_study_date: Option<NaiveDate>, today: NaiveDate) -> i64 {
    let Some(last) = last_study_date else {
        return 1;
    };

    match (today - last).num_days() {
        1 => current + 1,
        d if d > 1 => 1,
        _ => current,
    }
}

/// Whether the streak is still alive on `today` without a new session.
pub fn is_streak_alive(last_study_date: Option<NaiveDate>, today: NaiveDate) -> bool {
    match last_study_date {
        Some(last) => (today - last).num_days() <= 1,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn first_session_starts_streak() {
        assert_eq!(next_streak(0, None, date(2024, 5, 1)), 1);
    }

    #[test]
    fn next_day_extends() {
        assert_eq!(next_streak(4, Some(date(2024, 5, 1)), date(2024, 5, 2)), 5);
    }

    #[test]
    fn month_boundary_counts_as_consecutive() {
        assert_eq!(next_streak(2, Some(date(2024, 2, 29)), date(2024, 3, 1)), 3);
    }

    #[test]
    fn gap_resets_to_one() {
        assert_eq!(next_streak(9, Some(date(2024, 5, 1)), date(2024, 5, 3)), 1);
        assert_eq!(next_streak(9, Some(date(2023, 5, 1)), date(2024, 5, 3)), 1);
    }

    #[test]
    fn same_day_is_noop() {
        assert_eq!(next_streak(3, Some(date(2024, 5, 1)), date(2024, 5, 1)), 3);
    }

    #[test]
    fn future_last_date_is_noop() {
        assert_eq!(next_streak(3, Some(date(2024, 5, 9)), date(2024, 5, 1)), 3);
    }

    #[test]
    fn alive_until_a_day_is_skipped() {
        let today = date(2024, 5, 3);
        assert!(is_streak_alive(Some(date(2024, 5, 3)), today));
        assert!(is_streak_alive(Some(date(2024, 5, 2)), today));
        assert!(!is_streak_alive(Some(date(2024, 5, 1)), today));
        assert!(!is_streak_alive(None, today));
    }
}
