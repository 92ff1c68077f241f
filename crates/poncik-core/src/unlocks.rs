//! Badge and achievement rules.
//!
//! Both catalogs are fixed tables of `(id, metric, threshold)` rows checked
//! against a [`UserMetrics`] snapshot. Badges are awarded automatically;
//! achievements must be claimed and pay out credits.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Quantity a badge or achievement threshold is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    TotalMinutes,
    Streak,
    Level,
    Purchases,
    Friends,
}

/// Current values of every [`Metric`] for one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMetrics {
    pub total_focus_minutes: i64,
    pub streak_days: i64,
    pub level: i64,
    pub purchase_count: i64,
    pub friend_count: i64,
}

impl UserMetrics {
    pub fn value(&self, metric: Metric) -> i64 {
        match metric {
            Metric::TotalMinutes => self.total_focus_minutes,
            Metric::Streak => self.streak_days,
            Metric::Level => self.level,
            Metric::Purchases => self.purchase_count,
            Metric::Friends => self.friend_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub badge_id: &'static str,
    pub name_tr: &'static str,
    pub name_en: &'static str,
    pub description_tr: &'static str,
    pub description_en: &'static str,
    pub icon: &'static str,
    pub requirement_type: Metric,
    pub requirement_value: i64,
}

pub const BADGES: &[Badge] = &[
    Badge {
        badge_id: "first_focus",
        name_tr: "İlk Adım",
        name_en: "First Step",
        description_tr: "İlk odaklanma seansını tamamla",
        description_en: "Complete your first focus session",
        icon: "🌟",
        requirement_type: Metric::TotalMinutes,
        requirement_value: 1,
    },
    Badge {
        badge_id: "hour_hero",
        name_tr: "Saat Kahramanı",
        name_en: "Hour Hero",
        description_tr: "Toplam 1 saat odaklan",
        description_en: "Focus for 1 hour total",
        icon: "⏰",
        requirement_type: Metric::TotalMinutes,
        requirement_value: 60,
    },
    Badge {
        badge_id: "streak_starter",
        name_tr: "Seri Başlangıcı",
        name_en: "Streak Starter",
        description_tr: "3 günlük seri yap",
        description_en: "Achieve a 3-day streak",
        icon: "🔥",
        requirement_type: Metric::Streak,
        requirement_value: 3,
    },
    Badge {
        badge_id: "streak_master",
        name_tr: "Seri Ustası",
        name_en: "Streak Master",
        description_tr: "7 günlük seri yap",
        description_en: "Achieve a 7-day streak",
        icon: "💪",
        requirement_type: Metric::Streak,
        requirement_value: 7,
    },
    Badge {
        badge_id: "level_5",
        name_tr: "Seviye 5",
        name_en: "Level 5",
        description_tr: "Seviye 5'e ulaş",
        description_en: "Reach level 5",
        icon: "🏆",
        requirement_type: Metric::Level,
        requirement_value: 5,
    },
    Badge {
        badge_id: "shopaholic",
        name_tr: "Alışveriş Delisi",
        name_en: "Shopaholic",
        description_tr: "10 ürün satın al",
        description_en: "Purchase 10 items",
        icon: "🛍️",
        requirement_type: Metric::Purchases,
        requirement_value: 10,
    },
    Badge {
        badge_id: "social_butterfly",
        name_tr: "Sosyal Kelebek",
        name_en: "Social Butterfly",
        description_tr: "5 arkadaş ekle",
        description_en: "Add 5 friends",
        icon: "🦋",
        requirement_type: Metric::Friends,
        requirement_value: 5,
    },
];

/// Badge ids the user qualifies for but has not been awarded yet.
///
/// Running this again after the awards are stored yields nothing.
pub fn newly_earned_badges(metrics: &UserMetrics, earned: &HashSet<String>) -> Vec<&'static str> {
    BADGES
        .iter()
        .filter(|b| !earned.contains(b.badge_id))
        .filter(|b| metrics.value(b.requirement_type) >= b.requirement_value)
        .map(|b| b.badge_id)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub id: &'static str,
    pub name_tr: &'static str,
    pub name_en: &'static str,
    pub desc_tr: &'static str,
    pub desc_en: &'static str,
    pub icon: &'static str,
    #[serde(rename = "type")]
    pub metric: Metric,
    pub target: i64,
    pub reward: i64,
}

macro_rules! achievement {
    ($id:literal, $name_tr:literal, $name_en:literal, $desc_tr:literal, $desc_en:literal,
     $icon:literal, $metric:ident, $target:literal, $reward:literal) => {
        Achievement {
            id: $id,
            name_tr: $name_tr,
            name_en: $name_en,
            desc_tr: $desc_tr,
            desc_en: $desc_en,
            icon: $icon,
            metric: Metric::$metric,
            target: $target,
            reward: $reward,
        }
    };
}

pub const ACHIEVEMENTS: &[Achievement] = &[
    achievement!("first_focus", "İlk Adım", "First Step", "İlk odaklanma seansını tamamla",
        "Complete your first focus session", "🌟", TotalMinutes, 1, 50),
    achievement!("hour_hero", "Saat Kahramanı", "Hour Hero", "Toplam 1 saat odaklan",
        "Focus for 1 hour total", "⏰", TotalMinutes, 60, 100),
    achievement!("focus_master", "Odak Ustası", "Focus Master", "Toplam 10 saat odaklan",
        "Focus for 10 hours total", "🎯", TotalMinutes, 600, 500),
    achievement!("streak_3", "Seri Başlangıcı", "Streak Starter", "3 günlük seri yap",
        "Achieve 3-day streak", "🔥", Streak, 3, 75),
    achievement!("streak_7", "Haftalık Savaşçı", "Weekly Warrior", "7 günlük seri yap",
        "Achieve 7-day streak", "💪", Streak, 7, 200),
    achievement!("streak_30", "Aylık Efsane", "Monthly Legend", "30 günlük seri yap",
        "Achieve 30-day streak", "👑", Streak, 30, 1000),
    achievement!("level_5", "Çırak", "Apprentice", "Seviye 5'e ulaş",
        "Reach level 5", "⭐", Level, 5, 150),
    achievement!("level_10", "Uzman", "Expert", "Seviye 10'a ulaş",
        "Reach level 10", "🏆", Level, 10, 400),
    achievement!("collector", "Koleksiyoncu", "Collector", "10 ürün satın al",
        "Purchase 10 items", "🛍️", Purchases, 10, 200),
    achievement!("social", "Sosyal Kelebek", "Social Butterfly", "5 arkadaş ekle",
        "Add 5 friends", "🦋", Friends, 5, 150),
];

pub fn find_achievement(id: &str) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

/// Achievement catalog entry annotated for one user.
#[derive(Debug, Clone, Serialize)]
pub struct AchievementProgress {
    #[serde(flatten)]
    pub achievement: Achievement,
    pub progress: i64,
    pub earned: bool,
}

impl Achievement {
    /// Progress toward the target, capped at the target.
    pub fn progress(&self, metrics: &UserMetrics) -> i64 {
        metrics.value(self.metric).min(self.target)
    }

    pub fn is_complete(&self, metrics: &UserMetrics) -> bool {
        self.progress(metrics) >= self.target
    }
}

pub fn achievement_progress(metrics: &UserMetrics, earned: &HashSet<String>) -> Vec<AchievementProgress> {
    ACHIEVEMENTS
        .iter()
        .map(|a| AchievementProgress {
            achievement: *a,
            progress: a.progress(metrics),
            earned: earned.contains(a.id),
        })
        .collect()
}
