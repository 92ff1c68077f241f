//! Daily quests.
//!
//! Each user gets one [`DailyQuestSet`] per UTC calendar day, created from
//! the fixed templates on first access and never regenerated for that day.
//! A quest's `completed` flag means its reward has been claimed.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestType {
    FocusTime,
    CompleteTodos,
    MaintainStreak,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    pub quest_id: String,
    #[serde(rename = "type")]
    pub quest_type: QuestType,
    pub title_tr: String,
    pub title_en: String,
    pub description_tr: String,
    pub description_en: String,
    pub target: i64,
    pub progress: i64,
    pub reward_credits: i64,
    pub reward_xp: i64,
    pub completed: bool,
}

impl Quest {
    pub fn is_ready(&self) -> bool {
        self.progress >= self.target
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyQuestSet {
    pub user_id: String,
    pub date: NaiveDate,
    pub quests: Vec<Quest>,
    pub created_at: DateTime<Utc>,
}

/// Reward paid out by a successful claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuestReward {
    pub credits: i64,
    pub xp: i64,
}

struct Template {
    id: &'static str,
    quest_type: QuestType,
    title_tr: &'static str,
    title_en: &'static str,
    description_tr: &'static str,
    description_en: &'static str,
    target: i64,
    reward_credits: i64,
    reward_xp: i64,
}

const TEMPLATES: [Template; 3] = [
    Template {
        id: "daily_focus_30",
        quest_type: QuestType::FocusTime,
        title_tr: "30 Dakika Odaklan",
        title_en: "Focus for 30 Minutes",
        description_tr: "Bugün toplam 30 dakika çalış",
        description_en: "Study for 30 minutes total today",
        target: 30,
        reward_credits: 50,
        reward_xp: 100,
    },
    Template {
        id: "daily_todo_3",
        quest_type: QuestType::CompleteTodos,
        title_tr: "3 Görev Tamamla",
        title_en: "Complete 3 Tasks",
        description_tr: "Bugün 3 yapılacak görevi tamamla",
        description_en: "Complete 3 to-do items today",
        target: 3,
        reward_credits: 30,
        reward_xp: 60,
    },
    Template {
        id: "daily_streak",
        quest_type: QuestType::MaintainStreak,
        title_tr: "Seri Devam",
        title_en: "Keep Streak",
        description_tr: "Günlük serini devam ettir",
        description_en: "Continue your daily streak",
        target: 1,
        reward_credits: 20,
        reward_xp: 40,
    },
];

impl DailyQuestSet {
    /// Fresh quest set for `user_id` on `date`, all progress at zero.
    pub fn generate(user_id: &str, date: NaiveDate, now: DateTime<Utc>) -> Self {
        let quests = TEMPLATES
            .iter()
            .map(|t| Quest {
                quest_id: t.id.to_string(),
                quest_type: t.quest_type,
                title_tr: t.title_tr.to_string(),
                title_en: t.title_en.to_string(),
                description_tr: t.description_tr.to_string(),
                description_en: t.description_en.to_string(),
                target: t.target,
                progress: 0,
                reward_credits: t.reward_credits,
                reward_xp: t.reward_xp,
                completed: false,
            })
            .collect();

        Self {
            user_id: user_id.to_string(),
            date,
            quests,
            created_at: now,
        }
    }

    /// Adds `amount` to every unclaimed quest of `quest_type`, clamped at
    /// the target. Returns whether anything changed.
    pub fn record_progress(&mut self, quest_type: QuestType, amount: i64) -> bool {
        if amount <= 0 {
            return false;
        }
        let mut changed = false;
        for quest in self
            .quests
            .iter_mut()
            .filter(|q| q.quest_type == quest_type && !q.completed)
        {
            let next = (quest.progress + amount).min(quest.target);
            if next != quest.progress {
                quest.progress = next;
                changed = true;
            }
        }
        changed
    }

    /// Marks a ready quest as claimed and returns its reward.
    pub fn claim(&mut self, quest_id: &str) -> Result<QuestReward> {
        let quest = self
            .quests
            .iter_mut()
            .find(|q| q.quest_id == quest_id)
            .ok_or_else(|| CoreError::not_found("Quest not found"))?;

        if quest.completed {
            return Err(CoreError::AlreadyClaimed("Quest already claimed".into()));
        }
        if !quest.is_ready() {
            return Err(CoreError::invalid("Quest not completed"));
        }

        quest.completed = true;
        Ok(QuestReward {
            credits: quest.reward_credits,
            xp: quest.reward_xp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set() -> DailyQuestSet {
        DailyQuestSet::generate(
            "user_1",
            NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            Utc::now(),
        )
    }

    #[test]
    fn generates_three_templates_in_order() {
        let s = set();
        let ids: Vec<_> = s.quests.iter().map(|q| q.quest_id.as_str()).collect();
        assert_eq!(ids, ["daily_focus_30", "daily_todo_3", "daily_streak"]);
        assert!(s.quests.iter().all(|q| q.progress == 0 && !q.completed));
    }

    #[test]
    fn progress_is_clamped_at_target() {
        let mut s = set();
        assert!(s.record_progress(QuestType::FocusTime, 25));
        assert!(s.record_progress(QuestType::FocusTime, 25));
        assert_eq!(s.quests[0].progress, 30);
        assert!(!s.record_progress(QuestType::FocusTime, 5));
        assert_eq!(s.quests[1].progress, 0);
    }

    #[test]
    fn claim_requires_progress() {
        let mut s = set();
        let err = s.claim("daily_todo_3").unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));
        assert!(!s.quests[1].completed);
    }

    #[test]
    fn claim_pays_once() {
        let mut s = set();
        s.record_progress(QuestType::MaintainStreak, 1);
        let reward = s.claim("daily_streak").unwrap();
        assert_eq!(reward, QuestReward { credits: 20, xp: 40 });

        let err = s.claim("daily_streak").unwrap_err();
        assert!(matches!(err, CoreError::AlreadyClaimed(_)));
        assert_eq!(err.to_string(), "Quest already claimed");
    }

    #[test]
    fn claimed_quest_stops_progressing() {
        let mut s = set();
        s.record_progress(QuestType::MaintainStreak, 1);
        s.claim("daily_streak").unwrap();
        assert!(!s.record_progress(QuestType::MaintainStreak, 1));
    }

    #[test]
    fn unknown_quest_is_not_found() {
        let mut s = set();
        assert!(matches!(s.claim("weekly"), Err(CoreError::NotFound(_))));
    }

    #[test]
    fn serializes_type_field() {
        let json = serde_json::to_value(&set().quests[1]).unwrap();
        assert_eq!(json["type"], "complete_todos");
        assert_eq!(json["reward_xp"], 60);
    }
}
