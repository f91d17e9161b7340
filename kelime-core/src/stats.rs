use crate::models::percentage;
use crate::{SessionSummary, VocabularyCard};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_DAILY_GOAL: u32 = 20;

/// Repetition level at which a card counts as learned.
pub const LEARNED_REPETITIONS: u32 = 3;

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct LearningStats {
    pub total_reviews: u32,
    pub streak_days: u32,
    pub average_accuracy: u32,
    pub items_due: u32,
    pub items_learned: u32,
    pub next_review_time: Option<DateTime<Utc>>,
    pub daily_goal: u32,
    pub daily_progress: u32,
}

/// Card and session statistics as of `now`.
///
/// Day-based figures (streak and today's progress) use calendar days in
/// `now`'s time zone, so a host passing `Local::now()` gets the learner's
/// own midnight.
pub fn summarize<Tz: TimeZone>(
    cards: &[VocabularyCard],
    sessions: &[SessionSummary],
    now: DateTime<Tz>,
    daily_goal: u32,
) -> LearningStats {
    let tz = now.timezone();
    let today = now.date_naive();
    let now = now.with_timezone(&Utc);
    let total_reviews: u32 = cards.iter().map(|c| c.total_reviews()).sum();
    let total_correct: u32 = cards.iter().map(|c| c.correct_count).sum();

    LearningStats {
        total_reviews,
        streak_days: daily_streak(sessions, today, &tz),
        average_accuracy: percentage(total_correct, total_reviews),
        items_due: cards.iter().filter(|c| c.is_due(now)).count() as u32,
        items_learned: cards
            .iter()
            .filter(|c| c.schedule.repetition_level >= LEARNED_REPETITIONS)
            .count() as u32,
        next_review_time: cards
            .iter()
            .map(|c| c.schedule.next_review)
            .filter(|at| *at > now)
            .min(),
        daily_goal,
        daily_progress: daily_progress(sessions, today, &tz),
    }
}

fn local_day<Tz: TimeZone>(at: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    at.with_timezone(tz).date_naive()
}

/// Items reviewed per calendar day in `tz`, keyed by the day each session started.
pub fn items_per_day<Tz: TimeZone>(sessions: &[SessionSummary], tz: &Tz) -> BTreeMap<NaiveDate, u32> {
    let mut per_day = BTreeMap::new();
    for s in sessions {
        *per_day.entry(local_day(s.started_at, tz)).or_insert(0) += s.items_reviewed;
    }
    per_day
}

pub fn daily_progress<Tz: TimeZone>(sessions: &[SessionSummary], today: NaiveDate, tz: &Tz) -> u32 {
    items_per_day(sessions, tz).get(&today).copied().unwrap_or(0)
}

/// Consecutive days in `tz`, ending today, with at least one session started.
pub fn daily_streak<Tz: TimeZone>(sessions: &[SessionSummary], today: NaiveDate, tz: &Tz) -> u32 {
    let days: BTreeSet<NaiveDate> = sessions.iter().map(|s| local_day(s.started_at, tz)).collect();
    let mut streak = 0u32;
    let mut day = today;
    while days.contains(&day) {
        streak += 1;
        day -= Duration::days(1);
    }
    streak
}
