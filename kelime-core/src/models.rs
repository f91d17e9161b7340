use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::CoreError;

pub type CardId = String;
pub type SessionId = Uuid;

pub const EF_MIN: f64 = 1.3;
pub const EF_DEFAULT: f64 = 2.5;
pub const INTERVAL_DEFAULT: u32 = 1;
/// Longest gap the scheduler will put between two reviews (100 years).
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

/// Lowest quality rating that counts as a successful recall.
pub const PASS_QUALITY: u8 = 3;
pub const MAX_QUALITY: u8 = 5;

/// SM-2 quality rating of a single recall attempt, always in `0..=5`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub fn new(rating: u8) -> Result<Self, CoreError> {
        if rating > MAX_QUALITY {
            return Err(CoreError::InvalidInput(format!(
                "quality rating {rating} outside 0..={MAX_QUALITY}"
            )));
        }
        Ok(Self(rating))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_pass(self) -> bool {
        self.0 >= PASS_QUALITY
    }
}

impl TryFrom<u8> for Quality {
    type Error = CoreError;

    fn try_from(rating: u8) -> Result<Self, Self::Error> {
        Quality::new(rating)
    }
}

impl From<Quality> for u8 {
    fn from(q: Quality) -> u8 {
        q.0
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The three response buckets a learner picks from after seeing the answer.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn quality(self) -> Quality {
        match self {
            Difficulty::Easy => Quality(5),
            Difficulty::Medium => Quality(3),
            Difficulty::Hard => Quality(1),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(CoreError::InvalidInput(format!(
                "unknown difficulty label {other:?}"
            ))),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DueStatus {
    New,
    Due,
    Future,
}

/// Scheduling state of one card, as read and produced by the scheduler.
///
/// Deserializing rejects an ease factor below [`EF_MIN`] (or NaN) and an
/// interval outside `1..=MAX_INTERVAL_DAYS`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RawCardState")]
pub struct CardState {
    pub ease_factor: f64,
    pub interval_days: u32,
    pub repetition_level: u32,
    pub next_review: DateTime<Utc>,
}

impl CardState {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            ease_factor: EF_DEFAULT,
            interval_days: INTERVAL_DEFAULT,
            repetition_level: 0,
            next_review: now,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if !(self.ease_factor >= EF_MIN && self.ease_factor.is_finite()) {
            return Err(CoreError::InvalidInput(format!(
                "ease factor {} below {EF_MIN}",
                self.ease_factor
            )));
        }
        if !(1..=MAX_INTERVAL_DAYS).contains(&self.interval_days) {
            return Err(CoreError::InvalidInput(format!(
                "interval {} outside 1..={MAX_INTERVAL_DAYS} days",
                self.interval_days
            )));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct RawCardState {
    ease_factor: f64,
    interval_days: u32,
    repetition_level: u32,
    next_review: DateTime<Utc>,
}

impl TryFrom<RawCardState> for CardState {
    type Error = CoreError;

    fn try_from(raw: RawCardState) -> Result<Self, Self::Error> {
        let state = CardState {
            ease_factor: raw.ease_factor,
            interval_days: raw.interval_days,
            repetition_level: raw.repetition_level,
            next_review: raw.next_review,
        };
        state.validate()?;
        Ok(state)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct VocabularyCard {
    pub id: CardId,
    pub turkish: String,
    pub english: String,
    #[serde(default)]
    pub pronunciation: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,

    pub schedule: CardState,
    #[serde(default)]
    pub last_reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub correct_count: u32,
    #[serde(default)]
    pub incorrect_count: u32,

    pub created_at: DateTime<Utc>,
}

impl VocabularyCard {
    pub fn new(turkish: impl Into<String>, english: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), turkish, english, Utc::now())
    }

    pub fn with_id(
        id: impl Into<CardId>,
        turkish: impl Into<String>,
        english: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            turkish: turkish.into(),
            english: english.into(),
            pronunciation: None,
            category: None,
            tags: Vec::new(),
            schedule: CardState::new(now),
            last_reviewed_at: None,
            correct_count: 0,
            incorrect_count: 0,
            created_at: now,
        }
    }

    pub fn is_new(&self) -> bool {
        self.last_reviewed_at.is_none()
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.schedule.next_review <= now
    }

    pub fn total_reviews(&self) -> u32 {
        self.correct_count + self.incorrect_count
    }

    pub fn due_status(&self, now: DateTime<Utc>) -> DueStatus {
        if self.is_new() {
            DueStatus::New
        } else if self.is_due(now) {
            DueStatus::Due
        } else {
            DueStatus::Future
        }
    }
}

/// One presentation of one card inside a session.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ReviewResult {
    pub card_id: CardId,
    pub difficulty: Difficulty,
    pub quality_rating: Quality,
    pub response_time_seconds: f64,
    /// Times the answer was revealed before the learner responded.
    pub attempts: u32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionOutcome {
    pub session_id: SessionId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<ReviewResult>,
    pub total_elapsed_seconds: f64,
}

impl SessionOutcome {
    pub fn correct_count(&self) -> u32 {
        self.results
            .iter()
            .filter(|r| r.quality_rating.is_pass())
            .count() as u32
    }

    pub fn incorrect_count(&self) -> u32 {
        self.results.len() as u32 - self.correct_count()
    }

    /// Whole-number percentage of passing results; 0 for an empty session.
    pub fn accuracy(&self) -> u32 {
        percentage(self.correct_count(), self.results.len() as u32)
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.session_id,
            started_at: self.started_at,
            finished_at: self.finished_at,
            items_reviewed: self.results.len() as u32,
            correct_answers: self.correct_count(),
            incorrect_answers: self.incorrect_count(),
            accuracy: self.accuracy(),
            time_spent_minutes: (self.total_elapsed_seconds / 60.0).round() as u32,
        }
    }
}

/// Persisted record of a finished session, kept for streak and progress stats.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSummary {
    pub id: SessionId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub items_reviewed: u32,
    pub correct_answers: u32,
    pub incorrect_answers: u32,
    pub accuracy: u32,
    pub time_spent_minutes: u32,
}

pub(crate) fn percentage(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        0
    } else {
        (part as f64 / whole as f64 * 100.0).round() as u32
    }
}
