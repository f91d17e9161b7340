//! One pass over a fixed set of cards.
//!
//! Each card is shown exactly once. The learner's response is turned into a
//! quality rating, the card is rescheduled on the spot, and a
//! [`ReviewResult`] is recorded. Cards are not filtered by due date here;
//! callers choose the set.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::clock::Clock;
use crate::scheduler::apply_review;
use crate::{CoreError, Difficulty, ReviewResult, SessionId, SessionOutcome, VocabularyCard};

#[derive(Clone, Debug, PartialEq)]
pub enum SessionState {
    Idle,
    AwaitingResponse {
        index: usize,
        presented_at: DateTime<Utc>,
        attempts: u32,
    },
    Complete,
}

/// Returned by every accepted response.
#[derive(Clone, Debug)]
pub struct Submission {
    pub done: bool,
    /// The card as rescheduled by this response, ready to persist.
    pub updated_card: VocabularyCard,
    pub result: ReviewResult,
}

pub struct ReviewSession {
    id: SessionId,
    clock: Arc<dyn Clock>,
    state: SessionState,
    cards: Vec<VocabularyCard>,
    results: Vec<ReviewResult>,
    started_at: Option<DateTime<Utc>>,
    outcome: Option<SessionOutcome>,
}

impl ReviewSession {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            id: Uuid::new_v4(),
            clock,
            state: SessionState::Idle,
            cards: Vec::new(),
            results: Vec::new(),
            started_at: None,
            outcome: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == SessionState::Complete
    }

    pub fn start(&mut self, cards: Vec<VocabularyCard>) -> Result<(), CoreError> {
        if self.state != SessionState::Idle {
            return Err(CoreError::InvalidState("session already started"));
        }
        let now = self.clock.now();
        self.started_at = Some(now);
        self.cards = cards;

        if self.cards.is_empty() {
            self.finish(now, now);
        } else {
            self.state = SessionState::AwaitingResponse {
                index: 0,
                presented_at: now,
                attempts: 0,
            };
        }
        Ok(())
    }

    pub fn current_card(&self) -> Option<&VocabularyCard> {
        match self.state {
            SessionState::AwaitingResponse { index, .. } => self.cards.get(index),
            _ => None,
        }
    }

    /// `(cards answered, cards in session)`.
    pub fn progress(&self) -> (usize, usize) {
        (self.results.len(), self.cards.len())
    }

    /// Marks the current card's answer as shown once more.
    pub fn reveal(&mut self) -> Result<u32, CoreError> {
        match &mut self.state {
            SessionState::AwaitingResponse { attempts, .. } => {
                *attempts += 1;
                Ok(*attempts)
            }
            _ => Err(CoreError::InvalidState("no card is being presented")),
        }
    }

    pub fn submit_label(&mut self, label: &str) -> Result<Submission, CoreError> {
        let difficulty: Difficulty = label.parse()?;
        self.submit_response(difficulty)
    }

    pub fn submit_response(&mut self, difficulty: Difficulty) -> Result<Submission, CoreError> {
        let SessionState::AwaitingResponse {
            index,
            presented_at,
            attempts,
        } = self.state
        else {
            return Err(CoreError::InvalidState(match self.state {
                SessionState::Idle => "session not started",
                _ => "session already complete",
            }));
        };

        let now = self.clock.now();
        let quality = difficulty.quality();
        let card = self.cards[index].clone();
        let card_id = card.id.clone();
        let updated = apply_review(card, quality, now).updated_card;
        self.cards[index] = updated.clone();

        let result = ReviewResult {
            card_id,
            difficulty,
            quality_rating: quality,
            response_time_seconds: seconds_between(presented_at, now),
            attempts,
            timestamp: now,
        };
        self.results.push(result.clone());

        if index + 1 < self.cards.len() {
            self.state = SessionState::AwaitingResponse {
                index: index + 1,
                presented_at: now,
                attempts: 0,
            };
        } else {
            let started_at = self.started_at.unwrap_or(now);
            self.finish(started_at, now);
        }

        Ok(Submission {
            done: self.is_complete(),
            updated_card: updated,
            result,
        })
    }

    pub fn outcome(&self) -> Result<&SessionOutcome, CoreError> {
        self.outcome
            .as_ref()
            .ok_or(CoreError::InvalidState("session not complete"))
    }

    /// Working copies, including any rescheduling applied so far.
    pub fn cards(&self) -> &[VocabularyCard] {
        &self.cards
    }

    pub fn into_cards(self) -> Vec<VocabularyCard> {
        self.cards
    }

    fn finish(&mut self, started_at: DateTime<Utc>, now: DateTime<Utc>) {
        self.state = SessionState::Complete;
        self.outcome = Some(SessionOutcome {
            session_id: self.id,
            started_at,
            finished_at: now,
            results: self.results.clone(),
            total_elapsed_seconds: seconds_between(started_at, now),
        });
    }
}

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0
}
