use crate::{CardState, CoreError, Quality, VocabularyCard, EF_MIN, MAX_INTERVAL_DAYS};
use chrono::{DateTime, Duration, Utc};

pub struct ScheduleOutcome {
    pub updated_card: VocabularyCard,
    pub previous: CardState,
}

fn clamp_ef(x: f64) -> f64 {
    x.max(EF_MIN)
}

fn ease_delta(quality: Quality) -> f64 {
    let miss = (5 - quality.value()) as f64;
    0.1 - miss * (0.08 + miss * 0.02)
}

/// SM-2 step: the state a card moves to after one recall attempt.
///
/// Intervals are 1 day after the first success, 6 after the second, and
/// `interval * ease` (with the ease the card had going in) after that. Any
/// rating below 3 resets the streak and the interval to one day. The ease
/// factor moves on every review and never drops below [`EF_MIN`]. Intervals
/// are capped at [`MAX_INTERVAL_DAYS`].
pub fn compute_next_state(state: &CardState, quality: Quality, now: DateTime<Utc>) -> CardState {
    let (interval_days, repetition_level) = if quality.is_pass() {
        let interval = match state.repetition_level {
            0 => 1,
            1 => 6,
            _ => {
                let base = state.interval_days.max(1) as f64;
                let grown = (base * state.ease_factor).round().max(1.0);
                grown.min(MAX_INTERVAL_DAYS as f64) as u32
            }
        };
        (interval, state.repetition_level + 1)
    } else {
        (1, 0)
    };

    CardState {
        ease_factor: clamp_ef(state.ease_factor + ease_delta(quality)),
        interval_days,
        repetition_level,
        next_review: now
            .checked_add_signed(Duration::days(interval_days as i64))
            .unwrap_or(DateTime::<Utc>::MAX_UTC),
    }
}

/// Same as [`compute_next_state`] for an unvalidated integer rating.
pub fn compute_next_state_for_rating(
    state: &CardState,
    rating: u8,
    now: DateTime<Utc>,
) -> Result<CardState, CoreError> {
    let quality = Quality::new(rating)?;
    Ok(compute_next_state(state, quality, now))
}

pub fn apply_review(mut card: VocabularyCard, quality: Quality, now: DateTime<Utc>) -> ScheduleOutcome {
    let previous = card.schedule.clone();
    card.schedule = compute_next_state(&previous, quality, now);
    card.last_reviewed_at = Some(now);
    if quality.is_pass() {
        card.correct_count += 1;
    } else {
        card.incorrect_count += 1;
    }

    ScheduleOutcome {
        updated_card: card,
        previous,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ease_delta_matches_sm2_table() {
        let deltas: Vec<f64> = (0..=5)
            .map(|q| ease_delta(Quality::new(q).unwrap()))
            .collect();
        let want = [-0.8, -0.54, -0.32, -0.14, 0.0, 0.1];
        for (got, want) in deltas.iter().zip(want) {
            assert!((got - want).abs() < 1e-9, "got {got}, want {want}");
        }
    }
}
