use crate::{DueStatus, VocabularyCard};
use chrono::{DateTime, Utc};

pub fn filter_by_text(cards: &[VocabularyCard], query: &str) -> Vec<VocabularyCard> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return cards.to_vec();
    }
    cards
        .iter()
        .filter(|c| {
            c.turkish.to_lowercase().contains(&q)
                || c.english.to_lowercase().contains(&q)
                || c.tags.iter().any(|t| t.to_lowercase().contains(&q))
        })
        .cloned()
        .collect()
}

pub fn filter_by_tag(cards: &[VocabularyCard], tag: &str) -> Vec<VocabularyCard> {
    let q = tag.trim().to_lowercase();
    cards
        .iter()
        .filter(|c| c.tags.iter().any(|t| t.to_lowercase() == q))
        .cloned()
        .collect()
}

pub fn filter_by_category(cards: &[VocabularyCard], category: &str) -> Vec<VocabularyCard> {
    let q = category.trim();
    cards
        .iter()
        .filter(|c| {
            c.category
                .as_deref()
                .map(|cat| cat.eq_ignore_ascii_case(q))
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

pub fn filter_by_due(
    cards: &[VocabularyCard],
    now: DateTime<Utc>,
    want: DueStatus,
) -> Vec<VocabularyCard> {
    cards
        .iter()
        .filter(|c| c.due_status(now) == want)
        .cloned()
        .collect()
}

/// Cards whose next review is at or before `now`, most overdue first.
pub fn due_cards(cards: &[VocabularyCard], now: DateTime<Utc>) -> Vec<VocabularyCard> {
    let mut due: Vec<VocabularyCard> = cards.iter().filter(|c| c.is_due(now)).cloned().collect();
    due.sort_by_key(|c| (c.schedule.next_review, c.created_at));
    due
}
