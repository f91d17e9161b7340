use crate::repo::push_session;
use crate::{CardId, CoreError, SessionSummary, VocabularyCard};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
pub struct MemoryRepo {
    cards: RwLock<HashMap<CardId, VocabularyCard>>,
    sessions: RwLock<Vec<SessionSummary>>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl crate::repo::Repository for MemoryRepo {
    async fn add_card(&self, card: &VocabularyCard) -> Result<VocabularyCard, CoreError> {
        let mut m = self.cards.write();
        if m.contains_key(&card.id) {
            return Err(CoreError::Conflict("card id already exists"));
        }
        m.insert(card.id.clone(), card.clone());
        Ok(card.clone())
    }

    async fn get_card(&self, id: &str) -> Result<VocabularyCard, CoreError> {
        self.cards
            .read()
            .get(id)
            .cloned()
            .ok_or(CoreError::NotFound("card"))
    }

    async fn list_cards(&self) -> Result<Vec<VocabularyCard>, CoreError> {
        let mut v: Vec<VocabularyCard> = self.cards.read().values().cloned().collect();
        v.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(v)
    }

    async fn update_card(&self, card: &VocabularyCard) -> Result<VocabularyCard, CoreError> {
        let mut m = self.cards.write();
        let Some(slot) = m.get_mut(&card.id) else {
            return Err(CoreError::NotFound("card"));
        };
        *slot = card.clone();
        Ok(card.clone())
    }

    async fn delete_card(&self, id: &str) -> Result<(), CoreError> {
        self.cards
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or(CoreError::NotFound("card"))
    }

    async fn record_session(&self, summary: &SessionSummary) -> Result<(), CoreError> {
        push_session(&mut self.sessions.write(), summary.clone());
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, CoreError> {
        Ok(self.sessions.read().clone())
    }
}
