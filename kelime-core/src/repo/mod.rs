use crate::{CoreError, SessionSummary, VocabularyCard};
use async_trait::async_trait;

pub mod memory;

/// Number of session summaries a repository keeps; older ones are dropped.
pub const SESSION_HISTORY_LIMIT: usize = 100;

#[async_trait]
pub trait Repository: Send + Sync {
    // Cards
    async fn add_card(&self, card: &VocabularyCard) -> Result<VocabularyCard, CoreError>;
    async fn get_card(&self, id: &str) -> Result<VocabularyCard, CoreError>;
    async fn list_cards(&self) -> Result<Vec<VocabularyCard>, CoreError>;
    async fn update_card(&self, card: &VocabularyCard) -> Result<VocabularyCard, CoreError>;
    async fn delete_card(&self, id: &str) -> Result<(), CoreError>;

    // Sessions
    async fn record_session(&self, summary: &SessionSummary) -> Result<(), CoreError>;
    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, CoreError>;
}

/// Appends `summary`, then drops the oldest entries past the history limit.
pub fn push_session(history: &mut Vec<SessionSummary>, summary: SessionSummary) {
    history.push(summary);
    if history.len() > SESSION_HISTORY_LIMIT {
        let excess = history.len() - SESSION_HISTORY_LIMIT;
        history.drain(..excess);
    }
}
