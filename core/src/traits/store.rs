use crate::conversation::Conversation;
use crate::error::PersistenceError;
use async_trait::async_trait;

/// Durable home of session transcripts.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    fn name(&self) -> &str;

    /// Returns `Ok(None)` when nothing has been saved for the session yet.
    async fn load(&self, session_id: &str) -> Result<Option<Conversation>, PersistenceError>;

    async fn save(&self, session_id: &str, conversation: &Conversation) -> Result<(), PersistenceError>;

    async fn remove(&self, session_id: &str) -> Result<bool, PersistenceError>;
}
