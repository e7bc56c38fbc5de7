use crate::conversation::{Conversation, TranscriptFormat};
use crate::error::PersistenceError;
use crate::store::validate_session_id;
use crate::traits::TranscriptStore;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Keeps encoded transcripts in process memory, so a reload goes through
/// the same codec as a file would.
#[derive(Default)]
pub struct MemoryTranscriptStore {
    format: TranscriptFormat,
    transcripts: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryTranscriptStore {
    pub fn new(format: TranscriptFormat) -> Self {
        Self {
            format,
            transcripts: Mutex::new(HashMap::new()),
        }
    }

    pub async fn insert_raw(&self, session_id: &str, bytes: impl Into<Vec<u8>>) {
        self.transcripts
            .lock()
            .await
            .insert(session_id.to_string(), bytes.into());
    }

    pub async fn raw(&self, session_id: &str) -> Option<Vec<u8>> {
        self.transcripts.lock().await.get(session_id).cloned()
    }
}

#[async_trait]
impl TranscriptStore for MemoryTranscriptStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load(&self, session_id: &str) -> Result<Option<Conversation>, PersistenceError> {
        validate_session_id(session_id)?;
        let transcripts = self.transcripts.lock().await;
        let Some(bytes) = transcripts.get(session_id) else {
            return Ok(None);
        };
        Ok(Some(Conversation::decode(self.format, bytes)?))
    }

    async fn save(&self, session_id: &str, conversation: &Conversation) -> Result<(), PersistenceError> {
        validate_session_id(session_id)?;
        let bytes = conversation.encode(self.format)?;
        self.transcripts
            .lock()
            .await
            .insert(session_id.to_string(), bytes);
        Ok(())
    }

    async fn remove(&self, session_id: &str) -> Result<bool, PersistenceError> {
        Ok(self.transcripts.lock().await.remove(session_id).is_some())
    }
}
