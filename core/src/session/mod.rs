use crate::conversation::Conversation;
use crate::conversation::TranscriptFormat;
use crate::error::PersistenceError;
use crate::store::MemoryTranscriptStore;
use crate::traits::TranscriptStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub const DEFAULT_SESSION: &str = "default";

/// Shared handle to one session's conversation. Holding the lock serializes
/// chat calls on that session.
pub type SessionHandle = Arc<Mutex<Conversation>>;

pub fn create_session_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Maps session ids to live conversations and writes them through to a
/// [`TranscriptStore`].
pub struct SessionRepository {
    store: Arc<dyn TranscriptStore>,
    sessions: Mutex<HashMap<String, SessionHandle>>,
}

impl SessionRepository {
    pub fn new(store: Arc<dyn TranscriptStore>) -> Self {
        Self {
            store,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTranscriptStore::new(TranscriptFormat::Text)))
    }

    pub fn store(&self) -> &Arc<dyn TranscriptStore> {
        &self.store
    }

    /// Returns the live handle for `session_id`, loading it from the store on
    /// first use. A corrupt transcript starts the session over empty.
    pub async fn open(&self, session_id: &str) -> Result<SessionHandle, PersistenceError> {
        let mut sessions = self.sessions.lock().await;
        if let Some(handle) = sessions.get(session_id) {
            return Ok(handle.clone());
        }

        let conversation = match self.store.load(session_id).await {
            Ok(Some(conversation)) => {
                info!(session = session_id, turns = conversation.len(), "Session loaded");
                conversation
            }
            Ok(None) => Conversation::new(),
            Err(PersistenceError::Corrupt(e)) => {
                warn!(session = session_id, error = %e, "Corrupt transcript, starting empty");
                Conversation::new()
            }
            Err(e) => return Err(e),
        };

        let handle = Arc::new(Mutex::new(conversation));
        sessions.insert(session_id.to_string(), handle.clone());
        Ok(handle)
    }

    pub async fn persist(&self, session_id: &str, conversation: &Conversation) -> Result<(), PersistenceError> {
        self.store.save(session_id, conversation).await?;
        info!(session = session_id, turns = conversation.len(), store = self.store.name(), "Session saved");
        Ok(())
    }

    /// Drops the live conversation and its stored transcript. Returns whether
    /// anything was stored.
    pub async fn forget(&self, session_id: &str) -> Result<bool, PersistenceError> {
        let removed = self.sessions.lock().await.remove(session_id);
        // A chat still holding the handle saves before the transcript goes.
        let _in_flight = match &removed {
            Some(handle) => Some(handle.lock().await),
            None => None,
        };
        self.store.remove(session_id).await
    }

    pub async fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.lock().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl Default for SessionRepository {
    fn default() -> Self {
        Self::in_memory()
    }
}
