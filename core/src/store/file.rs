use crate::conversation::{Conversation, TranscriptFormat};
use crate::error::{CorruptTranscriptError, PersistenceError};
use crate::store::validate_session_id;
use crate::traits::TranscriptStore;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// One JSON file per session under `dir`. Every save rewrites the whole
/// file through a temporary sibling that is renamed into place.
pub struct FileTranscriptStore {
    dir: PathBuf,
    format: TranscriptFormat,
}

impl FileTranscriptStore {
    pub fn new(dir: impl AsRef<Path>, format: TranscriptFormat) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            format,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, session_id: &str) -> Result<PathBuf, PersistenceError> {
        validate_session_id(session_id)?;
        Ok(self.dir.join(format!("{}.json", session_id)))
    }
}

#[async_trait]
impl TranscriptStore for FileTranscriptStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn load(&self, session_id: &str) -> Result<Option<Conversation>, PersistenceError> {
        let path = self.path_for(session_id)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PersistenceError::io(path, e)),
        };

        // Logs written in the other format stay readable after a config change.
        let format = TranscriptFormat::detect(&bytes).ok_or_else(|| {
            CorruptTranscriptError::new(format!("{} is not a transcript", path.display()))
        })?;
        let conversation = Conversation::decode(format, &bytes)?;
        Ok(Some(conversation))
    }

    async fn save(&self, session_id: &str, conversation: &Conversation) -> Result<(), PersistenceError> {
        let path = self.path_for(session_id)?;
        let bytes = conversation.encode(self.format)?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| PersistenceError::io(&self.dir, e))?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| PersistenceError::io(&tmp, e))?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(PersistenceError::io(&path, e));
        }

        tracing::debug!(session = session_id, path = %path.display(), bytes = bytes.len(), "Transcript saved");
        Ok(())
    }

    async fn remove(&self, session_id: &str) -> Result<bool, PersistenceError> {
        let path = self.path_for(session_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(PersistenceError::io(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{ToolCallRequest, Turn};
    use serde_json::json;
    use tempfile::TempDir;

    fn sample() -> Conversation {
        let mut conversation = Conversation::new();
        conversation.append(Turn::user("What is the weather in Tokyo?")).unwrap();
        conversation
            .append(Turn::model_with_tool_calls(
                None,
                vec![ToolCallRequest::new("call_0", "get_weather", json!({"city": "Tokyo"}))],
            ))
            .unwrap();
        conversation
            .append(Turn::tool_result(
                "call_0",
                "get_weather",
                json!({"temp": "12C", "condition": "Rainy"}),
            ))
            .unwrap();
        conversation.append(Turn::model("Rainy, 12C.")).unwrap();
        conversation
    }

    #[tokio::test]
    async fn missing_file_loads_as_none() {
        let tmp = TempDir::new().unwrap();
        let store = FileTranscriptStore::new(tmp.path(), TranscriptFormat::Text);
        assert!(store.load("default").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn text_store_keeps_only_text_turns() {
        let tmp = TempDir::new().unwrap();
        let store = FileTranscriptStore::new(tmp.path().join("sessions"), TranscriptFormat::Text);

        store.save("default", &sample()).await.unwrap();
        let restored = store.load("default").await.unwrap().unwrap();

        assert_eq!(restored.len(), 2);
        assert!(!tmp.path().join("sessions/default.json.tmp").exists());
    }

    #[tokio::test]
    async fn tagged_store_is_lossless() {
        let tmp = TempDir::new().unwrap();
        let store = FileTranscriptStore::new(tmp.path(), TranscriptFormat::Tagged);

        store.save("weather", &sample()).await.unwrap();
        assert_eq!(store.load("weather").await.unwrap(), Some(sample()));
    }

    #[tokio::test]
    async fn reads_logs_written_in_the_other_format() {
        let tmp = TempDir::new().unwrap();
        FileTranscriptStore::new(tmp.path(), TranscriptFormat::Text)
            .save("default", &sample())
            .await
            .unwrap();

        let tagged = FileTranscriptStore::new(tmp.path(), TranscriptFormat::Tagged);
        assert_eq!(tagged.load("default").await.unwrap().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn save_rewrites_the_whole_file() {
        let tmp = TempDir::new().unwrap();
        let store = FileTranscriptStore::new(tmp.path(), TranscriptFormat::Text);
        let mut conversation = Conversation::new();
        conversation.append(Turn::user("Hi, I am Yash.")).unwrap();
        store.save("default", &conversation).await.unwrap();
        conversation.append(Turn::model("Hello Yash!")).unwrap();
        store.save("default", &conversation).await.unwrap();

        let on_disk = std::fs::read(store.path_for("default").unwrap()).unwrap();
        assert_eq!(on_disk, conversation.serialize().unwrap());
    }

    #[tokio::test]
    async fn failed_rename_leaves_no_temp_file() {
        let tmp = TempDir::new().unwrap();
        let store = FileTranscriptStore::new(tmp.path(), TranscriptFormat::Text);
        // A non-empty directory where the transcript should go cannot be
        // replaced by a file.
        std::fs::create_dir(tmp.path().join("default.json")).unwrap();
        std::fs::write(tmp.path().join("default.json").join("keep"), "x").unwrap();

        let err = store.save("default", &sample()).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Io { .. }));
        assert!(!tmp.path().join("default.json.tmp").exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let tmp = TempDir::new().unwrap();
        let store = FileTranscriptStore::new(tmp.path(), TranscriptFormat::Text);
        std::fs::write(tmp.path().join("default.json"), "{ not json").unwrap();

        let err = store.load("default").await.unwrap_err();
        assert!(matches!(err, PersistenceError::Corrupt(_)));
    }

    #[tokio::test]
    async fn remove_reports_whether_a_file_existed() {
        let tmp = TempDir::new().unwrap();
        let store = FileTranscriptStore::new(tmp.path(), TranscriptFormat::Text);
        store.save("default", &sample()).await.unwrap();

        assert!(store.remove("default").await.unwrap());
        assert!(!store.remove("default").await.unwrap());
    }

    #[tokio::test]
    async fn rejects_path_like_session_ids() {
        let tmp = TempDir::new().unwrap();
        let store = FileTranscriptStore::new(tmp.path(), TranscriptFormat::Text);
        let err = store.save("../escape", &sample()).await.unwrap_err();
        assert!(matches!(err, PersistenceError::InvalidSessionId(_)));
    }
}
