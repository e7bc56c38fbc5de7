use crate::config::TranscriptConfig;
use crate::store::{FileTranscriptStore, MemoryTranscriptStore};
use crate::traits::TranscriptStore;
use std::sync::Arc;

pub fn create_transcript_store(config: &TranscriptConfig) -> Arc<dyn TranscriptStore> {
    if config.enabled {
        Arc::new(FileTranscriptStore::new(config.sessions_dir(), config.format))
    } else {
        Arc::new(MemoryTranscriptStore::new(config.format))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn factory_file() {
        let tmp = TempDir::new().unwrap();
        let config = TranscriptConfig {
            dir: Some(tmp.path().to_path_buf()),
            ..Default::default()
        };
        assert_eq!(create_transcript_store(&config).name(), "file");
    }

    #[test]
    fn factory_disabled() {
        let config = TranscriptConfig {
            enabled: false,
            ..Default::default()
        };
        assert_eq!(create_transcript_store(&config).name(), "memory");
    }
}
