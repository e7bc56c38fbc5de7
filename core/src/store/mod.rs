pub mod factory;
pub mod file;
pub mod in_memory;

pub use factory::create_transcript_store;
pub use file::FileTranscriptStore;
pub use in_memory::MemoryTranscriptStore;

use crate::error::PersistenceError;

/// Session ids become file names, so they are kept to a safe alphabet.
pub fn validate_session_id(session_id: &str) -> Result<(), PersistenceError> {
    let valid = !session_id.is_empty()
        && session_id.len() <= 128
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(PersistenceError::InvalidSessionId(session_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_alphabet() {
        assert!(validate_session_id("default").is_ok());
        assert!(validate_session_id("mission_log-2").is_ok());
        assert!(validate_session_id("").is_err());
        assert!(validate_session_id("../etc/passwd").is_err());
        assert!(validate_session_id("a b").is_err());
    }
}
