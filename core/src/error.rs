use serde_json::{Value, json};
use std::path::PathBuf;
use thiserror::Error;

/// Failure talking to the model service. Surfaced to the caller of `chat`.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("model service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("unsupported by this provider: {0}")]
    Unsupported(String),
}

/// Failure of a single tool call. Never raised past the agent loop; it is
/// folded into the tool turn so the model can see it and recover.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("Tool '{0}' not found")]
    UnknownTool(String),

    #[error("Invalid arguments for '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("Execution of '{tool}' failed: {message}")]
    Execution { tool: String, message: String },
}

impl ToolError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownTool(_) => "unknown_tool",
            Self::InvalidArguments { .. } => "invalid_arguments",
            Self::Execution { .. } => "execution_failed",
        }
    }

    pub fn to_payload(&self) -> Value {
        json!({
            "error": {
                "kind": self.kind(),
                "message": self.to_string(),
            }
        })
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("corrupt transcript: {reason}")]
pub struct CorruptTranscriptError {
    reason: String,
}

impl CorruptTranscriptError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error("tool result '{0}' does not answer a pending tool call")]
    UnmatchedToolResult(String),

    #[error("tool call '{0}' has already been resolved")]
    AlreadyResolved(String),

    #[error("tool turn is missing its call id")]
    MissingCallId,
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Corrupt(#[from] CorruptTranscriptError),

    #[error("failed to encode transcript: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("invalid session id: {0:?}")]
    InvalidSessionId(String),
}

impl PersistenceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Outcome of a failed `chat` call. The conversation keeps every turn that
/// was appended before the failure.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("model service failed: {0}")]
    Transport(#[from] TransportError),

    #[error("model kept requesting tools after {rounds} rounds")]
    ToolLoopExceeded { rounds: usize },

    #[error(transparent)]
    Conversation(#[from] ConversationError),

    #[error("session storage failed: {0}")]
    Persistence(#[from] PersistenceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_error_payload_carries_kind_and_message() {
        let err = ToolError::Execution {
            tool: "calc_bmi".into(),
            message: "division by zero".into(),
        };
        let payload = err.to_payload();
        assert_eq!(payload["error"]["kind"], "execution_failed");
        assert!(
            payload["error"]["message"]
                .as_str()
                .unwrap()
                .contains("division by zero")
        );
    }

    #[test]
    fn unknown_tool_kind() {
        let err = ToolError::UnknownTool("teleport".into());
        assert_eq!(err.kind(), "unknown_tool");
        assert_eq!(err.to_string(), "Tool 'teleport' not found");
    }
}
