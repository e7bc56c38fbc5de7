pub mod codec;

pub use codec::TranscriptFormat;

use crate::error::{ConversationError, CorruptTranscriptError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[serde(alias = "assistant")]
    Model,
    Tool,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Model => write!(f, "model"),
            Self::Tool => write!(f, "tool"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

impl ToolCallRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallRequest>,
    pub tool_call_id: Option<String>,
    pub tool_name: Option<String>,
    pub result: Option<Value>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
            tool_name: None,
            result: None,
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
            tool_name: None,
            result: None,
        }
    }

    pub fn model_with_tool_calls(content: Option<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            role: Role::Model,
            content,
            tool_calls,
            tool_call_id: None,
            tool_name: None,
            result: None,
        }
    }

    pub fn tool_result(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        result: Value,
    ) -> Self {
        Self {
            role: Role::Tool,
            content: None,
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
            tool_name: Some(tool_name.into()),
            result: Some(result),
        }
    }

    /// Plain text of the turn, if it has any.
    pub fn text(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.is_empty())
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Ordered, append-only transcript of one session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a turn. Tool turns must answer a still-unresolved request of
    /// the nearest preceding model turn.
    pub fn append(&mut self, turn: Turn) -> Result<(), ConversationError> {
        if turn.role == Role::Tool {
            let id = turn
                .tool_call_id
                .as_deref()
                .ok_or(ConversationError::MissingCallId)?;
            let (requested, resolved) = self.open_batch();
            if !requested.iter().any(|call| call.id == id) {
                return Err(ConversationError::UnmatchedToolResult(id.to_string()));
            }
            if resolved.contains(&id) {
                return Err(ConversationError::AlreadyResolved(id.to_string()));
            }
        }

        self.turns.push(turn);
        Ok(())
    }

    pub fn snapshot(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn pending_tool_calls(&self) -> Vec<&ToolCallRequest> {
        let (requested, resolved) = self.open_batch();
        requested
            .iter()
            .filter(|call| !resolved.contains(&call.id.as_str()))
            .collect()
    }

    /// Text-only encoding, compatible with existing transcript logs. Turns
    /// without plain text (pure tool-call requests, tool results) are dropped.
    pub fn serialize(&self) -> Result<Vec<u8>, serde_json::Error> {
        codec::encode_text(self)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, CorruptTranscriptError> {
        codec::decode_text(bytes)
    }

    pub fn encode(&self, format: TranscriptFormat) -> Result<Vec<u8>, serde_json::Error> {
        match format {
            TranscriptFormat::Text => codec::encode_text(self),
            TranscriptFormat::Tagged => codec::encode_tagged(self),
        }
    }

    pub fn decode(format: TranscriptFormat, bytes: &[u8]) -> Result<Self, CorruptTranscriptError> {
        match format {
            TranscriptFormat::Text => codec::decode_text(bytes),
            TranscriptFormat::Tagged => codec::decode_tagged(bytes),
        }
    }

    fn open_batch(&self) -> (&[ToolCallRequest], Vec<&str>) {
        let mut resolved = Vec::new();
        for turn in self.turns.iter().rev() {
            match turn.role {
                Role::Tool => {
                    if let Some(id) = turn.tool_call_id.as_deref() {
                        resolved.push(id);
                    }
                }
                Role::Model => return (&turn.tool_calls, resolved),
                Role::User => break,
            }
        }
        (&[], resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn with_pending_calls() -> Conversation {
        let mut conversation = Conversation::new();
        conversation.append(Turn::user("weather in Tokyo and London?")).unwrap();
        conversation
            .append(Turn::model_with_tool_calls(
                None,
                vec![
                    ToolCallRequest::new("call_0", "get_weather", json!({"city": "Tokyo"})),
                    ToolCallRequest::new("call_1", "get_weather", json!({"city": "London"})),
                ],
            ))
            .unwrap();
        conversation
    }

    #[test]
    fn append_keeps_order() {
        let mut conversation = Conversation::new();
        conversation.append(Turn::user("one")).unwrap();
        conversation.append(Turn::model("two")).unwrap();
        conversation.append(Turn::user("one")).unwrap();

        let texts: Vec<_> = conversation.snapshot().iter().filter_map(Turn::text).collect();
        assert_eq!(texts, vec!["one", "two", "one"]);
    }

    #[test]
    fn tool_turn_without_request_is_rejected() {
        let mut conversation = Conversation::new();
        conversation.append(Turn::user("hi")).unwrap();

        let err = conversation
            .append(Turn::tool_result("call_0", "get_weather", json!({})))
            .unwrap_err();
        assert_eq!(err, ConversationError::UnmatchedToolResult("call_0".into()));
        assert_eq!(conversation.len(), 1);
    }

    #[test]
    fn tool_turn_must_follow_its_model_turn() {
        let mut conversation = with_pending_calls();
        conversation.append(Turn::user("never mind")).unwrap();

        assert!(conversation.pending_tool_calls().is_empty());
        assert!(
            conversation
                .append(Turn::tool_result("call_0", "get_weather", json!({})))
                .is_err()
        );
    }

    #[test]
    fn each_request_resolves_once() {
        let mut conversation = with_pending_calls();
        assert_eq!(conversation.pending_tool_calls().len(), 2);

        conversation
            .append(Turn::tool_result("call_1", "get_weather", json!({"temp": "15C"})))
            .unwrap();
        let pending: Vec<_> = conversation
            .pending_tool_calls()
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(pending, vec!["call_0"]);

        let err = conversation
            .append(Turn::tool_result("call_1", "get_weather", json!({})))
            .unwrap_err();
        assert_eq!(err, ConversationError::AlreadyResolved("call_1".into()));
    }

    #[test]
    fn tool_turn_needs_call_id() {
        let mut conversation = with_pending_calls();
        let mut turn = Turn::tool_result("call_0", "get_weather", json!({}));
        turn.tool_call_id = None;
        assert_eq!(
            conversation.append(turn).unwrap_err(),
            ConversationError::MissingCallId
        );
    }

    #[test]
    fn empty_content_has_no_text() {
        assert_eq!(Turn::model("").text(), None);
        assert_eq!(Turn::model("ok").text(), Some("ok"));
    }
}
