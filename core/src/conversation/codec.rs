use super::{Conversation, Role, ToolCallRequest, Turn};
use crate::error::CorruptTranscriptError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptFormat {
    /// `{"role", "parts": [{"text"}]}` records. Lossy: tool calls and tool
    /// results are not carried across a restart.
    #[default]
    Text,
    /// One tagged record per turn, tool structure included.
    Tagged,
}

impl TranscriptFormat {
    /// Guesses the format of an encoded transcript from its first record.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        let records: Vec<Value> = serde_json::from_slice(bytes).ok()?;
        match records.first() {
            Some(first) if first.get("kind").is_some() => Some(Self::Tagged),
            Some(first) if first.get("role").is_some() => Some(Self::Text),
            Some(_) => None,
            None => Some(Self::Text),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TextRecord {
    role: Role,
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TextPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TaggedRecord {
    User {
        text: String,
    },
    ModelText {
        text: String,
    },
    ModelToolCall {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        calls: Vec<ToolCallRequest>,
    },
    ToolResult {
        call_id: String,
        name: String,
        result: Value,
    },
}

pub(crate) fn encode_text(conversation: &Conversation) -> Result<Vec<u8>, serde_json::Error> {
    let records: Vec<TextRecord> = conversation
        .snapshot()
        .iter()
        .filter_map(|turn| {
            turn.text().map(|text| TextRecord {
                role: turn.role,
                parts: vec![TextPart {
                    text: Some(text.to_string()),
                }],
            })
        })
        .collect();
    serde_json::to_vec_pretty(&records)
}

pub(crate) fn decode_text(bytes: &[u8]) -> Result<Conversation, CorruptTranscriptError> {
    let records: Vec<TextRecord> =
        serde_json::from_slice(bytes).map_err(|e| CorruptTranscriptError::new(e.to_string()))?;

    let mut turns = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        let text: String = record.parts.into_iter().filter_map(|p| p.text).collect();
        if text.is_empty() {
            continue;
        }
        let turn = match record.role {
            Role::User => Turn::user(text),
            Role::Model => Turn::model(text),
            Role::Tool => {
                return Err(CorruptTranscriptError::new(format!(
                    "record {index}: tool results cannot be restored from text records"
                )));
            }
        };
        turns.push(turn);
    }

    Ok(Conversation { turns })
}

pub(crate) fn encode_tagged(conversation: &Conversation) -> Result<Vec<u8>, serde_json::Error> {
    let mut records = Vec::with_capacity(conversation.len());
    for turn in conversation.snapshot() {
        let record = match turn.role {
            Role::User => TaggedRecord::User {
                text: turn.content.clone().unwrap_or_default(),
            },
            Role::Model if turn.has_tool_calls() => TaggedRecord::ModelToolCall {
                text: turn.content.clone(),
                calls: turn.tool_calls.clone(),
            },
            Role::Model => TaggedRecord::ModelText {
                text: turn.content.clone().unwrap_or_default(),
            },
            Role::Tool => {
                let Some(call_id) = turn.tool_call_id.clone() else {
                    continue;
                };
                TaggedRecord::ToolResult {
                    call_id,
                    name: turn.tool_name.clone().unwrap_or_default(),
                    result: turn.result.clone().unwrap_or(Value::Null),
                }
            }
        };
        records.push(record);
    }
    serde_json::to_vec_pretty(&records)
}

pub(crate) fn decode_tagged(bytes: &[u8]) -> Result<Conversation, CorruptTranscriptError> {
    let records: Vec<TaggedRecord> =
        serde_json::from_slice(bytes).map_err(|e| CorruptTranscriptError::new(e.to_string()))?;

    let mut conversation = Conversation::new();
    for (index, record) in records.into_iter().enumerate() {
        let turn = match record {
            TaggedRecord::User { text } => Turn::user(text),
            TaggedRecord::ModelText { text } => Turn::model(text),
            TaggedRecord::ModelToolCall { text, calls } => Turn::model_with_tool_calls(text, calls),
            TaggedRecord::ToolResult {
                call_id,
                name,
                result,
            } => Turn::tool_result(call_id, name, result),
        };
        conversation
            .append(turn)
            .map_err(|e| CorruptTranscriptError::new(format!("record {index}: {e}")))?;
    }
    Ok(conversation)
}
