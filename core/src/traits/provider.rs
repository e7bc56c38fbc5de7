use crate::conversation::{ToolCallRequest, Turn};
use crate::error::TransportError;
use crate::traits::ToolSpec;
use async_trait::async_trait;

/// Capabilities the model service runs on its side, as opposed to tools the
/// agent executes locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinTool {
    WebSearch,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatResponse {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCallRequest>,
}

impl ChatResponse {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn with_tool_calls(tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            text: None,
            tool_calls,
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub system_instruction: Option<&'a str>,
    pub turns: &'a [Turn],
    pub tools: Option<&'a [ToolSpec]>,
    pub builtin_tools: &'a [BuiltinTool],
}

impl<'a> ChatRequest<'a> {
    pub fn new(turns: &'a [Turn]) -> Self {
        Self {
            system_instruction: None,
            turns,
            tools: None,
            builtin_tools: &[],
        }
    }
}

#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    async fn chat(&self, request: ChatRequest<'_>) -> Result<ChatResponse, TransportError>;
}
