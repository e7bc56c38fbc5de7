use crate::conversation::{ToolCallRequest, Turn};
use crate::error::TransportError;
use crate::traits::{BuiltinTool, ChatRequest, ChatResponse, Provider};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub system_instruction: Option<String>,
    pub turns: Vec<Turn>,
    pub tool_names: Vec<String>,
    pub builtin_tools: Vec<BuiltinTool>,
}

/// Replays canned responses in order and records every request it receives.
/// Once the script runs out, every request fails with a transport error.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<ChatResponse, TransportError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: impl IntoIterator<Item = Result<ChatResponse, TransportError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, response: Result<ChatResponse, TransportError>) {
        self.script.lock().unwrap().push_back(response);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, request: ChatRequest<'_>) -> Result<ChatResponse, TransportError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            system_instruction: request.system_instruction.map(str::to_string),
            turns: request.turns.to_vec(),
            tool_names: request
                .tools
                .unwrap_or_default()
                .iter()
                .map(|t| t.name.clone())
                .collect(),
            builtin_tools: request.builtin_tools.to_vec(),
        });

        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::InvalidResponse("script exhausted".into())))
    }
}

pub fn call(id: &str, name: &str, arguments: Value) -> ToolCallRequest {
    ToolCallRequest::new(id, name, arguments)
}

pub fn text(text: &str) -> Result<ChatResponse, TransportError> {
    Ok(ChatResponse::with_text(text))
}

pub fn calls(calls: Vec<ToolCallRequest>) -> Result<ChatResponse, TransportError> {
    Ok(ChatResponse::with_tool_calls(calls))
}
