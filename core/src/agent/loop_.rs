use crate::agent::{ContextBuilder, ToolRegistry};
use crate::conversation::{Conversation, ToolCallRequest, Turn};
use crate::error::ChatError;
use crate::session::SessionRepository;
use crate::traits::{ChatRequest, Provider};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, warn};

pub const DEFAULT_MAX_ROUNDS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitingUser,
    ModelPending,
    ToolsPending,
    Done,
}

pub struct AgentLoop {
    provider: Arc<dyn Provider>,
    context_builder: ContextBuilder,
    tool_registry: Arc<ToolRegistry>,
    sessions: Arc<SessionRepository>,
    max_rounds: usize,
    parallel_tool_calls: bool,
}

impl AgentLoop {
    pub fn new(
        provider: Arc<dyn Provider>,
        context_builder: ContextBuilder,
        tool_registry: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            provider,
            context_builder,
            tool_registry,
            sessions: Arc::new(SessionRepository::in_memory()),
            max_rounds: DEFAULT_MAX_ROUNDS,
            parallel_tool_calls: false,
        }
    }

    pub fn with_sessions(mut self, sessions: Arc<SessionRepository>) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn with_max_rounds(mut self, max: usize) -> Self {
        self.max_rounds = max.max(1);
        self
    }

    pub fn with_parallel_tool_calls(mut self, enabled: bool) -> Self {
        self.parallel_tool_calls = enabled;
        self
    }

    pub fn sessions(&self) -> &Arc<SessionRepository> {
        &self.sessions
    }

    /// Runs one user message against the named session and persists the
    /// session once an answer is produced. A failed save is logged, not
    /// returned. The session stays locked for the whole call.
    pub async fn chat(&self, session_id: &str, message: &str) -> Result<String, ChatError> {
        let handle = self.sessions.open(session_id).await?;
        let mut conversation = handle.lock().await;

        let answer = self.process(&mut conversation, message).await?;
        // The answer is already in memory; a failed save is retried on the
        // next successful chat.
        if let Err(e) = self.sessions.persist(session_id, &conversation).await {
            warn!(session = session_id, error = %e, "Failed to save session");
        }
        Ok(answer)
    }

    /// Drives `conversation` from a new user message to a final answer.
    /// On error every turn appended so far is kept.
    pub async fn process(&self, conversation: &mut Conversation, message: &str) -> Result<String, ChatError> {
        conversation.append(Turn::user(message))?;

        let system_instruction = self.context_builder.build_system_instruction();
        let specs = self.tool_registry.get_specs();
        let tools = if specs.is_empty() { None } else { Some(specs.as_slice()) };

        let mut state = advance(LoopState::AwaitingUser, LoopState::ModelPending);

        for round in 1..=self.max_rounds {
            let request = ChatRequest {
                system_instruction: system_instruction.as_deref(),
                turns: conversation.snapshot(),
                tools,
                builtin_tools: &[],
            };
            debug!(provider = self.provider.name(), round, turns = request.turns.len(), "Requesting model");

            let response = match self.provider.chat(request).await {
                Ok(response) => response,
                Err(e) => {
                    error!(provider = self.provider.name(), round, error = %e, "Model request failed");
                    return Err(e.into());
                }
            };

            let text = response.text.filter(|t| !t.is_empty());

            if response.tool_calls.is_empty() {
                if let Some(text) = text {
                    conversation.append(Turn::model(text.clone()))?;
                    advance(state, LoopState::Done);
                    return Ok(text);
                }
                warn!(round, "Model returned neither text nor tool calls, asking again");
                continue;
            }

            let calls = dedupe_call_ids(response.tool_calls);
            conversation.append(Turn::model_with_tool_calls(text, calls.clone()))?;
            state = advance(state, LoopState::ToolsPending);

            let outcomes = self
                .tool_registry
                .dispatch_batch(&calls, self.parallel_tool_calls)
                .await;
            for (call, outcome) in calls.into_iter().zip(outcomes) {
                let result = outcome.unwrap_or_else(|e| e.to_payload());
                conversation.append(Turn::tool_result(call.id, call.name, result))?;
            }

            state = advance(state, LoopState::ModelPending);
        }

        warn!(rounds = self.max_rounds, "Tool loop exceeded round cap");
        Err(ChatError::ToolLoopExceeded {
            rounds: self.max_rounds,
        })
    }
}

fn advance(from: LoopState, to: LoopState) -> LoopState {
    debug!(?from, ?to, "Agent loop transition");
    to
}

/// Tool turns link back by id, so every call in a batch needs a distinct one.
fn dedupe_call_ids(calls: Vec<ToolCallRequest>) -> Vec<ToolCallRequest> {
    let mut seen = HashSet::new();
    calls
        .into_iter()
        .enumerate()
        .map(|(index, mut call)| {
            if call.id.is_empty() {
                call.id = format!("call_{index}");
            }
            while !seen.insert(call.id.clone()) {
                call.id = format!("{}_{index}", call.id);
            }
            call
        })
        .collect()
}
