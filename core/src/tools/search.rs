use crate::conversation::Turn;
use crate::tools::extract_string_arg;
use crate::traits::{BuiltinTool, ChatRequest, Provider, Tool};
use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

const SEARCH_CAPABILITIES: &[BuiltinTool] = &[BuiltinTool::WebSearch];

/// Answers a query with a separate single-shot model request that has the
/// provider's built-in web search enabled and no local tools.
pub struct SearchTool {
    provider: Arc<dyn Provider>,
}

impl SearchTool {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "request_web_search"
    }

    fn description(&self) -> &str {
        "Search the web for current events or facts. Use this when the answer depends on up-to-date information."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What to search for"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let query = extract_string_arg(&args, "query")?;
        tracing::debug!(%query, provider = self.provider.name(), "Running web search");

        let turns = [Turn::user(format!("Answer this using web search: {}", query))];
        let request = ChatRequest {
            builtin_tools: SEARCH_CAPABILITIES,
            ..ChatRequest::new(&turns)
        };
        let response = self.provider.chat(request).await?;

        let answer = response
            .text
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| anyhow!("Web search returned no answer"))?;
        Ok(json!({ "source": "web_search", "answer": answer }))
    }
}
