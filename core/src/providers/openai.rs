use crate::conversation::{Role, ToolCallRequest, Turn};
use crate::error::TransportError;
use crate::providers::normalize_arguments;
use crate::traits::{ChatRequest, ChatResponse, Provider, ToolSpec};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAITool>>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAIToolCallRequest>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct OpenAIToolCallRequest {
    id: String,
    r#type: &'static str,
    function: OpenAIFunction,
}

#[derive(Debug, Serialize)]
struct OpenAITool {
    r#type: &'static str,
    function: OpenAIToolFunction,
}

#[derive(Debug, Serialize)]
struct OpenAIToolFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAIToolCall {
    id: String,
    function: OpenAIFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIFunction {
    name: String,
    arguments: String,
}

pub struct OpenAIProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f64,
}

impl OpenAIProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: api_key.into(),
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 1.0,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    fn build_request(&self, request: ChatRequest<'_>) -> Result<OpenAIRequest, TransportError> {
        if !request.builtin_tools.is_empty() {
            return Err(TransportError::Unsupported(format!(
                "built-in tools {:?} are not available on {}",
                request.builtin_tools, self.model
            )));
        }

        let mut messages = Vec::with_capacity(request.turns.len() + 1);
        if let Some(instruction) = request.system_instruction {
            messages.push(OpenAIMessage {
                role: "system",
                content: Some(instruction.to_string()),
                tool_calls: None,
                tool_call_id: None,
            });
        }
        messages.extend(request.turns.iter().map(convert_turn));

        Ok(OpenAIRequest {
            model: self.model.clone(),
            messages,
            tools: request
                .tools
                .filter(|t| !t.is_empty())
                .map(convert_tools),
            temperature: self.temperature,
        })
    }
}

fn convert_turn(turn: &Turn) -> OpenAIMessage {
    match turn.role {
        Role::User => OpenAIMessage {
            role: "user",
            content: turn.content.clone(),
            tool_calls: None,
            tool_call_id: None,
        },
        Role::Model => {
            let tool_calls = turn.has_tool_calls().then(|| {
                turn.tool_calls
                    .iter()
                    .map(|tc| OpenAIToolCallRequest {
                        id: tc.id.clone(),
                        r#type: "function",
                        function: OpenAIFunction {
                            name: tc.name.clone(),
                            arguments: tc.arguments.to_string(),
                        },
                    })
                    .collect()
            });
            OpenAIMessage {
                role: "assistant",
                content: turn.text().map(str::to_string),
                tool_calls,
                tool_call_id: None,
            }
        }
        Role::Tool => OpenAIMessage {
            role: "tool",
            content: Some(turn.result.as_ref().map(Value::to_string).unwrap_or_default()),
            tool_calls: None,
            tool_call_id: turn.tool_call_id.clone(),
        },
    }
}

fn convert_tools(tools: &[ToolSpec]) -> Vec<OpenAITool> {
    tools
        .iter()
        .map(|t| OpenAITool {
            r#type: "function",
            function: OpenAIToolFunction {
                name: t.name.clone(),
                description: t.description.clone(),
                parameters: t.parameters_schema.clone(),
            },
        })
        .collect()
}

fn parse_response(response: OpenAIResponse) -> Result<ChatResponse, TransportError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| TransportError::InvalidResponse("no choices in response".into()))?;

    // Unparseable arguments are passed through as a string so argument
    // validation reports them to the model.
    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|c| {
            let arguments = normalize_arguments(
                serde_json::from_str(&c.function.arguments)
                    .unwrap_or(Value::String(c.function.arguments)),
            );
            ToolCallRequest::new(c.id, c.function.name, arguments)
        })
        .collect();

    Ok(ChatResponse {
        text: choice.message.content.filter(|c| !c.trim().is_empty()),
        tool_calls,
    })
}

#[async_trait]
impl Provider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn chat(&self, request: ChatRequest<'_>) -> Result<ChatResponse, TransportError> {
        let openai_request = self.build_request(request)?;

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&openai_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }

        let openai_response: OpenAIResponse = response.json().await?;
        parse_response(openai_response)
    }
}
