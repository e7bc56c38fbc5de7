use crate::conversation::{Role, ToolCallRequest, Turn};
use crate::error::TransportError;
use crate::providers::normalize_arguments;
use crate::traits::{BuiltinTool, ChatRequest, ChatResponse, Provider, ToolSpec};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTool>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thought: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<GeminiFunctionCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_response: Option<GeminiFunctionResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    #[serde(skip_serializing_if = "Option::is_none")]
    function_declarations: Option<Vec<GeminiFunctionDeclaration>>,
    #[serde(rename = "google_search", skip_serializing_if = "Option::is_none")]
    google_search: Option<Value>,
}

#[derive(Debug, Serialize)]
struct GeminiFunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f64,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: api_key.into(),
            model: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
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

    fn build_request(&self, request: ChatRequest<'_>) -> GeminiRequest {
        let system_instruction = request.system_instruction.map(|text| GeminiContent {
            role: None,
            parts: vec![text_part(text)],
        });

        let mut tools = Vec::new();
        if let Some(specs) = request.tools.filter(|specs| !specs.is_empty()) {
            tools.push(GeminiTool {
                function_declarations: Some(convert_tools(specs)),
                google_search: None,
            });
        }
        for builtin in request.builtin_tools {
            match builtin {
                BuiltinTool::WebSearch => tools.push(GeminiTool {
                    function_declarations: None,
                    google_search: Some(json!({})),
                }),
            }
        }

        GeminiRequest {
            system_instruction,
            contents: convert_turns(request.turns),
            tools,
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        }
    }
}

fn text_part(text: &str) -> GeminiPart {
    GeminiPart {
        text: Some(text.to_string()),
        ..Default::default()
    }
}

/// Maps turns onto `contents`. Consecutive tool turns answer the same model
/// turn and travel together as one user content of function responses.
fn convert_turns(turns: &[Turn]) -> Vec<GeminiContent> {
    let mut contents: Vec<GeminiContent> = Vec::with_capacity(turns.len());

    for turn in turns {
        match turn.role {
            Role::User => contents.push(GeminiContent {
                role: Some("user".to_string()),
                parts: vec![text_part(turn.content.as_deref().unwrap_or_default())],
            }),
            Role::Model => {
                let mut parts = Vec::new();
                if let Some(text) = turn.text() {
                    parts.push(text_part(text));
                }
                for call in &turn.tool_calls {
                    parts.push(GeminiPart {
                        function_call: Some(GeminiFunctionCall {
                            name: call.name.clone(),
                            args: call.arguments.clone(),
                        }),
                        ..Default::default()
                    });
                }
                contents.push(GeminiContent {
                    role: Some("model".to_string()),
                    parts,
                });
            }
            Role::Tool => {
                let part = GeminiPart {
                    function_response: Some(GeminiFunctionResponse {
                        name: turn.tool_name.clone().unwrap_or_default(),
                        response: wrap_response(turn.result.clone().unwrap_or(Value::Null)),
                    }),
                    ..Default::default()
                };
                match contents.last_mut() {
                    Some(last)
                        if !last.parts.is_empty()
                            && last.parts.iter().all(|p| p.function_response.is_some()) =>
                    {
                        last.parts.push(part)
                    }
                    _ => contents.push(GeminiContent {
                        role: Some("user".to_string()),
                        parts: vec![part],
                    }),
                }
            }
        }
    }

    contents
}

// Function responses must be JSON objects.
fn wrap_response(result: Value) -> Value {
    if result.is_object() {
        result
    } else {
        json!({ "result": result })
    }
}

fn convert_tools(tools: &[ToolSpec]) -> Vec<GeminiFunctionDeclaration> {
    tools
        .iter()
        .map(|t| GeminiFunctionDeclaration {
            name: t.name.clone(),
            description: t.description.clone(),
            parameters: t.parameters_schema.clone(),
        })
        .collect()
}

fn parse_response(response: GeminiResponse) -> Result<ChatResponse, TransportError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let feedback = response
            .prompt_feedback
            .map(|f| f.to_string())
            .unwrap_or_default();
        return Err(TransportError::InvalidResponse(format!(
            "no candidates in response {}",
            feedback
        )));
    };

    let Some(content) = candidate.content else {
        return Err(TransportError::InvalidResponse(format!(
            "candidate has no content (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    };

    let mut text = String::new();
    let mut tool_calls = Vec::new();
    for part in content.parts {
        if part.thought == Some(true) {
            continue;
        }
        if let Some(t) = part.text {
            text.push_str(&t);
        }
        if let Some(call) = part.function_call {
            // Gemini does not assign call ids.
            let index = tool_calls.len();
            let args = normalize_arguments(call.args);
            let digest = md5::compute(args.to_string().as_bytes());
            tool_calls.push(ToolCallRequest::new(
                format!("call_{}_{:x}", index, digest),
                call.name,
                args,
            ));
        }
    }

    Ok(ChatResponse {
        text: if text.is_empty() { None } else { Some(text) },
        tool_calls,
    })
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn chat(&self, request: ChatRequest<'_>) -> Result<ChatResponse, TransportError> {
        let gemini_request = self.build_request(request);

        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url, self.model))
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&gemini_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }

        let gemini_response: GeminiResponse = response.json().await?;
        parse_response(gemini_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weather_spec() -> ToolSpec {
        ToolSpec {
            name: "get_weather".into(),
            description: "Get the current weather".into(),
            parameters_schema: json!({
                "type": "object",
                "properties": {"city": {"type": "string"}},
                "required": ["city"]
            }),
        }
    }

    fn exchange() -> Vec<Turn> {
        vec![
            Turn::user("Weather in Tokyo and London?"),
            Turn::model_with_tool_calls(
                Some("Checking.".into()),
                vec![
                    ToolCallRequest::new("a", "get_weather", json!({"city": "Tokyo"})),
                    ToolCallRequest::new("b", "get_weather", json!({"city": "London"})),
                ],
            ),
            Turn::tool_result("a", "get_weather", json!({"temp": "12C"})),
            Turn::tool_result("b", "get_weather", json!("15C")),
        ]
    }

    #[test]
    fn request_shape() {
        let provider = GeminiProvider::new("key").with_temperature(0.2);
        let turns = exchange();
        let specs = vec![weather_spec()];
        let request = ChatRequest {
            system_instruction: Some("You are Orbit."),
            turns: &turns,
            tools: Some(&specs),
            builtin_tools: &[],
        };

        let body = serde_json::to_value(provider.build_request(request)).unwrap();
        assert_eq!(body["systemInstruction"], json!({"parts": [{"text": "You are Orbit."}]}));
        assert_eq!(body["generationConfig"]["temperature"], json!(0.2));
        assert_eq!(body["tools"][0]["functionDeclarations"][0]["name"], "get_weather");

        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0], json!({"role": "user", "parts": [{"text": "Weather in Tokyo and London?"}]}));
        assert_eq!(contents[1]["parts"][0], json!({"text": "Checking."}));
        assert_eq!(
            contents[1]["parts"][1],
            json!({"functionCall": {"name": "get_weather", "args": {"city": "Tokyo"}}})
        );
        assert_eq!(contents[2]["role"], "user");
        assert_eq!(
            contents[2]["parts"],
            json!([
                {"functionResponse": {"name": "get_weather", "response": {"temp": "12C"}}},
                {"functionResponse": {"name": "get_weather", "response": {"result": "15C"}}}
            ])
        );
    }

    #[test]
    fn web_search_uses_builtin_tool() {
        let provider = GeminiProvider::new("key");
        let turns = vec![Turn::user("latest rust release")];
        let mut request = ChatRequest::new(&turns);
        request.builtin_tools = &[BuiltinTool::WebSearch];

        let body = serde_json::to_value(provider.build_request(request)).unwrap();
        assert_eq!(body["tools"], json!([{"google_search": {}}]));
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn parses_function_calls_with_synthesized_ids() {
        let raw = json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"functionCall": {"name": "multiply", "args": {"a": 55, "b": 10}}},
                    {"functionCall": {"name": "multiply", "args": {"a": 55, "b": 10}}}
                ]},
                "finishReason": "STOP"
            }]
        });
        let response = parse_response(serde_json::from_value(raw).unwrap()).unwrap();

        assert_eq!(response.text, None);
        assert_eq!(response.tool_calls.len(), 2);
        let digest = format!("{:x}", md5::compute(json!({"a": 55, "b": 10}).to_string()));
        assert_eq!(response.tool_calls[0].id, format!("call_0_{digest}"));
        assert_eq!(response.tool_calls[1].id, format!("call_1_{digest}"));
        assert_eq!(response.tool_calls[0].arguments, json!({"a": 55, "b": 10}));
    }

    #[test]
    fn call_without_args_gets_an_empty_object() {
        let raw = json!({
            "candidates": [{"content": {"role": "model", "parts": [
                {"functionCall": {"name": "get_time"}}
            ]}}]
        });
        let response = parse_response(serde_json::from_value(raw).unwrap()).unwrap();

        let call = &response.tool_calls[0];
        assert_eq!(call.name, "get_time");
        assert_eq!(call.arguments, json!({}));
        assert_eq!(call.id, format!("call_0_{:x}", md5::compute("{}")));

        // The empty object is what goes back to the model next round.
        let turns = vec![Turn::model_with_tool_calls(None, response.tool_calls)];
        let contents = serde_json::to_value(convert_turns(&turns)).unwrap();
        assert_eq!(
            contents[0]["parts"][0],
            json!({"functionCall": {"name": "get_time", "args": {}}})
        );
    }

    #[test]
    fn parses_text_and_skips_thoughts() {
        let raw = json!({
            "candidates": [{"content": {"role": "model", "parts": [
                {"text": "thinking...", "thought": true},
                {"text": "Copy that. "},
                {"text": "Trajectory calculated."}
            ]}}]
        });
        let response = parse_response(serde_json::from_value(raw).unwrap()).unwrap();
        assert_eq!(response.text.as_deref(), Some("Copy that. Trajectory calculated."));
        assert!(!response.has_tool_calls());
    }

    #[test]
    fn blocked_prompt_is_invalid_response() {
        let raw = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        let err = parse_response(serde_json::from_value(raw).unwrap()).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));

        let raw = json!({"candidates": [{"finishReason": "SAFETY"}]});
        let err = parse_response(serde_json::from_value(raw).unwrap()).unwrap_err();
        assert!(matches!(err, TransportError::InvalidResponse(_)));
    }
}
