//! Anthropic Messages API client

use super::types::*;
use super::{InferenceError, InferenceErrorKind, InferenceService};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_MAX_TOKENS: u32 = 1024;
const API_VERSION: &str = "2023-06-01";

/// Inference backend configuration, read from the environment by the
/// embedding layer. A missing API key is not an error here; the agent
/// detects it at call start and short-circuits with a fallback.
#[derive(Debug, Clone, Default)]
pub struct InferenceConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

impl InferenceConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
            model: std::env::var("CONCIERGE_MODEL").ok(),
            base_url: std::env::var("CONCIERGE_INFERENCE_URL").ok(),
        }
    }
}

/// Anthropic client implementation
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl AnthropicClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: "https://api.anthropic.com/v1/messages".to_string(),
        }
    }

    /// Build a client from configuration. Returns `None` when no usable
    /// API key is present.
    pub fn from_config(config: &InferenceConfig) -> Option<Self> {
        let api_key = config.api_key.as_deref().filter(|k| !k.is_empty())?;
        let mut client = Self::new(
            api_key,
            config.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        );
        if let Some(url) = &config.base_url {
            client.base_url = format!("{}/v1/messages", url.trim_end_matches('/'));
        }
        Some(client)
    }

    fn translate_request(&self, request: &ChatRequest) -> AnthropicRequest {
        let messages: Vec<AnthropicMessage> = request
            .messages
            .iter()
            .map(translate_message)
            .collect();

        let tools: Vec<AnthropicTool> = request
            .tools
            .iter()
            .map(|t| AnthropicTool {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: t.input_schema.clone(),
            })
            .collect();

        let tool_choice = match request.tool_choice {
            ToolChoice::Auto => None,
            ToolChoice::Any => Some(AnthropicToolChoice {
                r#type: "any".to_string(),
            }),
        };

        AnthropicRequest {
            model: self.model.clone(),
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system: request.system.clone(),
            messages,
            temperature: request.temperature,
            tools: if tools.is_empty() { None } else { Some(tools) },
            tool_choice,
        }
    }

    fn classify_error(&self, status: reqwest::StatusCode, body: &str) -> InferenceError {
        match status.as_u16() {
            401 | 403 => InferenceError::auth(format!("Authentication failed: {body}")),
            429 => InferenceError::rate_limit(format!("Rate limited: {body}")),
            400 => InferenceError::invalid_request(format!("Invalid request: {body}")),
            500..=599 => InferenceError::server_error(format!("Server error: {body}")),
            _ => InferenceError::unknown(format!("HTTP {status}: {body}")),
        }
    }
}

fn translate_message(msg: &ChatMessage) -> AnthropicMessage {
    let role = match msg.role {
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    };

    let content: Vec<AnthropicContentBlock> = msg
        .content
        .iter()
        .map(|block| match block {
            ContentBlock::Text { text } => AnthropicContentBlock::Text { text: text.clone() },
            ContentBlock::ToolUse { id, name, input } => AnthropicContentBlock::ToolUse {
                id: id.clone(),
                name: name.clone(),
                input: input.clone(),
            },
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => AnthropicContentBlock::ToolResult {
                tool_use_id: tool_use_id.clone(),
                content: content.clone(),
                is_error: *is_error,
            },
        })
        .collect();

    AnthropicMessage {
        role: role.to_string(),
        content,
    }
}

fn normalize_response(resp: AnthropicResponse) -> ChatResponse {
    let content: Vec<ContentBlock> = resp
        .content
        .into_iter()
        .map(|block| match block {
            AnthropicContentBlock::Text { text } => ContentBlock::Text { text },
            AnthropicContentBlock::ToolUse { id, name, input } => {
                ContentBlock::ToolUse { id, name, input }
            }
            // Tool results never appear in responses
            AnthropicContentBlock::ToolResult { .. } => ContentBlock::Text {
                text: "[tool result]".to_string(),
            },
        })
        .collect();

    ChatResponse {
        content,
        usage: Usage {
            input_tokens: resp.usage.input_tokens,
            output_tokens: resp.usage.output_tokens,
        },
    }
}

#[async_trait]
impl InferenceService for AnthropicClient {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, InferenceError> {
        let anthropic_request = self.translate_request(request);

        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&anthropic_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    InferenceError::network(format!("Connection failed: {e}"))
                } else {
                    InferenceError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| InferenceError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(self.classify_error(status, &body));
        }

        let anthropic_response: AnthropicResponse = serde_json::from_str(&body)
            .map_err(|e| InferenceError::unknown(format!("Failed to parse response: {e}")))?;

        Ok(normalize_response(anthropic_response))
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// Anthropic API types

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<AnthropicTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<AnthropicToolChoice>,
}

#[derive(Debug, Serialize)]
struct AnthropicToolChoice {
    r#type: String,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: Vec<AnthropicContentBlock>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
}

#[derive(Debug, Serialize)]
struct AnthropicTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u64,
    output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request_with(tool_choice: ToolChoice) -> ChatRequest {
        ChatRequest {
            system: "You are a helpful assistant.".to_string(),
            messages: vec![ChatMessage::user_text("hi")],
            tools: vec![ToolDefinition {
                name: "get_pricing".to_string(),
                description: "Look up pricing".to_string(),
                input_schema: json!({"type": "object", "properties": {}}),
            }],
            tool_choice,
            temperature: Some(0.7),
            max_tokens: None,
        }
    }

    #[test]
    fn test_tool_choice_any_serialized() {
        let client = AnthropicClient::new("test-key", DEFAULT_MODEL);
        let wire = client.translate_request(&request_with(ToolChoice::Any));
        let value = serde_json::to_value(&wire).unwrap();
        assert_eq!(value["tool_choice"]["type"], "any");
    }

    #[test]
    fn test_tool_choice_auto_omitted() {
        let client = AnthropicClient::new("test-key", DEFAULT_MODEL);
        let wire = client.translate_request(&request_with(ToolChoice::Auto));
        let value = serde_json::to_value(&wire).unwrap();
        assert!(value.get("tool_choice").is_none());
    }

    #[test]
    fn test_empty_tools_omitted() {
        let client = AnthropicClient::new("test-key", DEFAULT_MODEL);
        let mut request = request_with(ToolChoice::Auto);
        request.tools.clear();
        let value = serde_json::to_value(client.translate_request(&request)).unwrap();
        assert!(value.get("tools").is_none());
    }

    #[test]
    fn test_normalize_distinguishes_blocks() {
        let resp = AnthropicResponse {
            content: vec![
                AnthropicContentBlock::Text {
                    text: "Checking that now.".to_string(),
                },
                AnthropicContentBlock::ToolUse {
                    id: "toolu_01".to_string(),
                    name: "get_pricing".to_string(),
                    input: json!({"service": "plumbing"}),
                },
            ],
            usage: AnthropicUsage {
                input_tokens: 10,
                output_tokens: 20,
            },
        };

        let normalized = normalize_response(resp);
        assert_eq!(normalized.text(), "Checking that now.");
        let uses = normalized.tool_uses();
        assert_eq!(uses.len(), 1);
        assert_eq!(uses[0].1, "get_pricing");
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = InferenceConfig::default();
        assert!(AnthropicClient::from_config(&config).is_none());

        let config = InferenceConfig {
            api_key: Some(String::new()),
            ..Default::default()
        };
        assert!(AnthropicClient::from_config(&config).is_none());

        let config = InferenceConfig {
            api_key: Some("test-key".to_string()),
            ..Default::default()
        };
        assert!(AnthropicClient::from_config(&config).is_some());
    }

    #[test]
    fn test_error_classification() {
        let client = AnthropicClient::new("test-key", DEFAULT_MODEL);
        let cases = [
            (401, InferenceErrorKind::Auth),
            (403, InferenceErrorKind::Auth),
            (429, InferenceErrorKind::RateLimit),
            (400, InferenceErrorKind::InvalidRequest),
            (500, InferenceErrorKind::ServerError),
            (503, InferenceErrorKind::ServerError),
        ];
        for (status, kind) in cases {
            let err = client.classify_error(
                reqwest::StatusCode::from_u16(status).unwrap(),
                "boom",
            );
            assert_eq!(err.kind, kind, "status {status}");
        }
    }
}
