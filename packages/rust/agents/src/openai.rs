//! OpenAI-compatible `/chat/completions` backend with function tools.

use std::time::Duration;

use async_trait::async_trait;
use edd_shared::{AgentsConfig, ApiKey, error_chain};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AgentError;
use crate::model::ChatModel;
use crate::types::{ChatMessage, ChatRequest, ChatResponse, MessageRole, ToolCall, ToolDefinition};

/// Chat model served over an OpenAI-compatible HTTP API.
#[derive(Debug, Clone)]
pub struct OpenAiChatModel {
    http: Client,
    endpoint: String,
    model: String,
    api_key: ApiKey,
}

impl OpenAiChatModel {
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        api_key: ApiKey,
        timeout: Duration,
    ) -> Result<Self, AgentError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AgentError::Client(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.into(),
            api_key,
        })
    }

    /// Build from config; the key comes from the request's effective credentials.
    pub fn from_config(config: &AgentsConfig, api_key: Option<ApiKey>) -> Result<Self, AgentError> {
        let api_key = api_key.ok_or(AgentError::MissingApiKey)?;
        Self::new(
            &config.base_url,
            &config.model,
            api_key,
            Duration::from_secs(config.request_timeout_secs),
        )
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, AgentError> {
        let body = WireRequest::from_request(&self.model, &request);

        debug!(
            model = %self.model,
            messages = body.messages.len(),
            tools = body.tools.len(),
            "sending chat request"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Transport(error_chain(&e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| {
                AgentError::Transport(format!("failed to read body: {}", error_chain(&e)))
            })?;

        if !status.is_success() {
            return Err(AgentError::Upstream {
                status: status.as_u16(),
                message: text.chars().take(500).collect(),
            });
        }

        let wire: WireResponse =
            serde_json::from_str(&text).map_err(|e| AgentError::InvalidResponse(e.to_string()))?;
        wire.into_response()
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
}

impl<'a> WireRequest<'a> {
    fn from_request(model: &'a str, request: &'a ChatRequest) -> Self {
        Self {
            model,
            messages: request.messages.iter().map(WireMessage::from).collect(),
            tools: request
                .tools
                .iter()
                .map(|function| WireTool {
                    kind: "function",
                    function,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: MessageRole,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl From<&ChatMessage> for WireMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role,
            content: Some(message.content.clone()),
            tool_calls: message
                .tool_calls
                .iter()
                .map(|call| WireToolCall {
                    id: call.call_id.clone(),
                    kind: "function".into(),
                    function: WireFunctionCall {
                        name: call.name.clone(),
                        arguments: call.arguments.to_string(),
                    },
                })
                .collect(),
            tool_call_id: message.tool_call_id.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: &'a ToolDefinition,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireFunctionCall,
}

fn function_kind() -> String {
    "function".into()
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    /// JSON-encoded arguments, as the API sends them.
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    #[serde(default)]
    total_tokens: Option<u64>,
}

impl WireResponse {
    fn into_response(self) -> Result<ChatResponse, AgentError> {
        let message = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::InvalidResponse("response has no choices".into()))?
            .message;

        let tool_calls = message
            .tool_calls
            .into_iter()
            .map(|call| ToolCall {
                call_id: call.id,
                arguments: serde_json::from_str(&call.function.arguments)
                    .unwrap_or(serde_json::Value::String(call.function.arguments)),
                name: call.function.name,
            })
            .collect();

        Ok(ChatResponse {
            content: message.content.unwrap_or_default(),
            tool_calls,
            total_tokens: self.usage.and_then(|u| u.total_tokens),
        })
    }
}
