//! OpenAI chat-completions client and provider. The client is shared with
//! the Groq provider, which speaks the same API at a different base URL.

use crate::llm::chat::{
    ChatBackend, ChatMessage, ChatResponse, ToolCall, ToolCallFunction, ToolDefinition,
};
use crate::llm::{probe, GenerationOptions, LlmError, LlmProvider, ModelHandle};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Client for any OpenAI-compatible chat-completions API.
#[derive(Clone)]
pub struct OpenAiCompatClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OpenAiCompatClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct CompatRequest<'a> {
    model: &'a str,
    messages: Vec<CompatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolDefinition>>,
}

#[derive(Serialize, Deserialize)]
struct CompatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<CompatToolCall>>,
}

#[derive(Serialize, Deserialize)]
struct CompatToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(rename = "type")]
    typ: String,
    function: CompatFunction,
}

#[derive(Serialize, Deserialize)]
struct CompatFunction {
    name: String,
    /// JSON-encoded string on the wire; parsed into a value on the way in.
    #[serde(default)]
    arguments: serde_json::Value,
}

#[derive(Deserialize)]
struct CompatResponse {
    #[serde(default)]
    choices: Vec<CompatChoice>,
}

#[derive(Deserialize)]
struct CompatChoice {
    message: CompatMessage,
}

fn to_compat_message(msg: ChatMessage) -> CompatMessage {
    let tool_calls = msg.tool_calls.map(|calls| {
        calls
            .into_iter()
            .map(|c| CompatToolCall {
                id: None,
                typ: if c.typ.is_empty() {
                    "function".to_string()
                } else {
                    c.typ
                },
                function: CompatFunction {
                    name: c.function.name,
                    arguments: c.function.arguments,
                },
            })
            .collect()
    });
    CompatMessage {
        role: msg.role,
        content: Some(msg.content),
        name: msg.tool_name,
        tool_calls,
    }
}

fn parse_arguments(arguments: serde_json::Value) -> serde_json::Value {
    match arguments {
        serde_json::Value::String(s) => {
            serde_json::from_str(&s).unwrap_or(serde_json::Value::String(s))
        }
        other => other,
    }
}

#[async_trait]
impl ChatBackend for OpenAiCompatClient {
    async fn chat(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        options: &GenerationOptions,
        tools: Option<Vec<ToolDefinition>>,
    ) -> Result<ChatResponse, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = CompatRequest {
            model,
            messages: messages.into_iter().map(to_compat_message).collect(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            tools,
        };
        let mut req = self.client.post(&url).json(&body);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        let res = req.send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("{} {}", status, body)));
        }
        let data: CompatResponse = res.json().await?;
        let message = data.choices.into_iter().next().map(|choice| {
            let tool_calls = choice.message.tool_calls.map(|calls| {
                calls
                    .into_iter()
                    .map(|c| ToolCall {
                        typ: c.typ,
                        function: ToolCallFunction {
                            name: c.function.name,
                            arguments: parse_arguments(c.function.arguments),
                        },
                    })
                    .collect::<Vec<_>>()
            });
            ChatMessage {
                role: choice.message.role,
                content: choice.message.content.unwrap_or_default(),
                tool_calls: tool_calls.filter(|c: &Vec<ToolCall>| !c.is_empty()),
                tool_name: None,
            }
        });
        Ok(ChatResponse {
            message,
            done: true,
        })
    }
}

/// OpenAI backend. A missing API key fails the health check without any
/// network I/O.
pub struct OpenAiProvider {
    api_key: Option<String>,
    model: String,
    priority: u32,
    backend: Arc<OpenAiCompatClient>,
}

impl OpenAiProvider {
    pub fn new(api_key: Option<String>, model: Option<String>, priority: u32) -> Self {
        let backend = Arc::new(OpenAiCompatClient::new(OPENAI_BASE_URL, api_key.clone()));
        Self {
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            priority,
            backend,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    fn get_llm(&self, options: &GenerationOptions) -> ModelHandle {
        ModelHandle::new(
            self.name(),
            &self.model,
            options.clone(),
            self.backend.clone(),
        )
    }

    async fn check_health(&self, timeout: Duration) -> bool {
        if self.api_key.is_none() {
            log::debug!("openai health check skipped: no api key configured");
            return false;
        }
        let handle = self.get_llm(&GenerationOptions::default());
        probe(self.name(), &handle, timeout).await
    }
}
