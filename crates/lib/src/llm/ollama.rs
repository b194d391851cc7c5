//! Ollama API client (http://localhost:11434 by default) and provider.

use crate::llm::chat::{ChatBackend, ChatMessage, ChatResponse, ToolDefinition};
use crate::llm::{probe, GenerationOptions, LlmError, LlmProvider, ModelHandle};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "llama3";

/// Client for the Ollama HTTP chat API.
#[derive(Clone)]
pub struct OllamaClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolDefinition>>,
}

impl OllamaClient {
    pub fn new(base_url: Option<String>) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ChatBackend for OllamaClient {
    /// POST /api/chat, non-streaming chat completion.
    async fn chat(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        options: &GenerationOptions,
        tools: Option<Vec<ToolDefinition>>,
    ) -> Result<ChatResponse, LlmError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = ChatRequest {
            model,
            messages,
            stream: false,
            options: OllamaOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens,
            },
            tools,
        };
        let res = self.client.post(&url).json(&body).send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("{} {}", status, body)));
        }
        let data: ChatResponse = res.json().await?;
        Ok(data)
    }
}

/// Local Ollama backend. No credential needed; health is a plain probe.
pub struct OllamaProvider {
    model: String,
    priority: u32,
    backend: Arc<OllamaClient>,
}

impl OllamaProvider {
    pub fn new(base_url: Option<String>, model: Option<String>, priority: u32) -> Self {
        Self {
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            priority,
            backend: Arc::new(OllamaClient::new(base_url)),
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
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
        let handle = self.get_llm(&GenerationOptions::default());
        probe(self.name(), &handle, timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_trimmed() {
        let client = OllamaClient::new(Some("http://host:1234/".to_string()));
        assert_eq!(client.base_url, "http://host:1234");
    }

    #[test]
    fn provider_defaults() {
        let provider = OllamaProvider::new(None, None, 3);
        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.priority(), 3);
        assert_eq!(
            provider.get_llm(&GenerationOptions::default()).model(),
            DEFAULT_MODEL
        );
    }
}
