//! LLM backends: per-provider clients behind a flat provider trait, and
//! the priority-ordered manager with health-based failover.

mod chat;
mod groq;
mod manager;
mod ollama;
mod openai;

pub use chat::{
    ChatBackend, ChatMessage, ChatResponse, ToolCall, ToolCallFunction, ToolDefinition,
    ToolFunctionDefinition,
};
pub use groq::GroqProvider;
pub use manager::{ProviderManager, SelectionMode};
pub use ollama::{OllamaClient, OllamaProvider};
pub use openai::{OpenAiCompatClient, OpenAiProvider};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Default liveness-probe timeout.
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

/// Generation options forwarded to the backend with each request.
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Static mode named a provider that is not configured. Fatal for the
    /// request; never retried.
    #[error("static provider '{0}' not found")]
    StaticProviderNotFound(String),
    /// Every provider failed its health check in auto mode.
    #[error("no healthy llm providers available")]
    NoHealthyProvider,
    #[error("llm request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("llm api error: {0}")]
    Api(String),
}

/// A ready-to-call model: provider and model names plus a shared backend
/// client and the generation options the caller asked for.
#[derive(Clone)]
pub struct ModelHandle {
    provider: String,
    model: String,
    options: GenerationOptions,
    backend: Arc<dyn ChatBackend>,
}

impl ModelHandle {
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        options: GenerationOptions,
        backend: Arc<dyn ChatBackend>,
    ) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            options,
            backend,
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One chat completion round-trip.
    pub async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        tools: Option<Vec<ToolDefinition>>,
    ) -> Result<ChatResponse, LlmError> {
        self.backend
            .chat(&self.model, messages, &self.options, tools)
            .await
    }
}

/// An interchangeable model backend. One implementing type per provider;
/// no inheritance, just this flat capability surface.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Unique provider name (e.g. "openai").
    fn name(&self) -> &str;
    /// Selection preference; lower is preferred.
    fn priority(&self) -> u32;
    /// Build a model handle with the given generation options.
    fn get_llm(&self, options: &GenerationOptions) -> ModelHandle;
    /// Liveness probe within `timeout`. Must never propagate errors:
    /// timeouts, auth failures, and missing credentials all degrade to
    /// false.
    async fn check_health(&self, timeout: Duration) -> bool;
}

/// Shared probe body: a minimal "ping" round-trip under a timeout.
pub(crate) async fn probe(name: &str, handle: &ModelHandle, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, handle.chat(vec![ChatMessage::user("ping")], None)).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            log::warn!("{} health check failed: {}", name, e);
            false
        }
        Err(_) => {
            log::warn!("{} health check timed out after {:?}", name, timeout);
            false
        }
    }
}
