//! Groq backend: OpenAI-compatible API at Groq's base URL.

use crate::llm::openai::OpenAiCompatClient;
use crate::llm::{probe, GenerationOptions, LlmProvider, ModelHandle};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_MODEL: &str = "llama3-70b-8192";

pub struct GroqProvider {
    api_key: Option<String>,
    model: String,
    priority: u32,
    backend: Arc<OpenAiCompatClient>,
}

impl GroqProvider {
    pub fn new(api_key: Option<String>, model: Option<String>, priority: u32) -> Self {
        let backend = Arc::new(OpenAiCompatClient::new(GROQ_BASE_URL, api_key.clone()));
        Self {
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            priority,
            backend,
        }
    }
}

#[async_trait]
impl LlmProvider for GroqProvider {
    fn name(&self) -> &str {
        "groq"
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
            log::debug!("groq health check skipped: no api key configured");
            return false;
        }
        let handle = self.get_llm(&GenerationOptions::default());
        probe(self.name(), &handle, timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_name_and_priority() {
        let provider = GroqProvider::new(None, None, 2);
        assert_eq!(provider.name(), "groq");
        assert_eq!(provider.priority(), 2);
    }

    #[tokio::test]
    async fn missing_api_key_is_unhealthy_without_io() {
        let provider = GroqProvider::new(None, None, 2);
        assert!(!provider.check_health(Duration::from_secs(2)).await);
    }
}
