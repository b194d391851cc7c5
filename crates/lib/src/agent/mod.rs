//! Agent layer: the tool-calling runtime and the never-fail wrapper the
//! gateway calls.

mod runtime;
mod tools;

pub use runtime::{AgentRuntime, LlmAgent, DEFAULT_SYSTEM_PROMPT};
pub use tools::{agent_tool_definitions, AgentTools, ToolExecutor};

use crate::channels::{InternalMessage, InternalResponse};
use crate::llm::{LlmError, ModelHandle};
use crate::routing::{resolve_thread_id, SessionContext};
use crate::store::StoreError;
use serde_json::json;
use thiserror::Error;

/// User-facing text when a turn fails internally.
pub const APOLOGY_TEXT: &str =
    "I apologize, but I encountered an internal error. Please try again later.";

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Run one agent turn. Never fails: runtime errors are logged and turned
/// into an apology response with the error recorded in metadata, so every
/// channel gets a well-formed reply.
pub async fn run_agent(
    runtime: &dyn AgentRuntime,
    llm: ModelHandle,
    message: &InternalMessage,
    context: Option<&SessionContext>,
) -> InternalResponse {
    let thread_id = resolve_thread_id(message, context);
    match runtime.invoke(llm, &message.text, &thread_id).await {
        Ok(text) => {
            let mut response = InternalResponse::new(text);
            response
                .metadata
                .insert("agent_name".to_string(), json!(runtime.name()));
            response
                .metadata
                .insert("thread_id".to_string(), json!(thread_id));
            response
        }
        Err(e) => {
            log::error!("agent turn failed for thread {thread_id}: {e}");
            let mut response = InternalResponse::new(APOLOGY_TEXT);
            response
                .metadata
                .insert("error".to_string(), json!(e.to_string()));
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::ChannelType;
    use async_trait::async_trait;
    use crate::llm::{ChatBackend, ChatMessage, ChatResponse, GenerationOptions, ToolDefinition};
    use serde_json::Map;
    use std::sync::Arc;

    struct NullBackend;

    #[async_trait]
    impl ChatBackend for NullBackend {
        async fn chat(
            &self,
            _model: &str,
            _messages: Vec<ChatMessage>,
            _options: &GenerationOptions,
            _tools: Option<Vec<ToolDefinition>>,
        ) -> Result<ChatResponse, LlmError> {
            Ok(ChatResponse::default())
        }
    }

    struct FixedRuntime {
        result: Result<String, String>,
    }

    #[async_trait]
    impl AgentRuntime for FixedRuntime {
        fn name(&self) -> &str {
            "FixedAgent"
        }

        async fn invoke(
            &self,
            _llm: ModelHandle,
            _message: &str,
            _thread_id: &str,
        ) -> Result<String, AgentError> {
            match &self.result {
                Ok(text) => Ok(text.clone()),
                Err(msg) => Err(AgentError::Llm(LlmError::Api(msg.clone()))),
            }
        }
    }

    fn handle() -> ModelHandle {
        ModelHandle::new(
            "mock",
            "mock-model",
            GenerationOptions::default(),
            Arc::new(NullBackend),
        )
    }

    fn message(user_id: &str) -> InternalMessage {
        InternalMessage {
            user_id: user_id.to_string(),
            channel: ChannelType::Web,
            text: "hi".to_string(),
            metadata: Map::new(),
        }
    }

    #[tokio::test]
    async fn success_carries_agent_name_and_thread_id() {
        let runtime = FixedRuntime {
            result: Ok("hello".to_string()),
        };
        let response = run_agent(&runtime, handle(), &message("u1"), None).await;
        assert_eq!(response.text, "hello");
        assert_eq!(response.metadata["agent_name"], "FixedAgent");
        assert_eq!(response.metadata["thread_id"], "u1");
    }

    #[tokio::test]
    async fn failure_becomes_apology_with_error_metadata() {
        let runtime = FixedRuntime {
            result: Err("backend down".to_string()),
        };
        let response = run_agent(&runtime, handle(), &message("u1"), None).await;
        assert_eq!(response.text, APOLOGY_TEXT);
        assert!(response.metadata["error"]
            .as_str()
            .unwrap()
            .contains("backend down"));
    }

    #[tokio::test]
    async fn explicit_thread_id_flows_into_metadata() {
        let runtime = FixedRuntime {
            result: Ok("ok".to_string()),
        };
        let ctx = SessionContext {
            thread_id: Some("t-9".to_string()),
        };
        let response = run_agent(&runtime, handle(), &message("u1"), Some(&ctx)).await;
        assert_eq!(response.metadata["thread_id"], "t-9");
    }
}
