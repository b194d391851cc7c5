//! The tool-calling agent runtime: history-aware chat with a bounded
//! tool loop, persisted through the thread store.

use super::tools::ToolExecutor;
use super::AgentError;
use crate::llm::{ChatMessage, ModelHandle, ToolDefinition};
use crate::store::{StoredMessage, ThreadStore};
use async_trait::async_trait;
use std::sync::Arc;

/// Upper bound on model/tool round-trips within one turn.
const MAX_TOOL_LOOP: usize = 5;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful customer service agent. \
Answer the customer's questions accurately and concisely. \
Use the search_knowledge_base tool to look up product information before answering \
questions about products, policies, or procedures. \
Use the read_profile tool to personalize your answers when it helps, and the \
save_preference tool when the customer states a preference worth remembering. \
If you do not know the answer, say so rather than guessing.";

/// A conversational runtime the gateway can hand a message to.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    fn name(&self) -> &str;

    /// Run one turn for `thread_id` and return the assistant's reply.
    async fn invoke(
        &self,
        llm: ModelHandle,
        message: &str,
        thread_id: &str,
    ) -> Result<String, AgentError>;
}

/// Default runtime: system prompt + stored history + tool loop.
pub struct LlmAgent {
    name: String,
    system_prompt: String,
    store: Arc<dyn ThreadStore>,
    tools: Option<Arc<dyn ToolExecutor>>,
    tool_definitions: Vec<ToolDefinition>,
}

impl LlmAgent {
    pub fn new(
        name: impl Into<String>,
        system_prompt: Option<String>,
        store: Arc<dyn ThreadStore>,
        tools: Option<Arc<dyn ToolExecutor>>,
        tool_definitions: Vec<ToolDefinition>,
    ) -> Self {
        Self {
            name: name.into(),
            system_prompt: system_prompt.unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            store,
            tools,
            tool_definitions,
        }
    }

    fn system_message(&self) -> ChatMessage {
        let today = chrono::Local::now().format("%Y-%m-%d");
        ChatMessage::system(format!("Today's date: {}.\n\n{}", today, self.system_prompt))
    }

    fn tool_definitions(&self) -> Option<Vec<ToolDefinition>> {
        if self.tools.is_some() && !self.tool_definitions.is_empty() {
            Some(self.tool_definitions.clone())
        } else {
            None
        }
    }
}

fn to_chat_message(stored: &StoredMessage) -> ChatMessage {
    ChatMessage {
        role: stored.role.clone(),
        content: stored.content.clone(),
        tool_calls: stored.tool_calls.clone(),
        tool_name: stored.tool_name.clone(),
    }
}

#[async_trait]
impl AgentRuntime for LlmAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(
        &self,
        llm: ModelHandle,
        message: &str,
        thread_id: &str,
    ) -> Result<String, AgentError> {
        self.store
            .append(thread_id, StoredMessage::user(message))
            .await?;

        let history = self.store.history(thread_id).await?;
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(self.system_message());
        messages.extend(history.iter().map(to_chat_message));

        for _ in 0..MAX_TOOL_LOOP {
            let response = llm.chat(messages.clone(), self.tool_definitions()).await?;
            let content = response.content().to_string();
            let tool_calls = response.tool_calls().to_vec();

            self.store
                .append(
                    thread_id,
                    StoredMessage::assistant(
                        content.clone(),
                        (!tool_calls.is_empty()).then(|| tool_calls.clone()),
                    ),
                )
                .await?;
            messages.push(ChatMessage {
                role: "assistant".to_string(),
                content: content.clone(),
                tool_calls: (!tool_calls.is_empty()).then(|| tool_calls.clone()),
                tool_name: None,
            });

            if tool_calls.is_empty() {
                if content.is_empty() {
                    return Ok("No response generated.".to_string());
                }
                return Ok(content);
            }

            let Some(executor) = &self.tools else {
                // The model asked for a tool we cannot run; stop the loop
                // with whatever content we have.
                return Ok(if content.is_empty() {
                    "No response generated.".to_string()
                } else {
                    content
                });
            };

            for call in &tool_calls {
                let name = call.function.name.as_str();
                log::debug!("executing tool {name}");
                let output = match executor.execute(name, &call.function.arguments).await {
                    Ok(out) => out,
                    Err(e) => {
                        log::warn!("tool {name} failed: {e}");
                        format!("Tool error: {e}")
                    }
                };
                self.store
                    .append(thread_id, StoredMessage::tool(output.clone(), name))
                    .await?;
                messages.push(ChatMessage::tool(name, output));
            }
        }

        log::warn!("tool loop limit reached for thread {thread_id}");
        Ok("No response generated.".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{
        ChatBackend, ChatResponse, GenerationOptions, LlmError, ToolCall, ToolCallFunction,
    };
    use crate::store::InMemoryThreadStore;
    use serde_json::json;
    use std::sync::Mutex;

    /// Backend that emits a scripted sequence of responses.
    struct ScriptedBackend {
        script: Mutex<Vec<ChatResponse>>,
    }

    impl ScriptedBackend {
        fn new(script: Vec<ChatResponse>) -> Self {
            Self {
                script: Mutex::new(script),
            }
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn chat(
            &self,
            _model: &str,
            _messages: Vec<ChatMessage>,
            _options: &GenerationOptions,
            _tools: Option<Vec<ToolDefinition>>,
        ) -> Result<ChatResponse, LlmError> {
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                return Err(LlmError::Api("script exhausted".to_string()));
            }
            Ok(script.remove(0))
        }
    }

    struct EchoTool;

    #[async_trait]
    impl ToolExecutor for EchoTool {
        async fn execute(&self, name: &str, arguments: &serde_json::Value) -> Result<String, String> {
            Ok(format!("{name}: {arguments}"))
        }
    }

    fn handle(script: Vec<ChatResponse>) -> ModelHandle {
        ModelHandle::new(
            "mock",
            "mock-model",
            GenerationOptions::default(),
            Arc::new(ScriptedBackend::new(script)),
        )
    }

    fn plain_response(text: &str) -> ChatResponse {
        ChatResponse {
            message: Some(ChatMessage::assistant(text)),
            done: true,
        }
    }

    fn tool_call_response(name: &str, arguments: serde_json::Value) -> ChatResponse {
        ChatResponse {
            message: Some(ChatMessage {
                role: "assistant".to_string(),
                content: String::new(),
                tool_calls: Some(vec![ToolCall {
                    typ: "function".to_string(),
                    function: ToolCallFunction {
                        name: name.to_string(),
                        arguments,
                    },
                }]),
                tool_name: None,
            }),
            done: true,
        }
    }

    fn agent(store: Arc<dyn ThreadStore>, tools: Option<Arc<dyn ToolExecutor>>) -> LlmAgent {
        LlmAgent::new(
            "TestAgent",
            None,
            store,
            tools,
            crate::agent::agent_tool_definitions(),
        )
    }

    #[tokio::test]
    async fn plain_turn_persists_user_and_assistant() {
        let store = Arc::new(InMemoryThreadStore::new());
        let a = agent(store.clone(), None);
        let reply = a
            .invoke(handle(vec![plain_response("hello!")]), "hi", "t1")
            .await
            .unwrap();
        assert_eq!(reply, "hello!");

        let history = store.history("t1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, "user");
        assert_eq!(history[1].role, "assistant");
        assert_eq!(history[1].content, "hello!");
    }

    #[tokio::test]
    async fn tool_call_round_trip() {
        let store = Arc::new(InMemoryThreadStore::new());
        let a = agent(store.clone(), Some(Arc::new(EchoTool)));
        let reply = a
            .invoke(
                handle(vec![
                    tool_call_response("search_knowledge_base", json!({"query": "returns"})),
                    plain_response("Our return window is 30 days."),
                ]),
                "what is the return policy?",
                "t1",
            )
            .await
            .unwrap();
        assert_eq!(reply, "Our return window is 30 days.");

        let history = store.history("t1").await.unwrap();
        let roles: Vec<&str> = history.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, ["user", "assistant", "tool", "assistant"]);
        assert_eq!(history[2].tool_name.as_deref(), Some("search_knowledge_base"));
    }

    #[tokio::test]
    async fn tool_loop_is_bounded() {
        let store = Arc::new(InMemoryThreadStore::new());
        let a = agent(store, Some(Arc::new(EchoTool)));
        // More tool calls than the loop allows; never a final answer.
        let script = (0..10)
            .map(|_| tool_call_response("read_profile", json!({"user_id": "u1"})))
            .collect();
        let reply = a.invoke(handle(script), "hi", "t1").await.unwrap();
        assert_eq!(reply, "No response generated.");
    }

    #[tokio::test]
    async fn empty_content_without_tool_calls() {
        let store = Arc::new(InMemoryThreadStore::new());
        let a = agent(store, None);
        let reply = a
            .invoke(handle(vec![plain_response("")]), "hi", "t1")
            .await
            .unwrap();
        assert_eq!(reply, "No response generated.");
    }

    #[tokio::test]
    async fn backend_error_propagates() {
        let store = Arc::new(InMemoryThreadStore::new());
        let a = agent(store, None);
        let err = a.invoke(handle(vec![]), "hi", "t1").await.unwrap_err();
        assert!(matches!(err, AgentError::Llm(_)));
    }
}
