//! Tools the agent can call during a turn: knowledge-base search and the
//! user profile memory.

use crate::llm::{ToolDefinition, ToolFunctionDefinition};
use crate::memory::MemoryStore;
use crate::services::{QueryMode, RagClient};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

/// Executes a named tool call. Errors are strings fed back to the model
/// as tool output, not failures of the turn.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, name: &str, arguments: &Value) -> Result<String, String>;
}

pub struct AgentTools {
    rag: Arc<RagClient>,
    memory: Arc<MemoryStore>,
}

impl AgentTools {
    pub fn new(rag: Arc<RagClient>, memory: Arc<MemoryStore>) -> Self {
        Self { rag, memory }
    }

    async fn search_knowledge_base(&self, query: &str) -> String {
        match self.rag.query(query, QueryMode::Hybrid).await {
            Ok(answer) => answer,
            Err(e) => {
                log::error!("knowledge base query failed: {e}");
                "Error accessing knowledge base.".to_string()
            }
        }
    }
}

fn str_arg<'a>(arguments: &'a Value, name: &str) -> Result<&'a str, String> {
    arguments
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("missing required argument '{name}'"))
}

#[async_trait]
impl ToolExecutor for AgentTools {
    async fn execute(&self, name: &str, arguments: &Value) -> Result<String, String> {
        match name {
            "search_knowledge_base" => {
                let query = str_arg(arguments, "query")?;
                Ok(self.search_knowledge_base(query).await)
            }
            "read_profile" => {
                let user_id = str_arg(arguments, "user_id")?;
                Ok(self.memory.summarize_user_context(user_id).await)
            }
            "save_preference" => {
                let user_id = str_arg(arguments, "user_id")?;
                let preference = str_arg(arguments, "preference")?;
                match self
                    .memory
                    .add_memory(user_id, preference, "preference", None)
                    .await
                {
                    Ok(_) => Ok("Preference saved successfully.".to_string()),
                    Err(e) => {
                        log::error!("failed to save preference for {user_id}: {e}");
                        Ok("Error saving preference.".to_string())
                    }
                }
            }
            other => Err(format!("unknown tool '{other}'")),
        }
    }
}

/// Tool definitions advertised to the model.
pub fn agent_tool_definitions() -> Vec<ToolDefinition> {
    vec![
        function_def(
            "search_knowledge_base",
            "Search the product knowledge base for information relevant to the customer's question.",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query."
                    }
                },
                "required": ["query"]
            }),
        ),
        function_def(
            "read_profile",
            "Read the stored profile and preferences of a user.",
            json!({
                "type": "object",
                "properties": {
                    "user_id": {
                        "type": "string",
                        "description": "The id of the user whose profile to read."
                    }
                },
                "required": ["user_id"]
            }),
        ),
        function_def(
            "save_preference",
            "Save a user preference for future conversations.",
            json!({
                "type": "object",
                "properties": {
                    "user_id": {
                        "type": "string",
                        "description": "The id of the user."
                    },
                    "preference": {
                        "type": "string",
                        "description": "The preference to remember, stated as a short sentence."
                    }
                },
                "required": ["user_id", "preference"]
            }),
        ),
    ]
}

fn function_def(name: &str, description: &str, parameters: Value) -> ToolDefinition {
    ToolDefinition {
        typ: "function".to_string(),
        function: ToolFunctionDefinition {
            name: name.to_string(),
            description: Some(description.to_string()),
            parameters,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn tools() -> AgentTools {
        AgentTools::new(
            Arc::new(RagClient::new(Some("http://127.0.0.1:9".to_string()))),
            Arc::new(MemoryStore::local()),
        )
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error() {
        let err = tools().execute("frobnicate", &json!({})).await.unwrap_err();
        assert!(err.contains("frobnicate"));
    }

    #[tokio::test]
    async fn missing_argument_is_an_error() {
        let err = tools()
            .execute("read_profile", &json!({}))
            .await
            .unwrap_err();
        assert!(err.contains("user_id"));
    }

    #[tokio::test]
    async fn save_then_read_preference() {
        let t = tools();
        let saved = t
            .execute(
                "save_preference",
                &json!({"user_id": "u1", "preference": "prefers email contact"}),
            )
            .await
            .unwrap();
        assert_eq!(saved, "Preference saved successfully.");

        let profile = t
            .execute("read_profile", &json!({"user_id": "u1"}))
            .await
            .unwrap();
        assert!(profile.contains("prefers email contact"));
    }

    #[test]
    fn three_tools_are_advertised() {
        let defs = agent_tool_definitions();
        let names: Vec<&str> = defs.iter().map(|d| d.function.name.as_str()).collect();
        assert_eq!(
            names,
            ["search_knowledge_base", "read_profile", "save_preference"]
        );
        assert!(defs.iter().all(|d| d.typ == "function"));
    }
}
