//! Conversation checkpointing: per-thread message history behind a
//! storage trait with in-memory and Postgres backends.

mod memory;
mod postgres;

pub use memory::InMemoryThreadStore;
pub use postgres::PostgresThreadStore;

use crate::llm::ToolCall;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// One persisted turn of a conversation thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl StoredMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
            tool_calls: None,
            tool_name: None,
        }
    }

    pub fn assistant(content: impl Into<String>, tool_calls: Option<Vec<ToolCall>>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
            tool_calls,
            tool_name: None,
        }
    }

    pub fn tool(content: impl Into<String>, tool_name: impl Into<String>) -> Self {
        Self {
            role: "tool".to_string(),
            content: content.into(),
            tool_calls: None,
            tool_name: Some(tool_name.into()),
        }
    }
}

/// Thread-keyed message history. Implementations must return history in
/// append order and treat unknown threads as empty.
#[async_trait]
pub trait ThreadStore: Send + Sync {
    async fn history(&self, thread_id: &str) -> Result<Vec<StoredMessage>, StoreError>;

    async fn append(&self, thread_id: &str, message: StoredMessage) -> Result<(), StoreError>;

    async fn clear(&self, thread_id: &str) -> Result<(), StoreError>;
}
