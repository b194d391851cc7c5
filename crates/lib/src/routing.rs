//! Thread routing: derive the stable conversation key for an inbound
//! message so the checkpoint store groups turns correctly.

use crate::channels::InternalMessage;
use serde_json::{Map, Value};

/// Per-request session context. Today this only carries an optional
/// explicit thread id override.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub thread_id: Option<String>,
}

impl SessionContext {
    /// Build the context from normalized message metadata: an optional
    /// `thread_id` string key.
    pub fn from_metadata(metadata: &Map<String, Value>) -> Self {
        let thread_id = metadata
            .get("thread_id")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Self { thread_id }
    }
}

/// The explicit thread id wins when present and non-empty; otherwise the
/// user id keys the conversation. Pure and total: the same inputs always
/// yield the same key across turns.
pub fn resolve_thread_id(message: &InternalMessage, context: Option<&SessionContext>) -> String {
    if let Some(id) = context.and_then(|c| c.thread_id.as_deref()) {
        let id = id.trim();
        if !id.is_empty() {
            return id.to_string();
        }
    }
    message.user_id.clone()
}
