//! In-memory thread store. Default backend when no checkpoint URI is
//! configured; history does not survive a restart.

use super::{StoreError, StoredMessage, ThreadStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default, Clone)]
pub struct InMemoryThreadStore {
    threads: Arc<RwLock<HashMap<String, Vec<StoredMessage>>>>,
}

impl InMemoryThreadStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ThreadStore for InMemoryThreadStore {
    async fn history(&self, thread_id: &str) -> Result<Vec<StoredMessage>, StoreError> {
        let threads = self.threads.read().await;
        Ok(threads.get(thread_id).cloned().unwrap_or_default())
    }

    async fn append(&self, thread_id: &str, message: StoredMessage) -> Result<(), StoreError> {
        let mut threads = self.threads.write().await;
        threads.entry(thread_id.to_string()).or_default().push(message);
        Ok(())
    }

    async fn clear(&self, thread_id: &str) -> Result<(), StoreError> {
        let mut threads = self.threads.write().await;
        threads.remove(thread_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_thread_is_empty() {
        let store = InMemoryThreadStore::new();
        assert!(store.history("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn append_preserves_order_per_thread() {
        let store = InMemoryThreadStore::new();
        store.append("t1", StoredMessage::user("hi")).await.unwrap();
        store
            .append("t1", StoredMessage::assistant("hello", None))
            .await
            .unwrap();
        store.append("t2", StoredMessage::user("other")).await.unwrap();

        let history = store.history("t1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, "user");
        assert_eq!(history[0].content, "hi");
        assert_eq!(history[1].role, "assistant");
        assert_eq!(store.history("t2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn clear_removes_only_that_thread() {
        let store = InMemoryThreadStore::new();
        store.append("t1", StoredMessage::user("a")).await.unwrap();
        store.append("t2", StoredMessage::user("b")).await.unwrap();
        store.clear("t1").await.unwrap();
        assert!(store.history("t1").await.unwrap().is_empty());
        assert_eq!(store.history("t2").await.unwrap().len(), 1);
    }
}
