//! Long-lived user profile memory.
//!
//! `MemoryStore` fronts two backends: a remote memory service over HTTP
//! and a local in-process map. When the remote service is configured but
//! unreachable at startup the store falls back to the local backend and
//! says so in the log, so degraded personalization is visible rather than
//! silent.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("memory service error: {0}")]
    Api(String),
}

/// One remembered fact about a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryItem {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "memory")]
    pub content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[async_trait]
pub trait MemoryBackend: Send + Sync {
    async fn get_all(&self, user_id: &str) -> Result<Vec<MemoryItem>, MemoryError>;

    async fn add(
        &self,
        user_id: &str,
        content: &str,
        metadata: Map<String, Value>,
    ) -> Result<MemoryItem, MemoryError>;

    async fn delete(&self, memory_id: &str) -> Result<(), MemoryError>;

    async fn delete_all(&self, user_id: &str) -> Result<(), MemoryError>;
}

/// HTTP client for the remote memory service.
pub struct RemoteMemory {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl RemoteMemory {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        req
    }

    pub async fn check_health(&self) -> bool {
        match self.request(reqwest::Method::GET, "/health").send().await {
            Ok(res) => res.status().is_success(),
            Err(e) => {
                log::warn!("memory service unreachable: {e}");
                false
            }
        }
    }

    async fn expect_success(res: reqwest::Response) -> Result<reqwest::Response, MemoryError> {
        if res.status().is_success() {
            return Ok(res);
        }
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        Err(MemoryError::Api(format!("{} {}", status, body)))
    }
}

#[async_trait]
impl MemoryBackend for RemoteMemory {
    async fn get_all(&self, user_id: &str) -> Result<Vec<MemoryItem>, MemoryError> {
        let res = self
            .request(reqwest::Method::GET, "/v1/memories")
            .query(&[("user_id", user_id)])
            .send()
            .await?;
        let res = Self::expect_success(res).await?;
        Ok(res.json().await?)
    }

    async fn add(
        &self,
        user_id: &str,
        content: &str,
        metadata: Map<String, Value>,
    ) -> Result<MemoryItem, MemoryError> {
        let res = self
            .request(reqwest::Method::POST, "/v1/memories")
            .json(&json!({
                "user_id": user_id,
                "memory": content,
                "metadata": metadata,
            }))
            .send()
            .await?;
        let res = Self::expect_success(res).await?;
        Ok(res.json().await?)
    }

    async fn delete(&self, memory_id: &str) -> Result<(), MemoryError> {
        let res = self
            .request(reqwest::Method::DELETE, &format!("/v1/memories/{memory_id}"))
            .send()
            .await?;
        Self::expect_success(res).await?;
        Ok(())
    }

    async fn delete_all(&self, user_id: &str) -> Result<(), MemoryError> {
        let res = self
            .request(reqwest::Method::DELETE, "/v1/memories")
            .query(&[("user_id", user_id)])
            .send()
            .await?;
        Self::expect_success(res).await?;
        Ok(())
    }
}

/// In-process backend used when no remote service is available.
#[derive(Default)]
pub struct LocalMemory {
    items: RwLock<HashMap<String, Vec<MemoryItem>>>,
}

#[async_trait]
impl MemoryBackend for LocalMemory {
    async fn get_all(&self, user_id: &str) -> Result<Vec<MemoryItem>, MemoryError> {
        let items = self.items.read().await;
        Ok(items.get(user_id).cloned().unwrap_or_default())
    }

    async fn add(
        &self,
        user_id: &str,
        content: &str,
        metadata: Map<String, Value>,
    ) -> Result<MemoryItem, MemoryError> {
        let item = MemoryItem {
            id: format!("mem-{}", Uuid::new_v4()),
            user_id: user_id.to_string(),
            content: content.to_string(),
            metadata,
        };
        let mut items = self.items.write().await;
        items.entry(user_id.to_string()).or_default().push(item.clone());
        Ok(item)
    }

    async fn delete(&self, memory_id: &str) -> Result<(), MemoryError> {
        let mut items = self.items.write().await;
        for list in items.values_mut() {
            list.retain(|m| m.id != memory_id);
        }
        Ok(())
    }

    async fn delete_all(&self, user_id: &str) -> Result<(), MemoryError> {
        let mut items = self.items.write().await;
        items.remove(user_id);
        Ok(())
    }
}

/// Profile memory facade used by the agent tools.
pub struct MemoryStore {
    backend: Arc<dyn MemoryBackend>,
}

impl MemoryStore {
    pub fn local() -> Self {
        Self {
            backend: Arc::new(LocalMemory::default()),
        }
    }

    /// Pick the backend from config: remote when a URL is set and the
    /// service answers its health check, local otherwise. The fallback is
    /// logged at warn so operators can see personalization is degraded.
    pub async fn from_config(memory_url: Option<&str>, api_key: Option<String>) -> Self {
        let Some(url) = memory_url else {
            log::info!("no memory service configured, using local profile memory");
            return Self::local();
        };
        let remote = RemoteMemory::new(url, api_key);
        if remote.check_health().await {
            log::info!("using remote memory service at {url}");
            Self {
                backend: Arc::new(remote),
            }
        } else {
            log::warn!("memory service at {url} failed health check, falling back to local profile memory");
            Self::local()
        }
    }

    /// Remember one fact, tagged with a `type` so reads can filter.
    pub async fn add_memory(
        &self,
        user_id: &str,
        content: &str,
        kind: &str,
        tags: Option<Vec<String>>,
    ) -> Result<MemoryItem, MemoryError> {
        let mut metadata = Map::new();
        metadata.insert("type".to_string(), json!(kind));
        if let Some(tags) = tags {
            metadata.insert("tags".to_string(), json!(tags));
        }
        self.backend.add(user_id, content, metadata).await
    }

    /// All memories for a user, optionally filtered by `type`. Backend
    /// failures degrade to an empty profile rather than failing the turn.
    pub async fn get_memory(&self, user_id: &str, types: Option<&[&str]>) -> Vec<MemoryItem> {
        let items = match self.backend.get_all(user_id).await {
            Ok(items) => items,
            Err(e) => {
                log::error!("failed to read profile memory for {user_id}: {e}");
                return Vec::new();
            }
        };
        match types {
            None => items,
            Some(types) => items
                .into_iter()
                .filter(|m| {
                    m.metadata
                        .get("type")
                        .and_then(Value::as_str)
                        .map(|t| types.contains(&t))
                        .unwrap_or(false)
                })
                .collect(),
        }
    }

    /// Forget memories for a user: everything, or only the given types.
    pub async fn clear_memory(
        &self,
        user_id: &str,
        types: Option<&[&str]>,
    ) -> Result<(), MemoryError> {
        match types {
            None => self.backend.delete_all(user_id).await,
            Some(_) => {
                for item in self.get_memory(user_id, types).await {
                    self.backend.delete(&item.id).await?;
                }
                Ok(())
            }
        }
    }

    /// Human-readable profile summary for prompt injection.
    pub async fn summarize_user_context(&self, user_id: &str) -> String {
        let items = self.get_memory(user_id, None).await;
        if items.is_empty() {
            return "User has no previous history/context.".to_string();
        }
        let mut out = String::from("User Context:");
        for item in items {
            let kind = item
                .metadata
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("general");
            out.push_str(&format!("\n- {} (Type: {})", item.content, kind));
        }
        out
    }
}
