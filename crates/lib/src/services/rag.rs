//! HTTP client for the knowledge-base (LightRAG-style) service.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

const DEFAULT_BASE_URL: &str = "http://lightrag:9621";

#[derive(Debug, Error)]
pub enum RagError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("knowledge base error: {0}")]
    Api(String),
}

/// Retrieval strategy for knowledge-base queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    Global,
    Local,
    #[default]
    Hybrid,
    Naive,
}

pub struct RagClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct InsertTextRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    mode: QueryMode,
}

impl RagClient {
    pub fn new(base_url: Option<String>) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// GET /health: true when the service answers with a success status.
    pub async fn check_health(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.client.get(&url).send().await {
            Ok(res) => res.status().is_success(),
            Err(e) => {
                log::warn!("knowledge base unreachable: {e}");
                false
            }
        }
    }

    /// POST /insert/text: ingest a document into the knowledge base.
    pub async fn insert_text(
        &self,
        text: &str,
        description: Option<&str>,
    ) -> Result<Value, RagError> {
        let url = format!("{}/insert/text", self.base_url);
        let res = self
            .client
            .post(&url)
            .json(&InsertTextRequest { text, description })
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(RagError::Api(format!("{} {}", status, body)));
        }
        Ok(res.json().await?)
    }

    /// POST /query: retrieve an answer for `query` using `mode`.
    pub async fn query(&self, query: &str, mode: QueryMode) -> Result<String, RagError> {
        let url = format!("{}/query", self.base_url);
        let res = self
            .client
            .post(&url)
            .json(&QueryRequest { query, mode })
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(RagError::Api(format!("{} {}", status, body)));
        }
        let data: Value = res.json().await?;
        // The service wraps answers in a "response" key; tolerate bare
        // payloads from older versions.
        Ok(match data.get("response").and_then(Value::as_str) {
            Some(s) => s.to_string(),
            None => data.to_string(),
        })
    }
}
