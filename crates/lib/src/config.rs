//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.porter/config.json`);
//! credentials and connection strings can be overridden from the
//! environment so secrets stay out of the file.

use crate::llm::SelectionMode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Deployment environment name, reported by /health.
    #[serde(default = "default_environment")]
    pub environment: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub services: ServicesConfig,

    #[serde(default)]
    pub agent: AgentConfig,
}

/// HTTP bind settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default = "default_server_bind")]
    pub bind: String,

    #[serde(default = "default_server_port")]
    pub port: u16,
}

/// Provider selection and per-backend credentials/models.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfig {
    /// "static" pins to `staticProvider`; "auto" runs health-based
    /// failover in priority order.
    #[serde(default)]
    pub mode: SelectionMode,

    /// Provider name used only in static mode.
    #[serde(default = "default_static_provider")]
    pub static_provider: String,

    /// Health-probe timeout in seconds.
    #[serde(default = "default_health_timeout_secs")]
    pub health_timeout_secs: f64,

    #[serde(default)]
    pub openai: OpenAiConfig,

    #[serde(default)]
    pub groq: GroqConfig,

    #[serde(default)]
    pub ollama: OllamaConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAiConfig {
    /// Overridden by OPENAI_API_KEY env when set.
    pub api_key: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroqConfig {
    /// Overridden by GROQ_API_KEY env when set.
    pub api_key: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OllamaConfig {
    /// Overridden by OLLAMA_BASE_URL env when set.
    pub base_url: Option<String>,
    pub model: Option<String>,
}

/// External collaborators: knowledge base, profile memory, checkpointing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicesConfig {
    /// Knowledge-base service base URL.
    #[serde(default = "default_rag_url")]
    pub rag_url: String,

    /// Profile/memory service base URL. When unset (or unreachable) the
    /// local in-memory backend is used (explicit, logged fallback).
    pub memory_url: Option<String>,
    pub memory_api_key: Option<String>,

    /// Postgres URI for the thread store. Overridden by
    /// PORTER_CHECKPOINT_URI env when set; unset means in-memory.
    pub checkpoint_uri: Option<String>,
}

/// Agent identity and prompt override.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// When set, replaces the built-in customer-service system prompt.
    pub system_prompt: Option<String>,
}

fn default_environment() -> String {
    "dev".to_string()
}

fn default_server_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_static_provider() -> String {
    "openai".to_string()
}

fn default_health_timeout_secs() -> f64 {
    2.0
}

fn default_rag_url() -> String {
    "http://lightrag:9621".to_string()
}

fn default_agent_name() -> String {
    "CustomerServiceAgent".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            server: ServerConfig::default(),
            llm: LlmConfig::default(),
            services: ServicesConfig::default(),
            agent: AgentConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_server_bind(),
            port: default_server_port(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            mode: SelectionMode::default(),
            static_provider: default_static_provider(),
            health_timeout_secs: default_health_timeout_secs(),
            openai: OpenAiConfig::default(),
            groq: GroqConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            rag_url: default_rag_url(),
            memory_url: None,
            memory_api_key: None,
            checkpoint_uri: None,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            system_prompt: None,
        }
    }
}

/// Trimmed, non-empty string or None. Empty env values count as unset.
pub fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn env_or(var: &str, fallback: Option<&str>) -> Option<String> {
    std::env::var(var)
        .ok()
        .as_deref()
        .and_then(|s| non_empty(Some(s)))
        .or_else(|| non_empty(fallback))
}

/// Resolve the OpenAI API key: env OPENAI_API_KEY overrides config.
pub fn resolve_openai_api_key(config: &Config) -> Option<String> {
    env_or("OPENAI_API_KEY", config.llm.openai.api_key.as_deref())
}

/// Resolve the Groq API key: env GROQ_API_KEY overrides config.
pub fn resolve_groq_api_key(config: &Config) -> Option<String> {
    env_or("GROQ_API_KEY", config.llm.groq.api_key.as_deref())
}

/// Resolve the Ollama base URL: env OLLAMA_BASE_URL overrides config.
pub fn resolve_ollama_base_url(config: &Config) -> Option<String> {
    env_or("OLLAMA_BASE_URL", config.llm.ollama.base_url.as_deref())
}

/// Resolve the checkpoint-store URI: env PORTER_CHECKPOINT_URI overrides
/// config. None means the in-memory thread store.
pub fn resolve_checkpoint_uri(config: &Config) -> Option<String> {
    env_or(
        "PORTER_CHECKPOINT_URI",
        config.services.checkpoint_uri.as_deref(),
    )
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("PORTER_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".porter").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the default path (or PORTER_CONFIG_PATH). Missing
/// file => default config. Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(c.environment, "dev");
        assert_eq!(c.server.bind, "127.0.0.1");
        assert_eq!(c.server.port, 8080);
        assert_eq!(c.llm.mode, SelectionMode::Auto);
        assert_eq!(c.llm.static_provider, "openai");
        assert_eq!(c.llm.health_timeout_secs, 2.0);
        assert_eq!(c.services.rag_url, "http://lightrag:9621");
        assert_eq!(c.agent.name, "CustomerServiceAgent");
    }

    #[test]
    fn mode_parses_lowercase() {
        let c: Config = serde_json::from_str(r#"{ "llm": { "mode": "static" } }"#).unwrap();
        assert_eq!(c.llm.mode, SelectionMode::Static);
    }

    #[test]
    fn non_empty_filters_blank() {
        assert_eq!(non_empty(Some("  key  ")), Some("key".to_string()));
        assert_eq!(non_empty(Some("   ")), None);
        assert_eq!(non_empty(None), None);
    }
}
