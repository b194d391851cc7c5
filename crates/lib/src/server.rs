//! HTTP gateway: health, per-channel chat ingress, and admin routes for
//! the knowledge base.

use crate::agent::{
    agent_tool_definitions, run_agent, AgentRuntime, AgentTools, LlmAgent,
};
use crate::channels::{adapter_for, ChannelError, ChannelType};
use crate::config::{
    resolve_checkpoint_uri, resolve_groq_api_key, resolve_ollama_base_url, resolve_openai_api_key,
    Config,
};
use crate::llm::{
    GenerationOptions, GroqProvider, LlmError, LlmProvider, OllamaProvider, OpenAiProvider,
    ProviderManager,
};
use crate::memory::MemoryStore;
use crate::routing::SessionContext;
use crate::services::{QueryMode, RagClient, RagError};
use crate::store::{InMemoryThreadStore, PostgresThreadStore, ThreadStore};
use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub manager: Arc<ProviderManager>,
    pub agent: Arc<dyn AgentRuntime>,
    pub rag: Arc<RagClient>,
}

fn build_providers(config: &Config) -> Vec<Arc<dyn LlmProvider>> {
    vec![
        Arc::new(OpenAiProvider::new(
            resolve_openai_api_key(config),
            config.llm.openai.model.clone(),
            1,
        )),
        Arc::new(GroqProvider::new(
            resolve_groq_api_key(config),
            config.llm.groq.model.clone(),
            2,
        )),
        Arc::new(OllamaProvider::new(
            resolve_ollama_base_url(config),
            config.llm.ollama.model.clone(),
            3,
        )),
    ]
}

async fn build_thread_store(config: &Config) -> Arc<dyn ThreadStore> {
    match resolve_checkpoint_uri(config) {
        None => {
            log::info!("no checkpoint uri configured, using in-memory thread store");
            Arc::new(InMemoryThreadStore::new())
        }
        Some(uri) => match PostgresThreadStore::connect(&uri).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                log::warn!("postgres thread store unavailable ({e}), falling back to in-memory");
                Arc::new(InMemoryThreadStore::new())
            }
        },
    }
}

/// Wire up providers, stores, and the agent from config.
pub async fn build_state(config: Config) -> AppState {
    let health_timeout = Duration::from_secs_f64(config.llm.health_timeout_secs);
    let manager = Arc::new(ProviderManager::new(
        build_providers(&config),
        config.llm.mode,
        config.llm.static_provider.clone(),
        health_timeout,
    ));

    let rag = Arc::new(RagClient::new(Some(config.services.rag_url.clone())));
    let memory = Arc::new(
        MemoryStore::from_config(
            config.services.memory_url.as_deref(),
            config.services.memory_api_key.clone(),
        )
        .await,
    );
    let store = build_thread_store(&config).await;
    let tools = Arc::new(AgentTools::new(rag.clone(), memory));
    let agent = Arc::new(LlmAgent::new(
        config.agent.name.clone(),
        config.agent.system_prompt.clone(),
        store,
        Some(tools),
        agent_tool_definitions(),
    ));

    AppState {
        config: Arc::new(config),
        manager,
        agent,
        rag,
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/chat/:channel", post(chat))
        .route("/admin/rag/ingest", post(rag_ingest))
        .route("/admin/rag/search", post(rag_search))
        .with_state(state)
}

/// Bind and serve until ctrl-c / SIGTERM.
pub async fn run_server(config: Config) -> Result<()> {
    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let state = build_state(config).await;
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("porter listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("failed to install ctrl-c handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => log::error!("failed to install SIGTERM handler: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received");
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let providers = state.manager.check_all_providers().await;
    Json(json!({
        "status": "ok",
        "llm_providers": providers,
        "environment": state.config.environment,
    }))
}

async fn chat(
    State(state): State<AppState>,
    Path(channel): Path<String>,
    Json(payload): Json<Value>,
) -> Response {
    let Some(channel) = ChannelType::parse(&channel) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("unsupported channel: {channel}"),
        );
    };
    let adapter = adapter_for(channel);

    let message = match adapter.from_request(&payload) {
        Ok(message) => message,
        Err(ChannelError::Validation(reason)) => {
            return error_response(StatusCode::BAD_REQUEST, reason);
        }
    };

    let options = GenerationOptions {
        temperature: Some(0.0),
        ..Default::default()
    };
    let llm = match state.manager.get_llm(&options).await {
        Ok(llm) => llm,
        Err(e @ LlmError::NoHealthyProvider) => {
            return error_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string());
        }
        Err(e) => {
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };

    let context = SessionContext::from_metadata(&message.metadata);
    let response = run_agent(state.agent.as_ref(), llm, &message, Some(&context)).await;
    Json(adapter.to_response(&response)).into_response()
}

#[derive(Deserialize)]
struct IngestRequest {
    text: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default)]
    mode: QueryMode,
}

fn rag_error_response(e: RagError) -> Response {
    log::error!("knowledge base request failed: {e}");
    error_response(StatusCode::BAD_GATEWAY, e.to_string())
}

async fn rag_ingest(
    State(state): State<AppState>,
    Json(req): Json<IngestRequest>,
) -> Response {
    match state
        .rag
        .insert_text(&req.text, req.description.as_deref())
        .await
    {
        Ok(result) => Json(result).into_response(),
        Err(e) => rag_error_response(e),
    }
}

async fn rag_search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Response {
    match state.rag.query(&req.query, req.mode).await {
        Ok(answer) => Json(json!({ "response": answer })).into_response(),
        Err(e) => rag_error_response(e),
    }
}
