//! End-to-end HTTP tests against a real server on a loopback port.

use lib::config::Config;
use lib::llm::SelectionMode;
use lib::server::run_server;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::time::Duration;

fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    listener.local_addr().expect("local addr").port()
}

async fn spawn_server(config: Config) -> String {
    let base = format!("http://127.0.0.1:{}", config.server.port);
    tokio::spawn(async move {
        if let Err(e) = run_server(config).await {
            eprintln!("server exited: {e}");
        }
    });

    let client = reqwest::Client::new();
    for _ in 0..50 {
        if client
            .get(format!("{base}/health"))
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .is_ok()
        {
            return base;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("server did not come up at {base}");
}

fn test_config() -> Config {
    let mut config: Config = serde_json::from_str("{}").expect("default config");
    config.server.port = free_port();
    // Keep health probes fast; no backend is reachable in tests.
    config.llm.health_timeout_secs = 0.5;
    config
}

#[tokio::test(flavor = "multi_thread")]
async fn health_reports_all_providers() {
    let base = spawn_server(test_config()).await;
    let body: Value = reqwest::get(format!("{base}/health"))
        .await
        .expect("health request")
        .json()
        .await
        .expect("health json");

    assert_eq!(body["status"], "ok");
    assert_eq!(body["environment"], "dev");
    let providers = body["llm_providers"].as_object().expect("providers map");
    for name in ["openai", "groq", "ollama"] {
        assert!(providers.contains_key(name), "missing provider {name}");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn unsupported_channel_is_rejected() {
    let base = spawn_server(test_config()).await;
    let res = reqwest::Client::new()
        .post(format!("{base}/v1/chat/sms"))
        .json(&json!({"user_id": "u1", "text": "hi"}))
        .send()
        .await
        .expect("chat request");
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.expect("error json");
    assert!(body["error"].as_str().unwrap().contains("sms"));
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_payload_is_rejected() {
    let base = spawn_server(test_config()).await;
    let res = reqwest::Client::new()
        .post(format!("{base}/v1/chat/whatsapp"))
        .json(&json!(["not", "an", "object"]))
        .send()
        .await
        .expect("chat request");
    assert_eq!(res.status(), 400);
}

#[tokio::test(flavor = "multi_thread")]
async fn static_mode_with_unknown_provider_is_a_server_error() {
    let mut config = test_config();
    config.llm.mode = SelectionMode::Static;
    config.llm.static_provider = "mistral".to_string();
    let base = spawn_server(config).await;

    let res = reqwest::Client::new()
        .post(format!("{base}/v1/chat/web"))
        .json(&json!({"user_id": "u1", "text": "hi"}))
        .send()
        .await
        .expect("chat request");
    assert_eq!(res.status(), 500);
    let body: Value = res.json().await.expect("error json");
    assert!(body["error"].as_str().unwrap().contains("mistral"));
}
