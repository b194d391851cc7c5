//! porter command line: run the gateway or poke a running instance.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use lib::config::{load_config, Config};
use serde_json::{json, Value};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "porter", about = "Multi-channel agent gateway", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the porter version.
    Version,
    /// Run the HTTP gateway.
    Serve {
        /// Config file path (default: ~/.porter/config.json).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the configured port.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Query a running gateway's health endpoint.
    Health {
        /// Gateway base URL (default: derived from config).
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Ingest a document into the knowledge base via the gateway.
    Ingest {
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Document text to ingest.
        text: String,
        /// Optional document description.
        #[arg(long)]
        description: Option<String>,
    },
    /// Search the knowledge base via the gateway.
    Search {
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Query text.
        query: String,
        /// Retrieval mode: global, local, hybrid, or naive.
        #[arg(long, default_value = "hybrid")]
        mode: String,
    },
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

fn load(config_path: Option<PathBuf>) -> Result<Config> {
    let (config, path) = load_config(config_path)?;
    log::debug!("config loaded from {}", path.display());
    Ok(config)
}

fn server_url(url: Option<String>, config_path: Option<PathBuf>) -> Result<String> {
    if let Some(url) = url {
        return Ok(url.trim_end_matches('/').to_string());
    }
    let config = load(config_path)?;
    Ok(format!(
        "http://{}:{}",
        config.server.bind, config.server.port
    ))
}

async fn get_json(url: &str) -> Result<Value> {
    let res = reqwest::get(url).await.with_context(|| format!("GET {url}"))?;
    let status = res.status();
    let body: Value = res.json().await.with_context(|| format!("decoding {url}"))?;
    if !status.is_success() {
        bail!("{url} returned {status}: {body}");
    }
    Ok(body)
}

async fn post_json(url: &str, body: &Value) -> Result<Value> {
    let res = reqwest::Client::new()
        .post(url)
        .json(body)
        .send()
        .await
        .with_context(|| format!("POST {url}"))?;
    let status = res.status();
    let body: Value = res.json().await.with_context(|| format!("decoding {url}"))?;
    if !status.is_success() {
        bail!("{url} returned {status}: {body}");
    }
    Ok(body)
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Version => {
            println!("porter {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Serve { config, port } => {
            let mut config = load(config)?;
            if let Some(port) = port {
                config.server.port = port;
            }
            lib::server::run_server(config).await
        }
        Command::Health { url, config } => {
            let base = server_url(url, config)?;
            let body = get_json(&format!("{base}/health")).await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(())
        }
        Command::Ingest {
            url,
            config,
            text,
            description,
        } => {
            let base = server_url(url, config)?;
            let body = post_json(
                &format!("{base}/admin/rag/ingest"),
                &json!({ "text": text, "description": description }),
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(())
        }
        Command::Search {
            url,
            config,
            query,
            mode,
        } => {
            let base = server_url(url, config)?;
            let body = post_json(
                &format!("{base}/admin/rag/search"),
                &json!({ "query": query, "mode": mode }),
            )
            .await?;
            match body.get("response").and_then(Value::as_str) {
                Some(answer) => println!("{answer}"),
                None => println!("{}", serde_json::to_string_pretty(&body)?),
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}
