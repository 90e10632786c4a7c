//! resdesk-svc - Research Desk service
//!
//! Browser-facing HTTP service that turns a folder of text documents into an
//! annotated, browsable research library: an external LLM classifies and
//! summarizes each document against the user's thesis, then the library can
//! be filtered, tagged, reported on, chatted with, and exported.
//!
//! Integrates with its frontend via HTTP REST + SSE.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use resdesk_common::config::Config;
use resdesk_common::events::EventBus;
use resdesk_svc::services::GeminiClient;
use resdesk_svc::AppState;

#[derive(Debug, Parser)]
#[command(name = "resdesk-svc", version, about = "Research Desk service")]
struct Args {
    /// Path to the TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config file)
    #[arg(long)]
    port: Option<u16>,

    /// API key for the model endpoint (overrides config and environment)
    #[arg(long, env = "RESDESK_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Starting resdesk-svc (Research Desk) service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Load configuration (CLI > env > file > defaults)
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(api_key) = args.api_key {
        config.llm.api_key = api_key;
    }
    if config.llm.api_key.is_empty() {
        warn!("No API key configured; every analysis will degrade to fallback content");
    }
    info!("Model: {}", config.llm.model);

    // External model gateway
    let gateway = GeminiClient::new(
        config.llm.endpoint.clone(),
        config.llm.model.clone(),
        config.llm.api_key.clone(),
    )
    .map_err(|e| anyhow::anyhow!("Failed to build model client: {}", e))?;

    // Create event bus for SSE broadcasting
    let event_bus = EventBus::new(100); // 100 event capacity
    info!("Event bus initialized");

    // Create application state
    let bind = format!("{}:{}", config.server.bind, config.server.port);
    let state = AppState::new(config, event_bus, Arc::new(gateway));

    // Build router
    let app = resdesk_svc::build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("Listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app).await?;

    Ok(())
}
