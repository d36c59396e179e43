mod api;
mod routes;

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::routes::AppState;
use rightnow_core::{Brain, Orchestrator, Registry, Relay, Runtime, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logging Setup
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    info!("RightNow Gateway Initializing...");

    // 2. Configuration, loaded once and never mutated
    let settings = Settings::from_env()?;

    // 3. Initialize The Brain
    let brain = Arc::new(Brain::new(&settings));

    // 4. Tool provider and messaging clients share one connection pool
    let http = reqwest::Client::builder()
        .pool_idle_timeout(Duration::from_secs(30))
        .build()
        .context("Failed to build HTTP client")?;
    let registry = Registry::new(http.clone(), settings.mcp_server_url.clone());
    let runtime = Runtime::new(http.clone(), settings.mcp_server_url.clone());
    let relay = Relay::new(http, settings.whatsapp_api_url.clone());

    // Quick connectivity check; the gateway still starts when it fails
    if registry.is_available().await {
        info!("Tool provider online at {}", settings.mcp_server_url);
    } else {
        warn!(
            "Tool provider at {} is offline; chats will run in degraded mode",
            settings.mcp_server_url
        );
    }

    // 5. Bundle State
    let state = AppState {
        orchestrator: Arc::new(Orchestrator::new(brain, registry, runtime)),
        relay: Arc::new(relay),
    };

    // 6. Start Server
    let app = routes::router(state);
    let listener = TcpListener::bind(settings.gateway_addr)
        .await
        .with_context(|| format!("Failed to bind {}", settings.gateway_addr))?;
    info!("Gateway listening on {}...", settings.gateway_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
