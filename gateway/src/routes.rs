use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::api::{ApiError, ChatResponse, Relayed, SendRequest, ToolsResponse};
use rightnow_core::{orchestrator, ChatError, Orchestrator, Relay};

// Everything a handler needs. Immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub relay: Arc<Relay>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/chat", post(chat))
        .route("/api/tools", get(list_tools))
        .route("/api/whatsapp", get(whatsapp_status).post(whatsapp_send))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// --- HANDLERS ---

async fn health_check() -> &'static str {
    "RightNow Gateway: Operational"
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    // Reject bad input before anything goes out on the network
    let Json(body) = payload.map_err(|e| ChatError::InvalidRequest(e.body_text()))?;
    let messages = orchestrator::parse_messages(&body)?;

    info!("Chat request with {} message(s)", messages.len());
    let response = state.orchestrator.respond(messages).await?;

    Ok(Json(ChatResponse { response }))
}

async fn list_tools(State(state): State<AppState>) -> Json<ToolsResponse> {
    let registry = state.orchestrator.registry();
    let available = registry.is_available().await;
    let tools = registry.list_tools().await;
    Json(ToolsResponse { available, tools })
}

async fn whatsapp_status(State(state): State<AppState>) -> Relayed {
    Relayed(state.relay.status().await)
}

async fn whatsapp_send(
    State(state): State<AppState>,
    payload: Result<Json<SendRequest>, JsonRejection>,
) -> Relayed {
    let request = payload
        .map(|Json(req)| req)
        .unwrap_or_else(|e| {
            warn!("Unreadable WhatsApp send body: {}", e.body_text());
            SendRequest::default()
        });

    Relayed(
        state
            .relay
            .send(request.to.as_deref(), request.message.as_deref())
            .await,
    )
}
