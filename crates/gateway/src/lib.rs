//! HTTP gateway for RelayDesk.
//!
//! - `POST /api/chat` streams the model's answer as NDJSON
//! - any other method on `/api/chat` gets 405
//! - every other path is served from the static asset directory, or 404
//!
//! Requests are stateless: the client sends the whole conversation each time
//! and the knowledge documents are re-read per request.

pub mod chat;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use relaydesk_config::{AppConfig, GatewayConfig};
use relaydesk_context::ContextAssembler;
use relaydesk_core::error::ProviderError;
use relaydesk_core::protocol::CHAT_PATH;
use relaydesk_core::provider::Provider;
use relaydesk_providers::ConfiguredProvider;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared, read-only application state for the gateway.
pub struct GatewayState {
    pub assembler: ContextAssembler,
    pub provider: Arc<dyn Provider>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    pub fn new(config: &AppConfig, provider: Arc<dyn Provider>) -> Self {
        Self {
            assembler: ContextAssembler::from_config(config),
            provider,
            model: config.default_model.clone(),
            temperature: config.assistant.temperature,
            max_tokens: config.assistant.max_tokens,
        }
    }

    /// State for the configured provider, using that provider's model.
    pub fn from_config(config: &AppConfig) -> Result<Self, ProviderError> {
        let ConfiguredProvider { provider, model } = relaydesk_providers::from_config(config)?;
        Ok(Self {
            model,
            ..Self::new(config, provider)
        })
    }
}

/// Build the router: the chat endpoint plus the static asset fallback.
pub fn build_router(state: SharedState, gateway: &GatewayConfig) -> Router {
    Router::new()
        .route(CHAT_PATH, post(chat::chat_handler))
        .fallback_service(ServeDir::new(&gateway.static_dir))
        .layer(DefaultBodyLimit::max(gateway.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let state = Arc::new(GatewayState::from_config(&config)?);
    info!(
        provider = state.provider.name(),
        model = %state.model,
        knowledge = %config.knowledge.base,
        retrieval = state.assembler.has_retriever(),
        "Gateway state ready"
    );

    let app = build_router(state, &config.gateway);

    info!(addr = %addr, static_dir = %config.gateway.static_dir, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
