//! HTTP gateway for Wrenchwise.
//!
//! Exposes the cascade over REST and server-sent events, plus health,
//! persona and tier listings. Built on Axum.

pub mod api_v1;

use axum::extract::DefaultBodyLimit;
use axum::{Router, response::Json, routing::get};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use wrenchwise_cascade::ModelCascadeExecutor;
use wrenchwise_config::AppConfig;

/// Request body limit; inline attachments travel base64-encoded.
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Build the full router: `/health` plus the v1 API under `/v1`.
///
/// Layers applied:
/// - Request body size limit (8 MB)
/// - CORS for browser clients
/// - HTTP trace logging
pub fn build_router(state: api_v1::SharedApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/v1", api_v1::v1_router(state))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Build the provider and executor once and wrap them for the handlers.
pub fn build_state(
    config: AppConfig,
) -> Result<api_v1::SharedApiState, Box<dyn std::error::Error>> {
    let provider = wrenchwise_providers::build_from_config(&config)?;
    let executor = ModelCascadeExecutor::from_config(&config, provider)?;
    Ok(Arc::new(api_v1::ApiV1State { config, executor }))
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let state = build_state(config)?;

    let tiers: Vec<&str> = state.executor.ladder().iter().map(|t| t.id.as_str()).collect();
    info!(
        addr = %addr,
        provider = state.executor.provider_name(),
        tiers = ?tiers,
        personas = state.config.personas.len(),
        "Gateway starting"
    );

    let app = build_router(state.clone());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
