//! HTTP gateway for Stepwise.
//!
//! The gateway is the caller boundary of the agent runtime: every request
//! gets its own [`Agent`](stepwise_agent::Agent), run on its own task under
//! the configured wall-clock budget.
//!
//! Routes:
//! - `GET /health`
//! - `GET /api/agent/chat?prompt=...` (Server-Sent Events)
//! - `POST /api/agent/run` (JSON, waits for the summary)

pub mod api;

use std::sync::Arc;

use axum::{Router, http::Method, http::header, response::Json, routing::get, routing::post};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use stepwise_agent::Agent;
use stepwise_config::AppConfig;
use stepwise_core::{Provider, ToolRegistry};
use stepwise_tools::Workspace;

/// Shared, read-only state for all handlers.
///
/// Agents are never shared; only their collaborators are.
pub struct GatewayState {
    pub config: AppConfig,
    pub provider: Arc<dyn Provider>,
    pub tools: Arc<ToolRegistry>,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    pub fn new(config: AppConfig, provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            config,
            provider,
            tools,
        }
    }

    /// Build a fresh agent for one request.
    pub fn new_agent(&self) -> Agent {
        Agent::new(
            self.provider.clone(),
            &self.config.default_model,
            self.tools.clone(),
            self.config.agent.clone(),
        )
        .with_temperature(self.config.default_temperature)
        .with_max_tokens(self.config.default_max_tokens)
    }
}

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/agent/chat", get(api::chat_handler))
        .route("/api/agent/run", post(api::run_handler))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
///
/// The provider and tool registry are built once and shared by every agent.
pub async fn start(config: AppConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let provider = stepwise_providers::build_from_config(&config).default_provider()?;
    let workspace = Workspace::new(config.workspace_root());
    info!(
        provider = provider.name(),
        model = %config.default_model,
        workspace = %workspace.root().display(),
        "Gateway collaborators ready"
    );
    let tools = Arc::new(stepwise_tools::default_registry(workspace));

    let app = build_router(Arc::new(GatewayState::new(config, provider, tools)));

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

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
