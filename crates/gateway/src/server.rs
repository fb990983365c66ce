//! Proxy gateway: axum HTTP server fronting the chat and SideShift APIs.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::chat;
use crate::config::GatewayConfig;
use crate::sideshift::{SideshiftClient, routes};

// ─── Shared state ──────────────────────────────────────────

/// Shared state for route handlers.
pub struct GatewayState {
    pub config: GatewayConfig,
    /// Client used for the chat passthrough.
    pub http: reqwest::Client,
    pub sideshift: SideshiftClient,
}

impl GatewayState {
    pub fn new(config: GatewayConfig) -> Self {
        let http = reqwest::Client::new();
        let sideshift = SideshiftClient::new(
            http.clone(),
            config.sideshift_url.clone(),
            config.sideshift_secret().map(str::to_string),
            config.sideshift_affiliate_id().map(str::to_string),
        );
        Self {
            config,
            http,
            sideshift,
        }
    }
}

// ─── Router ────────────────────────────────────────────────

fn build_cors(origins: &str) -> CorsLayer {
    let origins = origins.trim();
    if origins.is_empty() || origins == "*" {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }
    let parsed: Vec<_> = origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Builds the gateway router with CORS and request tracing.
pub fn build_router(state: Arc<GatewayState>) -> Router {
    let cors = build_cors(&state.config.cors_origins);
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/chat", post(chat::chat))
        .route("/api/sideshift/coins", get(routes::coins))
        .route("/api/sideshift/pairs", get(routes::pairs))
        .route("/api/sideshift/quotes", post(routes::create_quote))
        .route("/api/sideshift/shifts/fixed", post(routes::create_fixed_shift))
        .route("/api/sideshift/shifts/", get(routes::missing_shift_id))
        .route("/api/sideshift/shifts/{shift_id}", get(routes::shift_status))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn health_handler() -> &'static str {
    "ok"
}

// ─── Server ────────────────────────────────────────────────

/// Binds the configured port and serves the gateway until Ctrl-C.
pub struct GatewayServer {
    config: GatewayConfig,
}

impl GatewayServer {
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    pub async fn run(self) -> std::io::Result<()> {
        let addr = format!("0.0.0.0:{}", self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        info!(addr = %addr, "Gateway listening");
        self.serve(listener).await
    }

    /// Serves on an already-bound listener.
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        let app = build_router(Arc::new(GatewayState::new(self.config)));
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!(error = %e, "Failed to listen for shutdown signal");
                    std::future::pending::<()>().await;
                }
                info!("Gateway shutting down");
            })
            .await
    }
}
