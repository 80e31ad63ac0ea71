//! webhook-relay server entry point.
//!
//! Starts the Axum HTTP server with the ingress and WebSocket endpoints.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use webhook_relay::api;
use webhook_relay::app_state::{AppState, ClientInfo, GatewayHooks};
use webhook_relay::config::GatewayConfig;
use webhook_relay::ws::handler::ws_handler;
use webhook_relay::ws::hub::{Hub, HubHooks};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Arc::new(GatewayConfig::from_env()?);
    tracing::info!(addr = %config.listen_addr, "starting webhook-relay");

    // Build the hub and its coordinating task
    let hooks: Arc<dyn HubHooks<ClientInfo>> = Arc::new(GatewayHooks);
    let hub = Hub::spawn(Arc::clone(&hooks), config.hub_queue_capacity);

    // Build application state
    let app_state = AppState {
        hub,
        hooks,
        config: Arc::clone(&config),
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server; a bind failure is the only non-zero exit
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
