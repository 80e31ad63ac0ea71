//! Axum WebSocket upgrade handler.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;
use chrono::Utc;

use super::connection::run_connection;
use crate::app_state::{AppState, ClientInfo};

/// `GET /ws` — Upgrade the HTTP connection to a WebSocket and register it
/// with the hub. Non-upgrade requests are rejected by the extractor with
/// the appropriate status; a failed upgrade is logged and the request
/// abandoned without registration.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let hub = state.hub.clone();
    let hooks = Arc::clone(&state.hooks);
    let capacity = state.config.outbound_queue_capacity;

    ws.on_failed_upgrade(|err| {
        tracing::warn!(error = %err, "websocket upgrade failed");
    })
    .on_upgrade(move |socket| {
        let context = ClientInfo {
            connected_at: Utc::now(),
        };
        run_connection(socket, hub, hooks, context, capacity)
    })
}
