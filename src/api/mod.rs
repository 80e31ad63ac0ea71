//! HTTP API layer: route handlers, DTOs, and router composition.
//!
//! All endpoints are mounted at the root level; the WebSocket upgrade
//! route is added separately in `main`.

pub mod dto;
pub mod handlers;

use axum::Router;

use crate::app_state::AppState;

/// Builds the complete HTTP router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new().merge(handlers::routes())
}
