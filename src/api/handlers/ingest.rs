//! Webhook ingress endpoint.
//!
//! Decode, authenticate, canonicalize, broadcast — in that order. A batch
//! that fails any step is discarded whole; nothing is ever partially
//! broadcast, and the handler never retries.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{EventBatch, IngestResponse};
use crate::app_state::AppState;
use crate::auth;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /send-data` — Validate, authenticate, and broadcast a webhook batch.
///
/// # Errors
///
/// Returns [`GatewayError`] on malformed JSON, a missing required field,
/// a digest mismatch, or if canonical re-encoding fails.
#[utoipa::path(
    post,
    path = "/send-data",
    tag = "Ingress",
    summary = "Ingest a webhook event batch",
    description = "Validates the batch structurally, checks the shared-secret digest, and broadcasts the canonical JSON form to every connected WebSocket subscriber.",
    request_body = EventBatch,
    responses(
        (status = 200, description = "Batch broadcast to all subscribers", body = IngestResponse),
        (status = 400, description = "Malformed JSON, missing field, or digest mismatch", body = ErrorResponse),
        (status = 500, description = "Canonical encoding failed", body = ErrorResponse),
    )
)]
pub async fn ingest_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, GatewayError> {
    let batch: EventBatch = serde_json::from_slice(&body)
        .map_err(|err| GatewayError::InvalidRequest(err.to_string()))?;

    if !auth::verify_digest(
        &state.config.ingest_secret,
        &batch.deduplication_id,
        &batch.hash,
    ) {
        return Err(GatewayError::DigestMismatch);
    }

    // Canonical form: declared fields only, in declared order.
    let canonical = serde_json::to_string(&batch)
        .map_err(|err| GatewayError::Encoding(err.to_string()))?;

    state
        .hub
        .broadcast(canonical.into())
        .await
        .map_err(|_| GatewayError::Internal("hub is not running".to_string()))?;

    Ok((
        StatusCode::OK,
        Json(IngestResponse {
            status: "broadcast".to_string(),
            events: batch.data.len(),
            received_at: Utc::now(),
        }),
    ))
}

/// Ingress routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/send-data", post(ingest_handler))
}
