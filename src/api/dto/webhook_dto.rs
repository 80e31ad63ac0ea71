//! Webhook batch DTOs.
//!
//! The schema is validated structurally: every field below is required and
//! type-checked on decode, recursively into `data`. No field is interpreted
//! by the gateway. Re-serializing a decoded batch yields the canonical
//! form: declared fields only, in declared order, with any unknown input
//! fields stripped.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Top-level body for `POST /send-data`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventBatch {
    /// Caller-supplied deduplication identifier; also the digest input.
    pub deduplication_id: String,
    /// Lowercase-hex SHA-256 of `secret || deduplicationId`.
    pub hash: String,
    /// Ordered event records. An empty array is accepted.
    pub data: Vec<EventRecord>,
}

/// One event together with the pair it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventRecord {
    /// The event itself.
    pub event: PairEvent,
    /// The token pair description.
    pub pair: Pair,
}

/// A token pair event. All value fields are string-encoded decimals.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PairEvent {
    /// Emitting contract address.
    pub address: String,
    /// Protocol-specific event payload.
    pub data: EventDetail,
    /// Human-facing event type label.
    pub event_display_type: String,
    /// Primary event type tag.
    pub event_type: String,
    /// Secondary event type tag.
    pub event_type2: String,
    /// Liquidity token address.
    pub liquidity_token: String,
    /// Maker address.
    pub maker: String,
    /// Quote token address.
    pub quote_token: String,
    /// Unix timestamp of the event.
    pub timestamp: i64,
    /// Token0 pool value in USD.
    pub token0_pool_value_usd: String,
    /// Token0 swap value in USD.
    pub token0_swap_value_usd: String,
    /// Token0 value in base token units.
    pub token0_value_base: String,
    /// Token0 value in USD.
    pub token0_value_usd: String,
    /// Token1 pool value in USD.
    pub token1_pool_value_usd: String,
    /// Token1 swap value in USD.
    pub token1_swap_value_usd: String,
    /// Token1 value in base token units.
    pub token1_value_base: String,
    /// Token1 value in USD.
    pub token1_value_usd: String,
}

/// Protocol payload attached to an event.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventDetail {
    /// Source protocol name.
    pub protocol: String,
    /// Event kind, e.g. `"Swap"`.
    #[serde(rename = "type")]
    pub kind: String,
}

/// Token pair description.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pair {
    /// Pair contract address.
    pub address: String,
    /// Exchange identifier hash.
    pub exchange_hash: String,
    /// Pair identifier.
    pub id: String,
    /// Network identifier.
    pub network_id: i64,
    /// First token address.
    pub token0: String,
    /// Second token address.
    pub token1: String,
}

/// Confirmation body for a successfully broadcast batch.
#[derive(Debug, Serialize, ToSchema)]
pub struct IngestResponse {
    /// Always `"broadcast"`.
    pub status: String,
    /// Number of event records in the batch.
    pub events: usize,
    /// Server receive timestamp.
    pub received_at: chrono::DateTime<chrono::Utc>,
}
