//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::GatewayConfig;
use crate::ws::hub::{Connection, Hub, HubHooks};

/// Per-connection context attached at upgrade time.
#[derive(Debug, Clone, Copy)]
pub struct ClientInfo {
    /// When the socket was upgraded.
    pub connected_at: DateTime<Utc>,
}

/// Hook implementation for gateway clients.
///
/// Subscribers are listen-only: inbound frames are logged at debug level
/// and otherwise ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct GatewayHooks;

impl HubHooks<ClientInfo> for GatewayHooks {
    fn on_message(&self, conn: &Connection<ClientInfo>, payload: &[u8]) -> anyhow::Result<()> {
        tracing::debug!(id = %conn.id(), bytes = payload.len(), "ignoring inbound client frame");
        Ok(())
    }
}

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Hub handle for registration and fan-out.
    pub hub: Hub<ClientInfo>,
    /// Lifecycle hooks shared with every connection's pumps.
    pub hooks: Arc<dyn HubHooks<ClientInfo>>,
    /// Gateway configuration (shared secret, queue capacities).
    pub config: Arc<GatewayConfig>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("hub", &self.hub)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
