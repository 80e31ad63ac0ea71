//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Configuration is constructed once at
//! startup and never mutated afterwards.

use std::net::SocketAddr;

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`GatewayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:8080`).
    pub listen_addr: SocketAddr,

    /// Shared secret used to authenticate inbound webhook batches.
    pub ingest_secret: String,

    /// Capacity of each connection's bounded outbound message queue.
    pub outbound_queue_capacity: usize,

    /// Capacity of the hub's command channel.
    pub hub_queue_capacity: usize,
}

impl GatewayConfig {
    /// Loads configuration from environment variables.
    ///
    /// `LISTEN_ADDR` takes precedence when set; otherwise the server binds
    /// `0.0.0.0:$PORT` with a default port of 8080. Calls
    /// `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as a
    /// [`SocketAddr`], or if `INGEST_SECRET` is unset. The secret has no
    /// default and is never hard-coded.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = match std::env::var("LISTEN_ADDR") {
            Ok(addr) => addr.parse()?,
            Err(_) => {
                let port: u16 = parse_env("PORT", 8080);
                SocketAddr::from(([0, 0, 0, 0], port))
            }
        };

        let ingest_secret = std::env::var("INGEST_SECRET")
            .map_err(|_| "INGEST_SECRET must be set")?;

        let outbound_queue_capacity = parse_env("OUTBOUND_QUEUE_CAPACITY", 256);
        let hub_queue_capacity = parse_env("HUB_QUEUE_CAPACITY", 1024);

        Ok(Self {
            listen_addr,
            ingest_secret,
            outbound_queue_capacity,
            hub_queue_capacity,
        })
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
