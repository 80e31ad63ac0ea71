//! WebSocket layer: connection hub, per-connection pumps, upgrade handler.
//!
//! Subscribers connect at `/ws` and receive every batch the ingress
//! endpoint broadcasts. The connection is listen-only in practice: inbound
//! frames are handed to the `on_message` hook and otherwise ignored.

pub mod connection;
pub mod handler;
pub mod hub;
