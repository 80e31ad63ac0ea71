//! # webhook-relay
//!
//! Authenticated webhook ingress with real-time WebSocket fan-out.
//!
//! `POST /send-data` accepts a digest-authenticated batch of token pair
//! events, validates it structurally, and broadcasts its canonical JSON
//! form to every WebSocket subscriber connected at `GET /ws`.
//!
//! ## Architecture
//!
//! ```text
//! Webhook producers (HTTP)        Subscribers (WebSocket)
//!     │                               │
//!     ├── Ingress Handler (api/)      ├── Upgrade Handler (ws/)
//!     │   validate + authenticate     │   register + run pumps
//!     │                               │
//!     └──────────► Hub (ws/hub) ◄─────┘
//!                  registry + fan-out
//! ```
//!
//! Delivery is best-effort and at-most-once: nothing is persisted, and a
//! subscriber whose outbound queue is full skips the message rather than
//! stalling delivery to everyone else.

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod error;
pub mod ws;
