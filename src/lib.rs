//! # relay-gateway
//!
//! REST API and WebSocket gateway for channel-scoped real-time event relay.
//!
//! Publishers send named events with a JSON payload into a named channel;
//! every connection currently joined to that channel receives the event.
//! Access is gated per channel by shared tokens — listener tokens to join,
//! sender tokens (plus an IP allowlist) to publish. Delivery is
//! best-effort: only connections live at dispatch time receive an event,
//! and nothing is replayed for late joiners.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── RelayService (service/)
//!     ├── EventBus (domain/)
//!     │
//!     ├── ChannelRegistry (domain/)
//!     ├── CredentialCache (store/)
//!     │
//!     └── FileEventLog / PostgreSQL (store/)
//! ```
//!
//! ## Deployment constraint
//!
//! The audit log uses a non-atomic load-mutate-persist cycle on a shared
//! file; run a single gateway process per log file.

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod store;
pub mod ws;
