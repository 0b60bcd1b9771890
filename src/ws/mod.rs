//! WebSocket layer: upgrade handler, connection loop, and message types.
//!
//! Each accepted socket becomes one relay connection: it joins channels
//! with a listener token, optionally publishes with a sender token, and
//! receives every event published to its joined channels until it closes.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
