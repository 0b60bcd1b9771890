//! WebSocket message types: envelope, commands, and events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: serde_json::Value,
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client broadcast event.
    Event,
    /// Server → Client error.
    Error,
}

/// Commands that a client can send over WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Join a channel as a listener.
    Join {
        /// Channel to join.
        channel: String,
        /// Listener token for the channel.
        token: String,
    },
    /// Leave a previously joined channel.
    Leave {
        /// Channel to leave.
        channel: String,
    },
    /// Publish an event into a channel as a sender.
    Publish {
        /// Target channel.
        channel: String,
        /// Sender token for the channel.
        token: String,
        /// Event name delivered to listeners.
        event: String,
        /// Arbitrary JSON payload.
        #[serde(default)]
        payload: serde_json::Value,
    },
}
