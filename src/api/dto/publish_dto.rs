//! Request/response DTOs for the publish endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for `POST /api/v1/publish`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PublishRequest {
    /// Target channel.
    pub channel: String,
    /// Sender token for the channel.
    pub token: String,
    /// Event name delivered to listeners.
    pub event: String,
    /// Arbitrary JSON payload. Defaults to `null`.
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Acknowledgement returned after a successful publish.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PublishResponse {
    /// Channel the event was published into.
    pub channel: String,
    /// Event name.
    pub event: String,
    /// Number of live connections in the channel at dispatch time.
    pub recipients: usize,
    /// Server-side publish timestamp.
    pub timestamp: DateTime<Utc>,
}
