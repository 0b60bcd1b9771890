//! DTOs for channel status, audit log, and credential reload endpoints.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::service::ChannelStatus;
use crate::store::LogEntry;

/// Status of one configured channel.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChannelStatusDto {
    /// Whether the channel currently has at least one live member.
    pub is_active: bool,
    /// Number of live connections.
    pub connections: usize,
}

impl From<ChannelStatus> for ChannelStatusDto {
    fn from(status: ChannelStatus) -> Self {
        Self {
            is_active: status.is_active,
            connections: status.connections,
        }
    }
}

/// Response body for `GET /api/v1/channels/active`: every channel declared
/// in the credential snapshot, including configured-but-empty ones.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ActiveChannelsResponse {
    /// Channel statuses keyed by channel name.
    pub channels: BTreeMap<String, ChannelStatusDto>,
}

/// One audit log entry as returned by `GET /api/v1/logs`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LogEntryDto {
    /// Insertion timestamp.
    pub created_at: DateTime<Utc>,
    /// Channel the action targeted, or `"system"`.
    pub channel: String,
    /// Event kind.
    pub event: String,
    /// Action-specific payload.
    pub payload: serde_json::Value,
}

impl From<LogEntry> for LogEntryDto {
    fn from(entry: LogEntry) -> Self {
        Self {
            created_at: entry.created_at,
            channel: entry.channel,
            event: entry.event,
            payload: entry.payload,
        }
    }
}

/// Request body for `POST /api/v1/credentials/reload`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReloadRequest {
    /// Source selector: `"file"` or `"database"`.
    pub source: String,
}

/// Confirmation returned after a successful credential reload.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReloadResponse {
    /// Source now in effect.
    pub source: String,
    /// Reload timestamp.
    pub timestamp: DateTime<Utc>,
}
