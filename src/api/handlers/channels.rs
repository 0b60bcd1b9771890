//! Channel status and audit log handlers.

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;

use crate::api::dto::{ActiveChannelsResponse, ChannelStatusDto, LogEntryDto};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, RelayError};

/// `GET /channels/active` — Status of every configured channel.
///
/// Reports channels declared in the credential snapshot whether or not they
/// have live members, so operators can see configured-but-empty channels.
#[utoipa::path(
    get,
    path = "/api/v1/channels/active",
    tag = "Channels",
    summary = "List configured channels with live-member counts",
    description = "Returns every channel declared in the active credential snapshot with its live connection count. Channels without members report `is_active: false`.",
    responses(
        (status = 200, description = "Channel statuses", body = ActiveChannelsResponse),
    )
)]
pub async fn active_channels(State(state): State<AppState>) -> impl IntoResponse {
    let channels = state
        .relay_service
        .active_channels()
        .await
        .into_iter()
        .map(|(name, status)| (name, ChannelStatusDto::from(status)))
        .collect();

    Json(ActiveChannelsResponse { channels })
}

/// `GET /logs` — Audit log entries, oldest first.
///
/// # Errors
///
/// Returns [`RelayError::LogStoreUnavailable`] (503) when the log file
/// exists but cannot be read.
#[utoipa::path(
    get,
    path = "/api/v1/logs",
    tag = "Channels",
    summary = "Read the audit log",
    description = "Returns the bounded audit trail of publish, join, and disconnect actions. At most 200 entries spanning at most 24 hours; an empty array when nothing has been logged yet.",
    responses(
        (status = 200, description = "Ordered log entries", body = Vec<LogEntryDto>),
        (status = 503, description = "Log store unavailable", body = ErrorResponse),
    )
)]
pub async fn logs(State(state): State<AppState>) -> Result<impl IntoResponse, RelayError> {
    let entries = state.relay_service.logs().await?;
    let dtos: Vec<LogEntryDto> = entries.into_iter().map(LogEntryDto::from).collect();
    Ok(Json(dtos))
}

/// Channel and log routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/channels/active", get(active_channels))
        .route("/logs", get(logs))
}
