//! Publish handler: inject an event into a channel over HTTP.

use std::net::SocketAddr;

use axum::Json;
use axum::Router;
use axum::extract::connect_info::ConnectInfo;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use chrono::Utc;

use crate::api::dto::{PublishRequest, PublishResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, RelayError};

/// `POST /publish` — Publish a named event into a channel.
///
/// The caller's socket address is used as the source IP for the sender's
/// allowlist check.
///
/// # Errors
///
/// Returns [`RelayError::UnknownSenderCredential`] (401) when the channel
/// and token do not match a sender credential, or
/// [`RelayError::IpNotAuthorized`] (403) when the allowlist rejects the
/// caller.
#[utoipa::path(
    post,
    path = "/api/v1/publish",
    tag = "Relay",
    summary = "Publish an event into a channel",
    description = "Validates the sender token and IP allowlist, then delivers the event to every connection currently joined to the channel. A publish into an empty channel succeeds with zero recipients.",
    request_body = PublishRequest,
    responses(
        (status = 200, description = "Event delivered", body = PublishResponse),
        (status = 401, description = "Unknown sender credential", body = ErrorResponse),
        (status = 403, description = "Source IP not authorized", body = ErrorResponse),
    )
)]
pub async fn publish(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<PublishRequest>,
) -> Result<impl IntoResponse, RelayError> {
    let source_ip = addr.ip().to_string();
    let recipients = state
        .relay_service
        .publish(&req.channel, &req.token, &req.event, req.payload, &source_ip)
        .await?;

    let response = PublishResponse {
        channel: req.channel,
        event: req.event,
        recipients,
        timestamp: Utc::now(),
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Publish routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/publish", post(publish))
}
