//! System endpoints: health check and credential reload.

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::dto::{ReloadRequest, ReloadResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, RelayError};

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// `POST /credentials/reload` — Swap the credential snapshot.
///
/// All-or-nothing: when the named source cannot be read the previous
/// snapshot stays in effect and the error is returned.
///
/// # Errors
///
/// Returns [`RelayError::InvalidSource`] (400) for an unknown selector, or
/// [`RelayError::CredentialStoreUnavailable`] (503) when the source cannot
/// be read.
#[utoipa::path(
    post,
    path = "/api/v1/credentials/reload",
    tag = "System",
    summary = "Reload credentials from a source",
    description = "Reloads the full credential snapshot from `file` or `database`. A failed load leaves the previous snapshot in effect.",
    request_body = ReloadRequest,
    responses(
        (status = 200, description = "Credentials reloaded", body = ReloadResponse),
        (status = 400, description = "Unknown source selector", body = ErrorResponse),
        (status = 503, description = "Source unavailable; previous snapshot kept", body = ErrorResponse),
    )
)]
pub async fn reload_credentials(
    State(state): State<AppState>,
    Json(req): Json<ReloadRequest>,
) -> Result<impl IntoResponse, RelayError> {
    state.relay_service.reload_credentials(&req.source).await?;

    Ok(Json(ReloadResponse {
        source: req.source,
        timestamp: Utc::now(),
    }))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}

/// System routes mounted under /api/v1.
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/credentials/reload", post(reload_credentials))
}
