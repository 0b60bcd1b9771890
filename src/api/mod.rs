//! REST API layer: route handlers, DTOs, and router composition.
//!
//! All endpoints are mounted under `/api/v1`.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document covering the gateway's REST surface.
///
/// Served by the Swagger UI when the `swagger-ui` feature is enabled.
#[derive(Debug, OpenApi)]
#[openapi(
    paths(
        handlers::publish::publish,
        handlers::channels::active_channels,
        handlers::channels::logs,
        handlers::system::reload_credentials,
        handlers::system::health_handler,
    ),
    tags(
        (name = "Relay", description = "Event publishing into channels"),
        (name = "Channels", description = "Channel status and audit log"),
        (name = "System", description = "Health and credential administration"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/publish",
            "/api/v1/channels/active",
            "/api/v1/logs",
            "/api/v1/credentials/reload",
            "/health",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing path {path}");
        }
    }
}
