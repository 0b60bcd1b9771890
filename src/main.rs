//! relay-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use relay_gateway::api;
use relay_gateway::app_state::AppState;
use relay_gateway::config::RelayConfig;
use relay_gateway::domain::{ChannelRegistry, EventBus};
use relay_gateway::service::RelayService;
use relay_gateway::store::{
    CredentialCache, CredentialSource, FileCredentialStore, FileEventLog, PostgresCredentialStore,
};
use relay_gateway::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = RelayConfig::from_env().map_err(|e| anyhow::anyhow!(e.to_string()))?;
    tracing::info!(addr = %config.listen_addr, "starting relay-gateway");

    // Build credential stores
    let file_store =
        FileCredentialStore::new(config.listeners_path.clone(), config.senders_path.clone());
    let database_store = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .acquire_timeout(std::time::Duration::from_secs(
                    config.database_connect_timeout_secs,
                ))
                .connect_lazy(url)?;
            Some(PostgresCredentialStore::new(pool))
        }
        None => None,
    };

    // Initial credential load is fatal on failure
    let source = CredentialSource::parse(&config.credential_source)?;
    let credentials = CredentialCache::initialize(file_store, database_store, source).await?;
    tracing::info!(source = source.as_str(), "credentials loaded");

    // Build domain layer
    let registry = Arc::new(ChannelRegistry::new());
    let event_bus = EventBus::new(config.event_bus_capacity);
    let event_log = FileEventLog::new(config.event_log_path.clone());

    // Build service layer
    let relay_service = Arc::new(RelayService::new(credentials, registry, event_bus, event_log));
    relay_service.record_server_reboot().await;

    // Build application state
    let app_state = AppState { relay_service };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    #[cfg(feature = "swagger-ui")]
    let app = {
        use utoipa::OpenApi;
        app.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", api::ApiDoc::openapi()),
        )
    };

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
