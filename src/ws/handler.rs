//! Axum WebSocket upgrade handler.

use std::net::SocketAddr;

use axum::extract::connect_info::ConnectInfo;
use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::app_state::AppState;

/// `GET /ws` — Upgrade HTTP connection to WebSocket.
///
/// The peer address is captured at upgrade time and used as the source IP
/// for publish commands sent over this connection.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let event_rx = state.relay_service.event_bus().subscribe();
    let relay_service = std::sync::Arc::clone(&state.relay_service);
    let source_ip = addr.ip().to_string();

    ws.on_upgrade(move |socket| run_connection(socket, event_rx, relay_service, source_ip))
}
