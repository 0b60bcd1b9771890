//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching join/leave/publish commands and forwarding events for the
//! channels this connection has joined. On close the session replays
//! `leave` for every joined channel via [`RelayService::disconnect`].

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::JoinedChannels;
use crate::domain::{ConnectionId, RelayEvent};
use crate::service::RelayService;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them to the service.
/// - Forwards events from the [`broadcast::Receiver`] to the client when
///   the event's channel is one this connection has joined.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<RelayEvent>,
    relay_service: Arc<RelayService>,
    source_ip: String,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let conn = ConnectionId::new();
    let mut joined = JoinedChannels::new();

    loop {
        tokio::select! {
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response =
                            handle_text_message(&text, conn, &mut joined, &relay_service, &source_ip)
                                .await;
                        if let Some(resp_json) = response
                            && ws_tx.send(Message::text(resp_json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            // Event from EventBus
            event = event_rx.recv() => {
                match event {
                    Ok(relay_event) => {
                        if joined.matches(relay_event.channel()) {
                            let msg = WsMessage {
                                id: uuid::Uuid::new_v4().to_string(),
                                msg_type: WsMessageType::Event,
                                timestamp: chrono::Utc::now(),
                                payload: serde_json::to_value(&relay_event).unwrap_or_default(),
                            };
                            let json = serde_json::to_string(&msg).unwrap_or_default();
                            if ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    // Leave every channel this session joined; the registry keeps no
    // per-connection history of its own.
    relay_service.disconnect(conn, &joined.names()).await;
    tracing::debug!(%conn, "ws connection closed");
}

/// Handles a text message from the client, returning an optional JSON
/// response.
async fn handle_text_message(
    text: &str,
    conn: ConnectionId,
    joined: &mut JoinedChannels,
    relay_service: &Arc<RelayService>,
    source_ip: &str,
) -> Option<String> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        let err = WsMessage {
            id: String::new(),
            msg_type: WsMessageType::Error,
            timestamp: chrono::Utc::now(),
            payload: serde_json::json!({
                "code": 400,
                "message": "malformed JSON"
            }),
        };
        return serde_json::to_string(&err).ok();
    };

    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload.clone()) else {
        let err = WsMessage {
            id: msg.id,
            msg_type: WsMessageType::Error,
            timestamp: chrono::Utc::now(),
            payload: serde_json::json!({
                "code": 404,
                "message": "unknown command"
            }),
        };
        return serde_json::to_string(&err).ok();
    };

    match command {
        WsCommand::Join { channel, token } => {
            match relay_service.subscribe(&channel, &token, conn).await {
                Ok(()) => {
                    joined.join(&channel);
                    let response = WsMessage {
                        id: msg.id,
                        msg_type: WsMessageType::Response,
                        timestamp: chrono::Utc::now(),
                        payload: serde_json::json!({
                            "joined": channel,
                            "channels": joined.count(),
                        }),
                    };
                    serde_json::to_string(&response).ok()
                }
                Err(err) => error_response(msg.id, &err),
            }
        }
        WsCommand::Leave { channel } => {
            joined.leave(&channel);
            relay_service.registry().leave(&channel, conn).await;
            let response = WsMessage {
                id: msg.id,
                msg_type: WsMessageType::Response,
                timestamp: chrono::Utc::now(),
                payload: serde_json::json!({
                    "left": channel,
                    "channels": joined.count(),
                }),
            };
            serde_json::to_string(&response).ok()
        }
        WsCommand::Publish {
            channel,
            token,
            event,
            payload,
        } => {
            match relay_service
                .publish(&channel, &token, &event, payload, source_ip)
                .await
            {
                Ok(recipients) => {
                    let response = WsMessage {
                        id: msg.id,
                        msg_type: WsMessageType::Response,
                        timestamp: chrono::Utc::now(),
                        payload: serde_json::json!({
                            "published": event,
                            "channel": channel,
                            "recipients": recipients,
                        }),
                    };
                    serde_json::to_string(&response).ok()
                }
                Err(err) => error_response(msg.id, &err),
            }
        }
    }
}

/// Renders a [`crate::error::RelayError`] as an error envelope.
fn error_response(id: String, err: &crate::error::RelayError) -> Option<String> {
    let msg = WsMessage {
        id,
        msg_type: WsMessageType::Error,
        timestamp: chrono::Utc::now(),
        payload: serde_json::json!({
            "code": err.error_code(),
            "kind": err.kind(),
            "message": err.to_string(),
        }),
    };
    serde_json::to_string(&msg).ok()
}
