//! WebSocket handler bridging socket connections to the realtime gateway.
//!
//! The `/ws` endpoint upgrades an HTTP connection to a WebSocket. Once
//! connected, the handler:
//!
//! - **Forwards events:** Drains the connection's outbound mailbox opened by
//!   [`ChatGateway::connect`] and pushes every `ServerEvent` to the client as
//!   a JSON text frame.
//! - **Receives events:** Parses incoming text frames as `ClientEvent` and
//!   hands them to the gateway, which manages room membership and dispatch.
//!
//! Malformed frames are answered with an `error` event and logged at debug;
//! they never tear down the connection. On disconnect the gateway clears all
//! of the connection's room memberships.
//!
//! [`ChatGateway::connect`]: worklink_core::realtime::gateway::ChatGateway::connect

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};

use worklink_types::realtime::{ClientEvent, ServerEvent};

use crate::state::AppState;

/// Upgrade an HTTP request to a WebSocket connection.
///
/// This is mounted at `/ws` in the router.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

/// Core WebSocket connection handler.
///
/// Uses `tokio::select!` to multiplex between the gateway's outbound mailbox
/// and incoming WebSocket messages from the client. This keeps both sender
/// and receiver in a single task, so an inbound event's side effects and the
/// connection's own outbound traffic never race on the socket.
async fn handle_ws_connection(socket: WebSocket, state: AppState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let (mut session, mut outbound) = state.gateway.connect();

    loop {
        tokio::select! {
            // --- Branch 1: Forward gateway events to WebSocket client ---
            event = outbound.recv() => {
                match event {
                    Some(event) => {
                        match serde_json::to_string(&event) {
                            Ok(json) => {
                                if ws_sender.send(Message::Text(json.into())).await.is_err() {
                                    // Client disconnected
                                    break;
                                }
                            }
                            Err(err) => {
                                tracing::warn!("Failed to serialize server event: {err}");
                            }
                        }
                    }
                    None => {
                        // All senders dropped (connection evicted everywhere)
                        break;
                    }
                }
            }

            // --- Branch 2: Process events from the WebSocket client ---
            msg_result = ws_receiver.next() => {
                match msg_result {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientEvent>(text.as_str()) {
                            Ok(event) => {
                                state.gateway.handle_event(&mut session, event).await;
                            }
                            Err(err) => {
                                tracing::debug!(
                                    raw = %text,
                                    error = %err,
                                    "Ignoring malformed client event"
                                );
                                let reply = ServerEvent::error("unrecognized message format");
                                if let Ok(json) = serde_json::to_string(&reply)
                                    && ws_sender.send(Message::Text(json.into())).await.is_err()
                                {
                                    break;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        // Client disconnected
                        break;
                    }
                    Some(Err(err)) => {
                        tracing::debug!("WebSocket receive error: {err}");
                        break;
                    }
                    // Ignore binary, ping, pong protocol frames (handled by axum/tungstenite)
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.gateway.disconnect(&session);
    tracing::debug!(connection_id = %session.connection_id, "WebSocket connection closed");
}
