//! Chat WebSocket handler.
//!
//! Each socket is split into a reader loop that feeds the relay and a writer
//! task that drains the connection's outbound queue into the socket.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use std::sync::Arc;

use crate::chat::{event_channel, ConnectionId, EventReceiver, Relay};

/// State for WebSocket chat handler.
#[derive(Clone)]
pub struct ChatWsState {
    /// Shared relay.
    pub relay: Arc<Relay>,
}

impl ChatWsState {
    /// Create a new chat WebSocket state.
    pub fn new(relay: Arc<Relay>) -> Self {
        Self { relay }
    }
}

/// WebSocket chat handler.
///
/// GET /ws
pub async fn chat_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ChatWsState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle a WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<ChatWsState>) {
    let (ws_sender, mut ws_receiver) = socket.split();
    let (tx, rx) = event_channel();

    let connection_id = state.relay.connect(tx).await;
    tracing::info!(connection = %connection_id, "Client connected");

    let writer = tokio::spawn(write_events(ws_sender, rx, connection_id));

    while let Some(msg_result) = ws_receiver.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                state.relay.handle_text(&text).await;
            }
            Ok(Message::Binary(data)) => match std::str::from_utf8(&data) {
                Ok(text) => {
                    state.relay.handle_text(text).await;
                }
                Err(_) => {
                    tracing::warn!(connection = %connection_id, "Ignoring non-UTF-8 binary frame");
                }
            },
            Ok(Message::Close(_)) => {
                tracing::debug!(connection = %connection_id, "WebSocket closed by client");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(connection = %connection_id, "WebSocket error: {}", e);
                break;
            }
        }
    }

    state.relay.disconnect(connection_id).await;
    writer.abort();
    tracing::info!(connection = %connection_id, "Client disconnected");
}

/// Forward queued events to the socket until either side goes away.
async fn write_events(
    mut ws_sender: SplitSink<WebSocket, Message>,
    mut rx: EventReceiver,
    connection_id: ConnectionId,
) {
    while let Some(event) = rx.recv().await {
        let json = match serde_json::to_string(&event) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(connection = %connection_id, "Failed to encode event: {}", e);
                continue;
            }
        };
        if ws_sender.send(Message::Text(json)).await.is_err() {
            break;
        }
    }
}
