// src/websocket.rs

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use tokio::sync::mpsc;

use crate::{event::Inbound, models::ServerEvent, state::AppState, transport::ConnectionId};

/// The main handler for WebSocket connections.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Manages the lifecycle of a client. A client is anonymous until they set a username.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (sender, receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel();

    let client_id = state.relay.lock().await.connect(tx);

    let mut send_task = tokio::spawn(write_to_client(sender, rx, client_id));
    let mut receive_task = tokio::spawn(read_from_client(receiver, client_id, state.clone()));

    // Whichever half finishes first takes the other one down with it.
    tokio::select! {
        _ = &mut receive_task => send_task.abort(),
        _ = &mut send_task => receive_task.abort(),
    }

    state.relay.lock().await.disconnect(client_id);
}

/// Reads frames from a client, validates them and hands them to the relay one at a time.
async fn read_from_client(
    mut receiver: SplitStream<WebSocket>,
    client_id: ConnectionId,
    state: AppState,
) {
    while let Some(frame) = receiver.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(error) => {
                tracing::debug!(conn = %client_id, %error, "websocket receive error");
                break;
            }
        };

        let event = match Inbound::parse(text.as_str()) {
            Ok(event) => event,
            Err(error) => {
                tracing::warn!(conn = %client_id, %error, "dropping malformed event");
                continue;
            }
        };

        let name = event.name();
        if let Err(error) = state.relay.lock().await.dispatch(client_id, event) {
            tracing::warn!(conn = %client_id, event = name, %error, "event dropped");
        }
    }
}

/// Drains the connection's outbound queue onto the socket as JSON text frames.
async fn write_to_client(
    mut sender: SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
    client_id: ConnectionId,
) {
    while let Some(event) = rx.recv().await {
        let text = match serde_json::to_string(&event) {
            Ok(text) => text,
            Err(error) => {
                tracing::error!(conn = %client_id, %error, "failed to serialize outbound event");
                continue;
            }
        };
        if sender.send(Message::Text(text.into())).await.is_err() {
            tracing::debug!(conn = %client_id, "socket closed while sending");
            break;
        }
    }
}
