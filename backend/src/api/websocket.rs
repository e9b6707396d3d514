//! WebSocket endpoint: the console's control surface.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use cuelight_types::{decode_command, ConsoleEvent, DecodeError};
use futures::{sink::SinkExt, stream::StreamExt};
use std::time::Duration;
use tokio::select;
use tokio::time::interval;
use tracing::{debug, error, info, trace, warn};

use crate::events::SubscriberId;
use crate::state::AppState;

/// WebSocket endpoint for controlling the console.
///
/// Clients send JSON commands tagged with `type` (`go-cue`, `set-levels`,
/// ...). Every payload the engine produces for a command is pushed to all
/// connected sessions, as are level updates while a fade runs. The server
/// pings every 15 seconds.
///
/// Example usage from JavaScript:
/// ```javascript
/// const ws = new WebSocket('ws://localhost:8080/api/ws');
/// ws.onopen = () => ws.send(JSON.stringify({type: 'go-cue', list_id: 1}));
/// ws.onmessage = (event) => console.log(JSON.parse(event.data));
/// ```
#[utoipa::path(
    get,
    path = "/api/ws",
    tag = "websocket",
    responses(
        (status = 101, description = "WebSocket connection upgraded")
    )
)]
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (subscriber, mut events) = state.subscribers().register().await;

    // Ping interval for keep-alive
    let mut ping_interval = interval(Duration::from_secs(15));

    loop {
        select! {
            event = events.recv() => {
                let Some(event) = event else {
                    info!(%subscriber, "Subscriber queue closed, disconnecting client");
                    break;
                };
                if let Err(e) = send_event(&mut sender, &event).await {
                    debug!("Failed to send event, client likely disconnected: {}", e);
                    break;
                }
            }

            _ = ping_interval.tick() => {
                trace!("Sending ping to client");
                if let Err(e) = sender.send(Message::Ping(vec![].into())).await {
                    debug!("Failed to send ping, client likely disconnected: {}", e);
                    break;
                }
            }

            message = receiver.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        if text.trim() == "ping" {
                            if let Err(e) = sender.send(Message::Text("pong".into())).await {
                                error!("Failed to send pong: {}", e);
                                break;
                            }
                            continue;
                        }
                        if !forward_command(&state, subscriber, text.as_str()).await {
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        trace!("Received pong from client");
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!(%subscriber, "Client sent close message");
                        break;
                    }
                    Some(Ok(_)) => {
                        debug!("Ignoring non-text message from client");
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error: {}", e);
                        break;
                    }
                    None => {
                        break;
                    }
                }
            }
        }
    }

    state.subscribers().unregister(subscriber).await;
    info!(%subscriber, "WebSocket client disconnected");
}

/// Decode one text frame and hand it to the engine.
///
/// Returns false when the engine is gone and the session should end.
async fn forward_command(state: &AppState, subscriber: SubscriberId, text: &str) -> bool {
    let command = match decode_command(text) {
        Ok(command) => command,
        Err(DecodeError::UnknownKind(kind)) => {
            warn!("Ignoring message of unknown type '{}'", kind);
            return true;
        }
        Err(e) => {
            warn!("Dropping malformed message: {}", e);
            return true;
        }
    };

    debug!(kind = command.kind(), list = ?command.list_id(), "Received command");
    match state.engine().submit_from(subscriber, command).await {
        Ok(()) => true,
        Err(e) => {
            error!("Failed to forward command: {}", e);
            false
        }
    }
}

/// Send an event to the client as a JSON message.
async fn send_event(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    event: &ConsoleEvent,
) -> Result<(), axum::Error> {
    trace!("Sending {} to client", event.description());

    match serde_json::to_string(event) {
        Ok(json) => {
            sender.send(Message::Text(json.into())).await?;
            Ok(())
        }
        Err(e) => {
            error!("Failed to serialize event: {}", e);
            Err(axum::Error::new(e))
        }
    }
}
