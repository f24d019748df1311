//! WebSocket endpoint streaming engine events to consoles.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{sink::SinkExt, stream::StreamExt};
use mixdesk_types::MixdeskEvent;
use std::time::Duration;
use tokio::select;
use tokio::time::interval;
use tracing::{debug, error, info, trace};

use crate::state::AppState;

/// WebSocket endpoint for real-time events.
///
/// Sends a `Ping` event as soon as the connection is up, then every
/// `TrackListChanged` and `AudioSamples` event as JSON text frames.
/// A protocol ping goes out every 15 seconds.
#[utoipa::path(
    get,
    path = "/api/ws",
    tag = "websocket",
    responses(
        (status = 101, description = "WebSocket connection upgraded")
    )
)]
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    info!(
        "New WebSocket client connecting (total subscribers: {})",
        state.events().subscriber_count() + 1
    );
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = state.events().stream();
    let mut ping_interval = interval(Duration::from_secs(15));

    info!("WebSocket client connected");

    if let Err(e) = send_event(&mut sender, MixdeskEvent::Ping).await {
        error!("Failed to send welcome message: {}", e);
        return;
    }

    loop {
        select! {
            event = events.next() => {
                match event {
                    Some(event) => {
                        if let Err(e) = send_event(&mut sender, event).await {
                            error!("Failed to send event to client: {}", e);
                            break;
                        }
                    }
                    None => {
                        info!("Event broadcaster closed, disconnecting client");
                        break;
                    }
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
                    Some(Ok(Message::Pong(_))) => {
                        trace!("Received pong from client");
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client sent close message");
                        break;
                    }
                    Some(Ok(Message::Text(text))) => {
                        if text.trim() == "ping" {
                            debug!("Received ping from client, sending pong");
                            if let Err(e) = sender.send(Message::Text("pong".into())).await {
                                error!("Failed to send pong: {}", e);
                                break;
                            }
                        } else {
                            debug!("Ignoring text message from client: {}", text);
                        }
                    }
                    Some(Ok(_)) => {
                        debug!("Received other message type from client");
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error: {}", e);
                        break;
                    }
                    None => {
                        info!("Client disconnected");
                        break;
                    }
                }
            }
        }
    }

    info!("WebSocket client disconnected");
}

async fn send_event(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    event: MixdeskEvent,
) -> Result<(), axum::Error> {
    trace!("Sending event to client: {}", event.description());

    let json = serde_json::to_string(&event).map_err(|e| {
        error!("Failed to serialize event: {}", e);
        axum::Error::new(e)
    })?;
    sender.send(Message::Text(json.into())).await
}
