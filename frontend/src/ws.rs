//! WebSocket client for the backend event stream.

use mixdesk_types::MixdeskEvent;
use tokio::sync::mpsc::UnboundedSender;

use crate::state::{ConnectionState, ConsoleMessage};

type Repaint = std::sync::Arc<dyn Fn() + Send + Sync>;

/// WebSocket client feeding events into the console inbox.
pub struct WebSocketClient {
    url: String,
}

impl WebSocketClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Event stream URL for a server URL: `http://h:p` becomes `ws://h:p/api/ws`.
    pub fn for_server(server_url: &str) -> Self {
        let base = server_url.trim_end_matches('/');
        let base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base.to_string()
        };
        Self::new(format!("{}/api/ws", base))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Connect and keep listening. Reconnects on disconnect with exponential backoff.
    ///
    /// Must be called within a tokio runtime.
    pub fn connect(&self, tx: UnboundedSender<ConsoleMessage>, repaint: Repaint) {
        tracing::info!("Connecting to WebSocket: {}", self.url);
        let url = self.url.clone();
        tokio::spawn(async move {
            Self::connection_loop(url, tx, repaint).await;
        });
    }

    async fn connection_loop(url: String, tx: UnboundedSender<ConsoleMessage>, repaint: Repaint) {
        use futures_util::stream::StreamExt;
        use tokio::time::{sleep, Duration};
        use tokio_tungstenite::{connect_async, tungstenite::Message};

        let notify = |message: ConsoleMessage| -> bool {
            let delivered = tx.send(message).is_ok();
            repaint();
            delivered
        };

        let mut attempt = 1u32;

        loop {
            if !notify(ConsoleMessage::ConnectionStateChanged(
                ConnectionState::Reconnecting { attempt },
            )) {
                tracing::debug!("Console closed, stopping WebSocket client");
                return;
            }

            tracing::info!("WebSocket connection attempt {} to: {}", attempt, url);

            match connect_async(url.as_str()).await {
                Ok((mut ws_stream, _)) => {
                    tracing::info!("WebSocket connected");
                    let mut marked_connected = false;

                    while let Some(msg_result) = ws_stream.next().await {
                        match msg_result {
                            Ok(Message::Text(text)) => {
                                // Connected only once the backend has spoken
                                if !marked_connected {
                                    notify(ConsoleMessage::ConnectionStateChanged(
                                        ConnectionState::Connected,
                                    ));
                                    marked_connected = true;
                                    attempt = 1;
                                }

                                match parse_event(&text) {
                                    Some(MixdeskEvent::Ping) => {}
                                    Some(event) => {
                                        if !notify(ConsoleMessage::Event(event)) {
                                            return;
                                        }
                                    }
                                    None => {}
                                }
                            }
                            Ok(Message::Close(_)) => {
                                tracing::info!("WebSocket closed by server");
                                break;
                            }
                            Ok(_) => {}
                            Err(e) => {
                                tracing::error!("WebSocket error: {:?}", e);
                                break;
                            }
                        }
                    }

                    if marked_connected {
                        tracing::warn!("WebSocket connection lost, will attempt to reconnect...");
                        notify(ConsoleMessage::ConnectionStateChanged(
                            ConnectionState::Disconnected,
                        ));
                    } else {
                        tracing::warn!("WebSocket connection attempt failed, will retry...");
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to connect WebSocket: {:?}", e);
                }
            }

            let delay_ms = reconnect_delay_ms(attempt);
            tracing::info!("Waiting {}ms before reconnection attempt...", delay_ms);
            sleep(Duration::from_millis(delay_ms)).await;

            attempt += 1;
        }
    }
}

/// Exponential backoff from 1 s, capped at 8 s.
fn reconnect_delay_ms(attempt: u32) -> u64 {
    1000u64 * 2u64.pow(attempt.clamp(1, 4) - 1)
}

fn parse_event(text: &str) -> Option<MixdeskEvent> {
    match serde_json::from_str::<MixdeskEvent>(text) {
        Ok(event) => {
            tracing::trace!("Parsed WebSocket event: {}", event.description());
            Some(event)
        }
        Err(err) => {
            tracing::error!("Failed to parse WebSocket event: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_server() {
        assert_eq!(
            WebSocketClient::for_server("http://localhost:8080").url(),
            "ws://localhost:8080/api/ws"
        );
        assert_eq!(
            WebSocketClient::for_server("https://desk.example/").url(),
            "wss://desk.example/api/ws"
        );
    }

    #[test]
    fn test_backoff() {
        let delays: Vec<u64> = (1..=6).map(reconnect_delay_ms).collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 8000, 8000]);
    }

    #[test]
    fn test_parse_samples_event() {
        let event =
            parse_event(r#"{"type":"AudioSamples","data":{"track_name":"Vox","sample":0.25}}"#);
        assert_eq!(
            event,
            Some(MixdeskEvent::AudioSamples {
                track_name: "Vox".to_string(),
                sample: 0.25
            })
        );
        assert_eq!(parse_event("not json"), None);
    }
}
