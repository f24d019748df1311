//! Event broadcasting to connected consoles.

use futures::Stream;
use mixdesk_types::MixdeskEvent;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{debug, trace, warn};

/// Fan-out of engine events to every WebSocket client.
#[derive(Clone)]
pub struct EventBroadcaster {
    sender: Arc<broadcast::Sender<MixdeskEvent>>,
}

impl EventBroadcaster {
    /// Create a new event broadcaster with a buffer size.
    pub fn new(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Broadcast an event to all connected clients.
    pub fn broadcast(&self, event: MixdeskEvent) {
        match &event {
            MixdeskEvent::AudioSamples { .. } => {
                trace!("Broadcasting event: {}", event.description())
            }
            _ => debug!("Broadcasting event: {}", event.description()),
        }
        // No receivers is fine, nobody is listening yet
        let _ = self.sender.send(event);
    }

    /// Raw receiver, mostly for tests.
    pub fn subscribe(&self) -> broadcast::Receiver<MixdeskEvent> {
        self.sender.subscribe()
    }

    /// Stream of events for one client. A lagged client may have missed a
    /// list change, so the skipped events are replaced by `TrackListChanged`.
    pub fn stream(&self) -> impl Stream<Item = MixdeskEvent> + Send + Unpin + 'static {
        BroadcastStream::new(self.sender.subscribe()).map(|result| match result {
            Ok(event) => event,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!("Client lagging, skipped {} events, asking it to resync", skipped);
                MixdeskEvent::TrackListChanged
            }
        })
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_broadcaster_creation() {
        let broadcaster = EventBroadcaster::new(10);
        assert_eq!(broadcaster.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_subscribers() {
        let broadcaster = EventBroadcaster::new(10);
        let mut rx = broadcaster.subscribe();
        let mut stream = broadcaster.stream();
        assert_eq!(broadcaster.subscriber_count(), 2);

        broadcaster.broadcast(MixdeskEvent::TrackListChanged);

        assert_eq!(rx.recv().await.unwrap(), MixdeskEvent::TrackListChanged);
        assert_eq!(stream.next().await, Some(MixdeskEvent::TrackListChanged));
    }

    #[tokio::test]
    async fn test_lagged_stream_asks_for_resync() {
        let broadcaster = EventBroadcaster::new(4);
        let mut stream = broadcaster.stream();

        broadcaster.broadcast(MixdeskEvent::TrackListChanged);
        for n in 0..8 {
            broadcaster.broadcast(MixdeskEvent::AudioSamples {
                track_name: "Vox".to_string(),
                sample: n as f32 / 10.0,
            });
        }

        // The list change fell out of the buffer; the client still hears of it
        assert_eq!(stream.next().await, Some(MixdeskEvent::TrackListChanged));
        assert!(matches!(
            stream.next().await,
            Some(MixdeskEvent::AudioSamples { .. })
        ));
    }

    #[tokio::test]
    async fn test_broadcast_without_subscribers_is_silent() {
        let broadcaster = EventBroadcaster::default();
        broadcaster.broadcast(MixdeskEvent::Ping);
        assert_eq!(broadcaster.subscriber_count(), 0);
    }
}
