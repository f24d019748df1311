//! Events pushed from the engine to every connected console.

use serde::{Deserialize, Serialize};

/// Event types that can be broadcast to all connected clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum MixdeskEvent {
    /// The set of tracks, or a track's key, changed. Consoles rebuild.
    TrackListChanged,
    /// One instantaneous level sample for a track
    AudioSamples { track_name: String, sample: f32 },
    /// Ping event to keep connection alive
    Ping,
}

impl MixdeskEvent {
    /// Channel name of this event (`list-changed`, `<track>-audio-samples`).
    pub fn event_name(&self) -> String {
        match self {
            MixdeskEvent::TrackListChanged => "list-changed".to_string(),
            MixdeskEvent::AudioSamples { track_name, .. } => {
                format!("{}-audio-samples", track_name)
            }
            MixdeskEvent::Ping => "ping".to_string(),
        }
    }

    /// Get a human-readable description of the event.
    pub fn description(&self) -> String {
        match self {
            MixdeskEvent::TrackListChanged => "Track list changed".to_string(),
            MixdeskEvent::AudioSamples { track_name, sample } => {
                format!("Level sample {:.4} for track '{}'", sample, track_name)
            }
            MixdeskEvent::Ping => "Ping".to_string(),
        }
    }
}
