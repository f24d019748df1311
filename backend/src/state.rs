//! Application state: the in-memory track list of the reference engine.

use crate::events::EventBroadcaster;
use mixdesk_types::console::EMPTY_TRACK_PREFIX;
use mixdesk_types::{MixdeskEvent, TrackInfo, TrackUpdate};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Errors returned by track operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackError {
    #[error("Track not found: {0}")]
    NotFound(String),
    #[error("A track named '{0}' already exists")]
    NameTaken(String),
    #[error("Track name must not be empty")]
    EmptyName,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// All tracks, keyed by name
    tracks: RwLock<HashMap<String, TrackInfo>>,
    /// Event broadcaster for real-time updates
    events: EventBroadcaster,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                tracks: RwLock::new(HashMap::new()),
                events: EventBroadcaster::default(),
            }),
        }
    }

    /// Get the event broadcaster.
    pub fn events(&self) -> &EventBroadcaster {
        &self.inner.events
    }

    /// All tracks sorted by name.
    pub async fn get_tracks(&self) -> Vec<TrackInfo> {
        let tracks = self.inner.tracks.read().await;
        let mut list: Vec<TrackInfo> = tracks.values().cloned().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    pub async fn get_track(&self, name: &str) -> Option<TrackInfo> {
        self.inner.tracks.read().await.get(name).cloned()
    }

    /// Insert a track as-is. Fails if the name is empty or taken.
    pub async fn insert_track(&self, track: TrackInfo) -> Result<(), TrackError> {
        if track.name.trim().is_empty() {
            return Err(TrackError::EmptyName);
        }
        {
            let mut tracks = self.inner.tracks.write().await;
            if tracks.contains_key(&track.name) {
                return Err(TrackError::NameTaken(track.name));
            }
            info!("Inserted track '{}'", track.name);
            tracks.insert(track.name.clone(), track);
        }
        self.inner.events.broadcast(MixdeskEvent::TrackListChanged);
        Ok(())
    }

    /// Add an input track named `Track N` with the lowest free N.
    pub async fn add_empty_track(&self) -> TrackInfo {
        let track = {
            let mut tracks = self.inner.tracks.write().await;
            let name = (1..)
                .map(|n| format!("{} {}", EMPTY_TRACK_PREFIX, n))
                .find(|name| !tracks.contains_key(name))
                .unwrap_or_else(|| EMPTY_TRACK_PREFIX.to_string());
            let track = TrackInfo::new(name);
            tracks.insert(track.name.clone(), track.clone());
            track
        };
        info!("Added empty track '{}'", track.name);
        self.inner.events.broadcast(MixdeskEvent::TrackListChanged);
        track
    }

    /// Apply one update to the track called `name`.
    ///
    /// Renames re-key the track and notify every console; other updates
    /// change the stored values silently.
    pub async fn update_track(&self, name: &str, update: TrackUpdate) -> Result<(), TrackError> {
        let renamed = {
            let mut tracks = self.inner.tracks.write().await;
            if !tracks.contains_key(name) {
                return Err(TrackError::NotFound(name.to_string()));
            }

            match &update {
                TrackUpdate::Name(new_name) => {
                    let new_name = new_name.trim();
                    if new_name.is_empty() {
                        return Err(TrackError::EmptyName);
                    }
                    if new_name == name {
                        false
                    } else if tracks.contains_key(new_name) {
                        return Err(TrackError::NameTaken(new_name.to_string()));
                    } else {
                        let mut track = tracks
                            .remove(name)
                            .ok_or_else(|| TrackError::NotFound(name.to_string()))?;
                        track.name = new_name.to_string();
                        info!("Renamed track '{}' to '{}'", name, new_name);
                        tracks.insert(track.name.clone(), track);
                        true
                    }
                }
                other => {
                    let track = tracks
                        .get_mut(name)
                        .ok_or_else(|| TrackError::NotFound(name.to_string()))?;
                    track.apply(other);
                    debug!("Track '{}': {}", name, other.description());
                    false
                }
            }
        };

        if renamed {
            self.inner.events.broadcast(MixdeskEvent::TrackListChanged);
        }
        Ok(())
    }

    pub async fn remove_track(&self, name: &str) -> Result<(), TrackError> {
        let removed = self.inner.tracks.write().await.remove(name);
        match removed {
            Some(_) => {
                info!("Removed track '{}'", name);
                self.inner.events.broadcast(MixdeskEvent::TrackListChanged);
                Ok(())
            }
            None => Err(TrackError::NotFound(name.to_string())),
        }
    }

    /// Publish one level sample for a track's meter.
    pub async fn publish_sample(&self, name: &str, sample: f32) -> Result<(), TrackError> {
        if !self.inner.tracks.read().await.contains_key(name) {
            return Err(TrackError::NotFound(name.to_string()));
        }
        self.inner.events.broadcast(MixdeskEvent::AudioSamples {
            track_name: name.to_string(),
            sample,
        });
        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    #[tokio::test]
    async fn test_add_assigns_lowest_free_number() {
        let state = AppState::new();
        assert_eq!(state.add_empty_track().await.name, "Track 1");
        assert_eq!(state.add_empty_track().await.name, "Track 2");

        state.remove_track("Track 1").await.unwrap();
        assert_eq!(state.add_empty_track().await.name, "Track 1");
        assert_eq!(state.add_empty_track().await.name, "Track 3");
    }

    #[tokio::test]
    async fn test_new_track_defaults() {
        let state = AppState::new();
        let track = state.add_empty_track().await;
        assert_eq!(track.gain, 1.0);
        assert_eq!(track.pan, 0.0);
        assert!(!track.mute && !track.solo && !track.record && !track.monitor);
    }

    #[tokio::test]
    async fn test_list_sorted_by_name() {
        let state = AppState::new();
        for name in ["Vox", "Bass", "Drums"] {
            state.insert_track(TrackInfo::new(name)).await.unwrap();
        }
        let names: Vec<String> = state.get_tracks().await.into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Bass", "Drums", "Vox"]);
    }

    #[tokio::test]
    async fn test_rename_rekeys_track() {
        let state = AppState::new();
        state.insert_track(TrackInfo::new("Track 1")).await.unwrap();

        state
            .update_track("Track 1", TrackUpdate::Name("  Vox ".to_string()))
            .await
            .unwrap();

        assert!(state.get_track("Track 1").await.is_none());
        assert_eq!(state.get_track("Vox").await.unwrap().name, "Vox");
    }

    #[tokio::test]
    async fn test_rename_conflicts() {
        let state = AppState::new();
        state.insert_track(TrackInfo::new("Vox")).await.unwrap();
        state.insert_track(TrackInfo::new("Bass")).await.unwrap();

        assert_eq!(
            state
                .update_track("Bass", TrackUpdate::Name("Vox".to_string()))
                .await,
            Err(TrackError::NameTaken("Vox".to_string()))
        );
        assert_eq!(
            state
                .update_track("Bass", TrackUpdate::Name("   ".to_string()))
                .await,
            Err(TrackError::EmptyName)
        );
        assert_eq!(
            state
                .update_track("Nope", TrackUpdate::Mute(true))
                .await,
            Err(TrackError::NotFound("Nope".to_string()))
        );
    }

    #[tokio::test]
    async fn test_engine_does_not_enforce_exclusivity() {
        let state = AppState::new();
        state.insert_track(TrackInfo::new("Vox")).await.unwrap();
        state.update_track("Vox", TrackUpdate::Mute(true)).await.unwrap();
        state.update_track("Vox", TrackUpdate::Solo(true)).await.unwrap();

        let track = state.get_track("Vox").await.unwrap();
        assert!(track.mute && track.solo);
    }

    #[tokio::test]
    async fn test_list_changed_only_on_structure_changes() {
        let state = AppState::new();
        let mut rx = state.events().subscribe();

        state.add_empty_track().await;
        assert_eq!(rx.try_recv(), Ok(MixdeskEvent::TrackListChanged));

        state
            .update_track("Track 1", TrackUpdate::Gain(0.5))
            .await
            .unwrap();
        state
            .update_track("Track 1", TrackUpdate::Mute(true))
            .await
            .unwrap();
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));

        state
            .update_track("Track 1", TrackUpdate::Name("Vox".to_string()))
            .await
            .unwrap();
        assert_eq!(rx.try_recv(), Ok(MixdeskEvent::TrackListChanged));

        state.remove_track("Vox").await.unwrap();
        assert_eq!(rx.try_recv(), Ok(MixdeskEvent::TrackListChanged));
    }

    #[tokio::test]
    async fn test_publish_sample() {
        let state = AppState::new();
        state.insert_track(TrackInfo::new("Vox")).await.unwrap();
        let mut rx = state.events().subscribe();

        state.publish_sample("Vox", 0.25).await.unwrap();
        assert_eq!(
            rx.try_recv(),
            Ok(MixdeskEvent::AudioSamples {
                track_name: "Vox".to_string(),
                sample: 0.25
            })
        );
        assert_eq!(
            state.publish_sample("Bass", 0.1).await,
            Err(TrackError::NotFound("Bass".to_string()))
        );
    }
}
