//! Messages posted to the console from async operations.

use mixdesk_types::{MixdeskEvent, TrackListResponse};

use crate::binder::PairId;
use crate::engine::EngineResult;
use crate::toggle::ToggleOutcome;

/// Messages sent from engine round trips and the event stream to the UI thread.
#[derive(Debug)]
pub enum ConsoleMessage {
    /// Track list fetched for a rebuild
    TrackListLoaded {
        request: u64,
        result: EngineResult<TrackListResponse>,
    },
    /// What the engine accepted of a toggle
    ToggleDone { pair: PairId, outcome: ToggleOutcome },
    /// Outcome of a rename command
    RenameDone {
        pair: PairId,
        new_name: String,
        result: EngineResult<()>,
    },
    /// Outcome of an add-track command
    TrackAdded(EngineResult<()>),
    /// Outcome of a remove-track command
    TrackRemoved {
        track_name: String,
        result: EngineResult<()>,
    },
    /// Event received from the engine via WebSocket
    Event(MixdeskEvent),
    /// WebSocket connection state changed
    ConnectionStateChanged(ConnectionState),
}

/// WebSocket connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Connected to the engine
    Connected,
    /// Disconnected from the engine
    Disconnected,
    /// Attempting to reconnect
    Reconnecting { attempt: u32 },
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    pub fn description(&self) -> &'static str {
        match self {
            ConnectionState::Connected => "Connected",
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Reconnecting { .. } => "Reconnecting",
        }
    }
}
