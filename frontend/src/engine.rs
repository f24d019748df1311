//! The command side of the engine boundary.

use async_trait::async_trait;
use mixdesk_types::{TrackListResponse, TrackUpdate};
use thiserror::Error;

/// Result type for engine commands.
pub type EngineResult<T> = Result<T, EngineError>;

/// Why an engine command did not go through.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The engine could not be reached
    #[error("Network error: {0}")]
    Network(String),
    /// The engine answered with an error status
    #[error("HTTP {status} error: {message}")]
    Http { status: u16, message: String },
    /// The engine's answer could not be understood
    #[error("Decode error: {0}")]
    Decode(String),
    /// The engine refused the command
    #[error("Rejected: {0}")]
    Rejected(String),
}

/// Commands the console issues to the audio engine.
///
/// Every command addresses a track by name. Implementations must be
/// shareable across tasks: the console fires commands concurrently and
/// never waits for one before issuing the next.
#[async_trait]
pub trait Engine: Send + Sync + 'static {
    async fn update_track(&self, track_name: &str, update: TrackUpdate) -> EngineResult<()>;

    async fn add_empty_track(&self) -> EngineResult<()>;

    async fn remove_track(&self, track_name: &str) -> EngineResult<()>;

    async fn get_track_list(&self) -> EngineResult<TrackListResponse>;
}
