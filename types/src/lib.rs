//! Shared types for the Mixdesk console.
//!
//! This crate contains the track model, command payloads and event types
//! shared between the engine (backend) and the console (frontend).

/// Default port for the Mixdesk engine server.
pub const DEFAULT_PORT: u16 = 8080;

pub mod api;
pub mod console;
pub mod events;
pub mod track;

// Re-export commonly used types
pub use api::{AddTrackResponse, ErrorResponse, SampleRequest};
pub use events::MixdeskEvent;
pub use track::{ToggleFlag, TrackInfo, TrackListResponse, TrackType, TrackUpdate};
