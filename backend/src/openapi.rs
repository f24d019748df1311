//! OpenAPI documentation configuration.

use mixdesk_types::{
    AddTrackResponse, ErrorResponse, SampleRequest, TrackInfo, TrackListResponse, TrackType,
    TrackUpdate,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::tracks::list_tracks,
        crate::api::tracks::add_empty_track,
        crate::api::tracks::update_track,
        crate::api::tracks::remove_track,
        crate::api::tracks::publish_sample,
        crate::api::websocket::websocket_handler,
    ),
    components(
        schemas(
            TrackInfo,
            TrackType,
            TrackUpdate,
            TrackListResponse,
            AddTrackResponse,
            SampleRequest,
            ErrorResponse,
        )
    ),
    tags(
        (name = "tracks", description = "Track list and mixer state"),
        (name = "websocket", description = "Real-time engine events")
    ),
    info(
        title = "Mixdesk Engine API",
        version = "0.1.0",
        description = "Command and event boundary between the mixer console and the audio engine",
        license(
            name = "MIT OR Apache-2.0"
        )
    )
)]
pub struct ApiDoc;
