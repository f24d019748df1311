//! Track API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use mixdesk_types::{
    AddTrackResponse, ErrorResponse, SampleRequest, TrackListResponse, TrackUpdate,
};
use tracing::{info, trace, warn};

use crate::state::{AppState, TrackError};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn track_error(error: TrackError) -> ApiError {
    let status = match error {
        TrackError::NotFound(_) => StatusCode::NOT_FOUND,
        TrackError::NameTaken(_) => StatusCode::CONFLICT,
        TrackError::EmptyName => StatusCode::BAD_REQUEST,
    };
    (status, Json(ErrorResponse::new(error.to_string())))
}

/// List all tracks, sorted by name.
#[utoipa::path(
    get,
    path = "/api/tracks",
    tag = "tracks",
    responses(
        (status = 200, description = "List all tracks", body = TrackListResponse)
    )
)]
pub async fn list_tracks(State(state): State<AppState>) -> Json<TrackListResponse> {
    let tracks = state.get_tracks().await;
    Json(TrackListResponse { tracks })
}

/// Add an empty input track.
#[utoipa::path(
    post,
    path = "/api/tracks",
    tag = "tracks",
    responses(
        (status = 201, description = "Track created", body = AddTrackResponse)
    )
)]
pub async fn add_empty_track(
    State(state): State<AppState>,
) -> (StatusCode, Json<AddTrackResponse>) {
    let track = state.add_empty_track().await;
    (StatusCode::CREATED, Json(AddTrackResponse { track }))
}

/// Apply one update to a track.
#[utoipa::path(
    patch,
    path = "/api/tracks/{name}",
    tag = "tracks",
    params(
        ("name" = String, Path, description = "Track name")
    ),
    request_body = TrackUpdate,
    responses(
        (status = 204, description = "Track updated"),
        (status = 400, description = "Empty track name", body = ErrorResponse),
        (status = 404, description = "Track not found", body = ErrorResponse),
        (status = 409, description = "Track name already in use", body = ErrorResponse)
    )
)]
pub async fn update_track(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(update): Json<TrackUpdate>,
) -> Result<StatusCode, ApiError> {
    match &update {
        TrackUpdate::Gain(_) | TrackUpdate::Pan(_) => {
            trace!("Update track '{}': {}", name, update.description())
        }
        _ => info!("Update track '{}': {}", name, update.description()),
    }

    state.update_track(&name, update).await.map_err(|e| {
        warn!("Rejected update for track '{}': {}", name, e);
        track_error(e)
    })?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove a track.
#[utoipa::path(
    delete,
    path = "/api/tracks/{name}",
    tag = "tracks",
    params(
        ("name" = String, Path, description = "Track name")
    ),
    responses(
        (status = 204, description = "Track removed"),
        (status = 404, description = "Track not found", body = ErrorResponse)
    )
)]
pub async fn remove_track(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.remove_track(&name).await.map_err(track_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Feed one level sample to every console showing this track.
#[utoipa::path(
    post,
    path = "/api/tracks/{name}/samples",
    tag = "tracks",
    params(
        ("name" = String, Path, description = "Track name")
    ),
    request_body = SampleRequest,
    responses(
        (status = 202, description = "Sample published"),
        (status = 404, description = "Track not found", body = ErrorResponse)
    )
)]
pub async fn publish_sample(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<SampleRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .publish_sample(&name, req.sample)
        .await
        .map_err(track_error)?;
    Ok(StatusCode::ACCEPTED)
}
