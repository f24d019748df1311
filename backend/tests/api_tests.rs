//! Integration tests for the Mixdesk engine API.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use mixdesk::create_app_with_state;
use mixdesk::state::AppState;
use mixdesk_types::{AddTrackResponse, MixdeskEvent, TrackInfo, TrackListResponse};
use serde_json::json;
use tower::ServiceExt; // for `oneshot`

/// Helper to create a test app instance sharing `state`.
async fn create_test_app(state: &AppState) -> Router {
    create_app_with_state(state.clone()).await
}

async fn state_with(names: &[&str]) -> AppState {
    let state = AppState::new();
    for name in names {
        state.insert_track(TrackInfo::new(*name)).await.unwrap();
    }
    state
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(method)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app(&AppState::new()).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_list_tracks_empty() {
    let app = create_test_app(&AppState::new()).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/tracks")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let list: TrackListResponse = body_json(response).await;
    assert!(list.tracks.is_empty());
}

#[tokio::test]
async fn test_list_tracks_sorted_with_wire_names() {
    let state = state_with(&["Vox", "Bass"]).await;
    let app = create_test_app(&state).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/tracks")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let value: serde_json::Value = body_json(response).await;
    let tracks = value["tracks"].as_array().unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0]["name"], "Bass");
    assert_eq!(tracks[1]["name"], "Vox");
    assert_eq!(tracks[0]["trackType"], "In");
}

#[tokio::test]
async fn test_add_empty_track() {
    let state = AppState::new();
    let mut rx = state.events().subscribe();
    let app = create_test_app(&state).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/tracks")
                .method("POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let created: AddTrackResponse = body_json(response).await;
    assert_eq!(created.track.name, "Track 1");
    assert_eq!(created.track.gain, 1.0);
    assert_eq!(rx.try_recv().unwrap(), MixdeskEvent::TrackListChanged);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/tracks")
                .method("POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let created: AddTrackResponse = body_json(response).await;
    assert_eq!(created.track.name, "Track 2");
}

#[tokio::test]
async fn test_update_track_flags_and_gain() {
    let state = state_with(&["Vox"]).await;
    let app = create_test_app(&state).await;

    let response = app
        .clone()
        .oneshot(json_request("PATCH", "/api/tracks/Vox", json!({ "Mute": true })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(json_request("PATCH", "/api/tracks/Vox", json!({ "Gain": 0.25 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let track = state.get_track("Vox").await.unwrap();
    assert!(track.mute);
    assert_eq!(track.gain, 0.25);
}

#[tokio::test]
async fn test_update_unknown_track() {
    let app = create_test_app(&AppState::new()).await;

    let response = app
        .oneshot(json_request("PATCH", "/api/tracks/Ghost", json!({ "Solo": true })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let value: serde_json::Value = body_json(response).await;
    assert!(value["error"].as_str().unwrap().contains("Ghost"));
}

#[tokio::test]
async fn test_rename_track() {
    let state = state_with(&["Track 1", "Bass"]).await;
    let app = create_test_app(&state).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/api/tracks/Track%201",
            json!({ "Name": "Vox" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(state.get_track("Vox").await.is_some());

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/api/tracks/Vox",
            json!({ "Name": "Bass" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .oneshot(json_request("PATCH", "/api/tracks/Vox", json!({ "Name": "  " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_remove_track() {
    let state = state_with(&["Vox"]).await;
    let app = create_test_app(&state).await;

    let delete = || {
        Request::builder()
            .uri("/api/tracks/Vox")
            .method("DELETE")
            .body(Body::empty())
            .unwrap()
    };

    let response = app.clone().oneshot(delete()).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.oneshot(delete()).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_publish_sample() {
    let state = state_with(&["Vox"]).await;
    let mut rx = state.events().subscribe();
    let app = create_test_app(&state).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/tracks/Vox/samples",
            json!({ "sample": 0.01 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(
        rx.try_recv().unwrap(),
        MixdeskEvent::AudioSamples {
            track_name: "Vox".to_string(),
            sample: 0.01
        }
    );

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/tracks/Bass/samples",
            json!({ "sample": 0.01 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_openapi_document() {
    let app = create_test_app(&AppState::new()).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let value: serde_json::Value = body_json(response).await;
    assert!(value["paths"]["/api/tracks"].is_object());
}
