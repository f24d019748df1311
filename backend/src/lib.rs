//! Mixdesk reference engine.
//!
//! An in-memory track list reachable over HTTP and WebSocket, plus the
//! application builder used by the binary and the integration tests.

use axum::http::{header, Method};
use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod api;
pub mod config;
pub mod events;
pub mod gui;
pub mod openapi;
pub mod state;

use state::AppState;

/// Create the Axum application router with an empty track list.
pub async fn create_app() -> Router {
    create_app_with_state(AppState::default()).await
}

/// Create the Axum application router with a given state.
pub async fn create_app_with_state(state: AppState) -> Router {
    let api_router = Router::new()
        .route(
            "/tracks",
            get(api::tracks::list_tracks).post(api::tracks::add_empty_track),
        )
        .route(
            "/tracks/{name}",
            patch(api::tracks::update_track).delete(api::tracks::remove_track),
        )
        .route("/tracks/{name}/samples", post(api::tracks::publish_sample))
        .route("/ws", get(api::websocket::websocket_handler));

    Router::new()
        .route("/health", get(health))
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
        .nest("/api", api_router)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
                .allow_origin(Any),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "OK"
}
