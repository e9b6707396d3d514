//! cuelight backend library.
//!
//! This module exposes the cue engine and the application builder for use
//! by the server binary and in tests.

use axum::http::{header, HeaderValue, Method};
use axum::{routing::get, Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

pub mod api;
pub mod config;
pub mod console;
pub mod engine;
pub mod events;
pub mod openapi;
pub mod scheduler;
pub mod state;
pub mod transmitter;

use config::Config;
use state::AppState;
use transmitter::NullTransmitter;

/// Create the Axum application router with a fresh engine and no output.
///
/// Must be called from within a tokio runtime.
pub async fn create_app() -> Router {
    let (state, _engine) = AppState::spawn(&Config::default(), Box::new(NullTransmitter));
    create_app_with_state(state).await
}

/// Create the Axum application router with a given state.
pub async fn create_app_with_state(state: AppState) -> Router {
    create_app_with_config(state, Vec::new()).await
}

/// Create the Axum application router with a given state and CORS origins.
///
/// If `cors_allowed_origins` is empty, any origin is allowed.
/// Otherwise, only the specified origins are allowed.
pub async fn create_app_with_config(state: AppState, cors_allowed_origins: Vec<String>) -> Router {
    let api_router = Router::new()
        .route("/lists", get(api::lists::list_lists))
        .route("/lists/{id}/levels", get(api::lists::get_levels))
        .route("/lists/{id}/cues", get(api::lists::get_cues))
        .route("/version", get(api::version::get_version))
        .route("/ws", get(api::websocket::websocket_handler));

    Router::new()
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/api", api_router)
        .layer(TraceLayer::new_for_http())
        .layer({
            let cors = CorsLayer::new()
                .allow_methods([Method::GET, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

            // If no origins specified, allow any origin
            // Otherwise, restrict to the specified origins
            if cors_allowed_origins.is_empty() {
                cors.allow_origin(Any)
            } else {
                let origins: Vec<HeaderValue> = cors_allowed_origins
                    .iter()
                    .filter_map(|o| o.parse::<HeaderValue>().ok())
                    .collect();
                cors.allow_origin(origins)
            }
        })
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "OK"
}

/// Serve the generated OpenAPI document.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi::ApiDoc::openapi())
}
