//! Read-only REST snapshots of the cue lists.
//!
//! These go through the engine like WebSocket commands do, but the
//! payloads are returned to the caller instead of being broadcast.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use cuelight_types::{
    api::ErrorResponse, ConsoleCommand, ConsoleEvent, CuesPayload, LevelsPayload, ListId,
    ListsPayload,
};
use tracing::error;

use crate::state::AppState;

type ApiError = (StatusCode, Json<ErrorResponse>);

async fn query(state: &AppState, command: ConsoleCommand) -> Result<Vec<ConsoleEvent>, ApiError> {
    state.engine().query(command).await.map_err(|e| {
        error!("Engine query failed: {}", e);
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::with_details("Engine unavailable", e.to_string())),
        )
    })
}

fn missing_payload() -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Engine returned no payload")),
    )
}

/// List all cue lists.
#[utoipa::path(
    get,
    path = "/api/lists",
    tag = "lists",
    responses(
        (status = 200, description = "Known cue lists", body = ListsPayload),
        (status = 503, description = "Engine not running", body = ErrorResponse)
    )
)]
pub async fn list_lists(State(state): State<AppState>) -> Result<Json<ListsPayload>, ApiError> {
    query(&state, ConsoleCommand::GetLists)
        .await?
        .into_iter()
        .find_map(|event| match event {
            ConsoleEvent::GetLists(lists) => Some(Json(lists)),
            _ => None,
        })
        .ok_or_else(missing_payload)
}

/// Get the live levels of a cue list.
///
/// An unknown id creates an empty list.
#[utoipa::path(
    get,
    path = "/api/lists/{id}/levels",
    tag = "lists",
    params(
        ("id" = u32, Path, description = "Cue list number")
    ),
    responses(
        (status = 200, description = "Levels snapshot", body = LevelsPayload),
        (status = 503, description = "Engine not running", body = ErrorResponse)
    )
)]
pub async fn get_levels(
    State(state): State<AppState>,
    Path(list_id): Path<ListId>,
) -> Result<Json<LevelsPayload>, ApiError> {
    query(&state, ConsoleCommand::GetLevels { list_id })
        .await?
        .into_iter()
        .find_map(|event| match event {
            ConsoleEvent::GetLevels(levels) => Some(Json(levels)),
            _ => None,
        })
        .ok_or_else(missing_payload)
}

/// Get the cues of a cue list.
///
/// An unknown id creates an empty list.
#[utoipa::path(
    get,
    path = "/api/lists/{id}/cues",
    tag = "lists",
    params(
        ("id" = u32, Path, description = "Cue list number")
    ),
    responses(
        (status = 200, description = "Cue listing", body = CuesPayload),
        (status = 503, description = "Engine not running", body = ErrorResponse)
    )
)]
pub async fn get_cues(
    State(state): State<AppState>,
    Path(list_id): Path<ListId>,
) -> Result<Json<CuesPayload>, ApiError> {
    query(&state, ConsoleCommand::ListCues { list_id })
        .await?
        .into_iter()
        .find_map(|event| match event {
            ConsoleEvent::ListCues(cues) => Some(Json(cues)),
            _ => None,
        })
        .ok_or_else(missing_payload)
}
