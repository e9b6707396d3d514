//! OpenAPI documentation configuration.

use cuelight_types::api::{ErrorResponse, VersionResponse};
use cuelight_types::{
    CueInfo, CueNumber, CueSummary, CuesPayload, LevelEntry, LevelsPayload, ListSummary,
    ListsPayload, Status,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::lists::list_lists,
        crate::api::lists::get_levels,
        crate::api::lists::get_cues,
        crate::api::version::get_version,
        crate::api::websocket::websocket_handler,
    ),
    components(
        schemas(
            ListsPayload,
            ListSummary,
            LevelsPayload,
            LevelEntry,
            CueInfo,
            CuesPayload,
            CueSummary,
            CueNumber,
            Status,
            VersionResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "lists", description = "Cue list snapshots"),
        (name = "websocket", description = "Console control session"),
        (name = "System", description = "System information endpoints")
    ),
    info(
        title = "cuelight Lighting Console API",
        version = "0.3.0",
        description = "Cue playback with track/block semantics, driven over WebSocket",
        license(
            name = "MIT OR Apache-2.0"
        )
    )
)]
pub struct ApiDoc;
