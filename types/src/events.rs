//! Outbound payloads pushed to every connected client.

use crate::api::ErrorResponse;
use crate::cue::{ChannelId, CueNumber, Level, ListId, Status};
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// One channel in a levels snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct LevelEntry {
    pub channel: ChannelId,
    pub value: Level,
    pub status: Status,
}

/// Playback position of a list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CueInfo {
    /// Cue the list is sitting at or fading into
    pub current: Option<CueNumber>,
    /// Fade time of the current cue in seconds (0 without a current cue)
    pub fade_time: f64,
    /// Fade progress in 0.0..=1.0; 1.0 when no fade is running
    pub fade_progress: f64,
    /// Whether a fade is in flight
    pub fading: bool,
    /// Highest-numbered cue in the list
    pub last: Option<CueNumber>,
    /// Cue a `go` would move to
    pub next: Option<CueNumber>,
    /// Cue a `back` would move to
    pub previous: Option<CueNumber>,
}

/// Snapshot of every known channel of a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct LevelsPayload {
    pub list: ListId,
    pub cue: CueInfo,
    pub values: Vec<LevelEntry>,
}

/// A cue as listed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CueSummary {
    pub number: CueNumber,
    /// Fade time in seconds
    pub time: f64,
}

/// Ordered cue listing of a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CuesPayload {
    pub list: ListId,
    /// Current cue of the list
    pub cue: Option<CueNumber>,
    pub cues: Vec<CueSummary>,
}

/// A known cue list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ListSummary {
    pub number: ListId,
    pub name: String,
}

/// Every known cue list, ascending by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ListsPayload {
    pub lists: Vec<ListSummary>,
}

/// Event types that can be broadcast to all connected clients.
///
/// The `type` tag mirrors the inbound command that usually triggers it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ConsoleEvent {
    GetLevels(LevelsPayload),
    ListCues(CuesPayload),
    GetLists(ListsPayload),
    /// A command was rejected. Sent only to the session that issued it.
    Error(ErrorResponse),
}

impl ConsoleEvent {
    /// Get a short description of the event for logging.
    pub fn description(&self) -> String {
        match self {
            ConsoleEvent::GetLevels(levels) => format!(
                "levels for list {} ({} channels)",
                levels.list,
                levels.values.len()
            ),
            ConsoleEvent::ListCues(cues) => {
                format!("cues for list {} ({} cues)", cues.list, cues.cues.len())
            }
            ConsoleEvent::GetLists(lists) => format!("{} lists", lists.lists.len()),
            ConsoleEvent::Error(e) => format!("error: {}", e.error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_levels_payload_shape() {
        let event = ConsoleEvent::GetLevels(LevelsPayload {
            list: 1,
            cue: CueInfo {
                current: Some(CueNumber::from(2)),
                fade_time: 1.5,
                fade_progress: 1.0,
                fading: false,
                last: Some(CueNumber::from(3)),
                next: Some(CueNumber::from(3)),
                previous: None,
            },
            values: vec![LevelEntry {
                channel: 5,
                value: 100,
                status: Status::Raised,
            }],
        });

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "get-levels",
                "list": 1,
                "cue": {
                    "current": 2.0,
                    "fade_time": 1.5,
                    "fade_progress": 1.0,
                    "fading": false,
                    "last": 3.0,
                    "next": 3.0,
                    "previous": null
                },
                "values": [{"channel": 5, "value": 100, "status": "raised"}]
            })
        );
    }

    #[test]
    fn test_lists_payload_tag() {
        let event = ConsoleEvent::GetLists(ListsPayload {
            lists: vec![ListSummary {
                number: 4,
                name: "untitled".to_string(),
            }],
        });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "get-lists");
        assert_eq!(value["lists"][0]["name"], "untitled");
        assert_eq!(event.description(), "1 lists");
    }

    #[test]
    fn test_error_payload_shape() {
        let event = ConsoleEvent::Error(ErrorResponse::with_details(
            "Rejected save-cue",
            "invalid fade time",
        ));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "error",
                "error": "Rejected save-cue",
                "details": "invalid fade time"
            })
        );
    }
}
