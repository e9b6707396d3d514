//! Inbound console commands and the decode boundary.
//!
//! Clients send JSON objects tagged with a `type` field. Each message is
//! decoded exactly once into a [`ConsoleCommand`]; nothing past this module
//! looks at raw string tags.

use crate::cue::{ChannelId, CueNumber, Level, ListId};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A single entry of a `set-levels` batch.
///
/// `value: None` clears the manual override for the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelChange {
    pub channel: ChannelId,
    pub value: Option<Level>,
}

/// Every operation a client can request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ConsoleCommand {
    /// Enumerate known lists.
    GetLists,
    /// Emit the current level snapshot of a list.
    GetLevels { list_id: ListId },
    /// Apply manual levels, then emit the snapshot.
    SetLevels {
        list_id: ListId,
        #[serde(deserialize_with = "lenient_level_changes")]
        values: Vec<LevelChange>,
    },
    /// Clear a channel's manual override.
    ResetChannel { list_id: ListId, channel: ChannelId },
    /// Mark a channel as tracking from earlier cues.
    TrackChannel { list_id: ListId, channel: ChannelId },
    /// Freeze a channel's value against tracking.
    BlockChannel { list_id: ListId, channel: ChannelId },
    /// Record the live state as a cue. `time` is the fade time in seconds.
    SaveCue {
        list_id: ListId,
        cue: CueNumber,
        time: f64,
    },
    /// Jump to a cue.
    RestoreCue { list_id: ListId, cue: CueNumber },
    /// Advance to the next cue.
    GoCue { list_id: ListId },
    /// Retreat to the previous cue.
    BackCue { list_id: ListId },
    /// Delete a cue.
    DeleteCue { list_id: ListId, cue: CueNumber },
    /// Enumerate the cues of a list.
    ListCues { list_id: ListId },
}

impl ConsoleCommand {
    /// Every message kind understood by the console.
    pub const KINDS: [&'static str; 12] = [
        "get-lists",
        "get-levels",
        "set-levels",
        "reset-channel",
        "track-channel",
        "block-channel",
        "save-cue",
        "restore-cue",
        "go-cue",
        "back-cue",
        "delete-cue",
        "list-cues",
    ];

    /// The wire name of this command.
    pub fn kind(&self) -> &'static str {
        match self {
            ConsoleCommand::GetLists => "get-lists",
            ConsoleCommand::GetLevels { .. } => "get-levels",
            ConsoleCommand::SetLevels { .. } => "set-levels",
            ConsoleCommand::ResetChannel { .. } => "reset-channel",
            ConsoleCommand::TrackChannel { .. } => "track-channel",
            ConsoleCommand::BlockChannel { .. } => "block-channel",
            ConsoleCommand::SaveCue { .. } => "save-cue",
            ConsoleCommand::RestoreCue { .. } => "restore-cue",
            ConsoleCommand::GoCue { .. } => "go-cue",
            ConsoleCommand::BackCue { .. } => "back-cue",
            ConsoleCommand::DeleteCue { .. } => "delete-cue",
            ConsoleCommand::ListCues { .. } => "list-cues",
        }
    }

    /// The list this command targets, if any.
    pub fn list_id(&self) -> Option<ListId> {
        match self {
            ConsoleCommand::GetLists => None,
            ConsoleCommand::GetLevels { list_id }
            | ConsoleCommand::SetLevels { list_id, .. }
            | ConsoleCommand::ResetChannel { list_id, .. }
            | ConsoleCommand::TrackChannel { list_id, .. }
            | ConsoleCommand::BlockChannel { list_id, .. }
            | ConsoleCommand::SaveCue { list_id, .. }
            | ConsoleCommand::RestoreCue { list_id, .. }
            | ConsoleCommand::GoCue { list_id }
            | ConsoleCommand::BackCue { list_id }
            | ConsoleCommand::DeleteCue { list_id, .. }
            | ConsoleCommand::ListCues { list_id } => Some(*list_id),
        }
    }
}

/// Errors raised while decoding an inbound message.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Not JSON, or a known kind with missing or ill-typed fields.
    #[error("malformed message: {0}")]
    Malformed(#[source] serde_json::Error),
    /// Valid JSON without a string `type` field.
    #[error("message has no type")]
    MissingKind,
    /// Valid JSON with a `type` the console does not understand.
    #[error("unknown message type: {0}")]
    UnknownKind(String),
}

/// Decode one inbound text message.
pub fn decode_command(text: &str) -> Result<ConsoleCommand, DecodeError> {
    let value: Value = serde_json::from_str(text).map_err(DecodeError::Malformed)?;
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingKind)?;

    if !ConsoleCommand::KINDS.contains(&kind) {
        return Err(DecodeError::UnknownKind(kind.to_string()));
    }

    serde_json::from_value(value).map_err(DecodeError::Malformed)
}

/// Decode `set-levels` entries one by one so that a bad entry never blocks
/// the rest of the batch. Channel 0 and non-numeric entries are skipped;
/// values are rounded and clamped into 0..=255.
fn lenient_level_changes<'de, D>(deserializer: D) -> Result<Vec<LevelChange>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Vec::<Value>::deserialize(deserializer)?;
    Ok(entries.iter().filter_map(parse_level_change).collect())
}

fn parse_level_change(entry: &Value) -> Option<LevelChange> {
    let channel = entry.get("channel")?.as_u64()?;
    let channel = ChannelId::try_from(channel).ok().filter(|c| *c > 0)?;

    let value = match entry.get("value") {
        None | Some(Value::Null) => None,
        Some(v) => {
            let raw = v.as_f64()?;
            Some(raw.round().clamp(0.0, f64::from(Level::MAX)) as Level)
        }
    };

    Some(LevelChange { channel, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_get_lists() {
        let cmd = decode_command(r#"{"type":"get-lists"}"#).unwrap();
        assert_eq!(cmd, ConsoleCommand::GetLists);
        assert_eq!(cmd.list_id(), None);
    }

    #[test]
    fn test_decode_save_cue() {
        let cmd = decode_command(r#"{"type":"save-cue","list_id":2,"cue":4.5,"time":3}"#).unwrap();
        assert_eq!(
            cmd,
            ConsoleCommand::SaveCue {
                list_id: 2,
                cue: CueNumber::new(4.5).unwrap(),
                time: 3.0,
            }
        );
        assert_eq!(cmd.kind(), "save-cue");
    }

    #[test]
    fn test_decode_set_levels_skips_bad_entries() {
        let text = r#"{"type":"set-levels","list_id":1,"values":[
            {"channel":1,"value":100},
            {"channel":"two","value":5},
            {"channel":0,"value":5},
            {"channel":3,"value":300},
            {"channel":4,"value":null}
        ]}"#;
        let cmd = decode_command(text).unwrap();
        let ConsoleCommand::SetLevels { list_id, values } = cmd else {
            panic!("expected set-levels");
        };
        assert_eq!(list_id, 1);
        assert_eq!(
            values,
            vec![
                LevelChange {
                    channel: 1,
                    value: Some(100)
                },
                LevelChange {
                    channel: 3,
                    value: Some(255)
                },
                LevelChange {
                    channel: 4,
                    value: None
                },
            ]
        );
    }

    #[test]
    fn test_decode_unknown_kind() {
        let err = decode_command(r#"{"type":"dance","list_id":1}"#).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownKind(kind) if kind == "dance"));
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(
            decode_command("{not json"),
            Err(DecodeError::Malformed(_))
        ));
        assert!(matches!(
            decode_command(r#"{"list_id":1}"#),
            Err(DecodeError::MissingKind)
        ));
        // Known kind, missing field
        assert!(matches!(
            decode_command(r#"{"type":"go-cue"}"#),
            Err(DecodeError::Malformed(_))
        ));
        // Negative cue numbers never reach the engine
        assert!(matches!(
            decode_command(r#"{"type":"restore-cue","list_id":1,"cue":-3}"#),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_kinds_match_variants() {
        for kind in ConsoleCommand::KINDS {
            assert!(
                ConsoleCommand::KINDS.iter().filter(|k| **k == kind).count() == 1,
                "duplicate kind {}",
                kind
            );
        }
        assert_eq!(ConsoleCommand::GoCue { list_id: 1 }.kind(), "go-cue");
    }
}
