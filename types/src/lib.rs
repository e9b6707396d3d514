//! Shared types for the cuelight lighting console.
//!
//! This crate contains the wire vocabulary spoken between the console
//! engine and its clients: identifiers, inbound commands, and outbound
//! level/cue/list payloads.

/// Default port for the cuelight backend server.
pub const DEFAULT_PORT: u16 = 8080;

/// Default number of slots in a transmitted universe.
pub const DEFAULT_UNIVERSE_SIZE: usize = 512;

pub mod api;
pub mod command;
pub mod cue;
pub mod events;

// Re-export commonly used types
pub use command::{decode_command, ConsoleCommand, DecodeError, LevelChange};
pub use cue::{ChannelId, CueNumber, InvalidCueNumber, Level, ListId, Status};
pub use events::{
    ConsoleEvent, CueInfo, CueSummary, CuesPayload, LevelEntry, LevelsPayload, ListSummary,
    ListsPayload,
};
