//! Cue playback engine.
//!
//! The engine is synchronous and single-threaded. Every mutating call
//! completes before returning, and time only moves when the owner calls
//! [`CueList::tick`] with the wall-clock time that actually elapsed.

pub mod channel;
pub mod cue_list;
pub mod cue_store;
pub mod error;
pub mod fade;
pub mod resolver;
pub mod view;

pub use channel::{ChannelState, ChannelTable, Mark};
pub use cue_list::{CueList, DEFAULT_LIST_NAME};
pub use cue_store::{Cue, CueStore, Neighbors, RecordedValue};
pub use error::{EngineError, Result};
pub use fade::{Fade, FadeEngine};
pub use resolver::{Provenance, Resolution};
pub use view::{ChannelLevel, LevelStatusView};
