//! Track/block resolution over the sparse cue history.
//!
//! A channel's value at cue `q` is taken from the highest cue at or below
//! `q` that records it. A blocked entry ends the walk the same way but is
//! reported with [`Provenance::Blocked`].

use super::cue_store::{CueStore, RecordedValue};
use cuelight_types::{ChannelId, CueNumber, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Recorded,
    Blocked,
    /// No cue at or below the queried one records the channel.
    Unset,
}

/// Result of resolving one channel at one cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub value: Level,
    pub provenance: Provenance,
    /// Cue the value was found in.
    pub source: Option<CueNumber>,
}

impl Resolution {
    pub fn unset() -> Self {
        Self {
            value: 0,
            provenance: Provenance::Unset,
            source: None,
        }
    }

    /// Whether the value comes from the cue history rather than defaults.
    pub fn is_cue_sourced(&self) -> bool {
        self.provenance != Provenance::Unset
    }
}

/// Resolve `channel` at cue `at`.
pub fn resolve(store: &CueStore, at: CueNumber, channel: ChannelId) -> Resolution {
    store
        .descending_from(at)
        .find_map(|cue| {
            cue.get(channel).map(|entry| Resolution {
                value: entry.value,
                provenance: if entry.block {
                    Provenance::Blocked
                } else {
                    Provenance::Recorded
                },
                source: Some(cue.number()),
            })
        })
        .unwrap_or_else(Resolution::unset)
}

/// Make `channel` track into `anchor` from earlier history.
///
/// The explicit entry in `anchor` is dropped and the nearest earlier entry
/// is flagged as the tracking source. Returns false if `anchor` is not a
/// stored cue.
pub fn track(store: &mut CueStore, anchor: CueNumber, channel: ChannelId) -> bool {
    let Some(cue) = store.get_mut(anchor) else {
        return false;
    };
    cue.remove(channel);

    if let Some(entry) = store
        .descending_before(anchor)
        .find_map(|cue| cue.get_mut(channel))
    {
        entry.track = true;
    }
    true
}

/// Freeze `channel` at its resolved value in `anchor`.
///
/// A channel that was tracking through `anchor` gets an explicit blocked
/// entry carrying the value it resolved to. Returns false if `anchor` is
/// not a stored cue.
pub fn block(store: &mut CueStore, anchor: CueNumber, channel: ChannelId) -> bool {
    let resolved = resolve(store, anchor, channel);
    let Some(cue) = store.get_mut(anchor) else {
        return false;
    };

    match cue.get_mut(channel) {
        Some(entry) => entry.block = true,
        None => cue.insert(channel, RecordedValue::blocked(resolved.value)),
    }
    true
}
