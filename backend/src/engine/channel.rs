//! Per-channel live state of a cue list.

use cuelight_types::{ChannelId, Level, Status};
use std::collections::BTreeMap;

/// Operator marker applied by `track`/`block` and consumed by the next
/// record or fade start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Track,
    Block,
}

impl Mark {
    pub fn status(self) -> Status {
        match self {
            Mark::Track => Status::Tracked,
            Mark::Block => Status::Blocked,
        }
    }
}

/// State of one channel.
///
/// `level` and `status` cache the last resting resolution; they are shown
/// as-is only when the list has no reference cue to resolve against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelState {
    pub manual: Option<Level>,
    pub level: Level,
    pub status: Status,
    pub mark: Option<Mark>,
}

impl Default for ChannelState {
    fn default() -> Self {
        Self {
            manual: None,
            level: 0,
            status: Status::Manual,
            mark: None,
        }
    }
}

impl ChannelState {
    /// This state without a cached fade direction, so its status is
    /// re-derived from the history.
    pub fn undirected(&self) -> Self {
        Self {
            status: Status::Manual,
            ..*self
        }
    }
}

/// Channels known to a list, created lazily on first reference.
#[derive(Debug, Clone, Default)]
pub struct ChannelTable {
    channels: BTreeMap<ChannelId, ChannelState>,
}

impl ChannelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a channel's state, creating a default entry if needed.
    pub fn entry(&mut self, channel: ChannelId) -> &mut ChannelState {
        self.channels.entry(channel).or_default()
    }

    pub fn get(&self, channel: ChannelId) -> Option<&ChannelState> {
        self.channels.get(&channel)
    }

    /// State of a channel, or the defaults for a channel never referenced.
    pub fn state(&self, channel: ChannelId) -> ChannelState {
        self.channels.get(&channel).copied().unwrap_or_default()
    }

    pub fn contains(&self, channel: ChannelId) -> bool {
        self.channels.contains_key(&channel)
    }

    /// Known channel ids, ascending.
    pub fn ids(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.channels.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChannelId, &ChannelState)> {
        self.channels.iter().map(|(id, state)| (*id, state))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ChannelId, &mut ChannelState)> {
        self.channels.iter_mut().map(|(id, state)| (*id, state))
    }

    /// Drop every pending track/block mark.
    pub fn clear_marks(&mut self) {
        for state in self.channels.values_mut() {
            state.mark = None;
        }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_are_created_lazily() {
        let mut table = ChannelTable::new();
        assert!(table.is_empty());
        assert_eq!(table.state(12), ChannelState::default());
        assert!(!table.contains(12));

        table.entry(12).manual = Some(40);
        assert!(table.contains(12));
        assert_eq!(table.get(12).unwrap().manual, Some(40));
    }

    #[test]
    fn test_ids_are_ascending() {
        let mut table = ChannelTable::new();
        for channel in [700, 3, 41] {
            table.entry(channel);
        }
        assert_eq!(table.ids().collect::<Vec<_>>(), vec![3, 41, 700]);
    }

    #[test]
    fn test_clear_marks() {
        let mut table = ChannelTable::new();
        table.entry(1).mark = Some(Mark::Track);
        table.entry(2).mark = Some(Mark::Block);
        table.clear_marks();
        assert!(table.iter().all(|(_, state)| state.mark.is_none()));
        assert_eq!(Mark::Block.status(), Status::Blocked);
    }
}
