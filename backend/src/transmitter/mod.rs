//! Output of resolved levels to a lighting network.

pub mod artnet;

pub use artnet::{ArtDmxPacket, ArtNetError, ArtNetTransmitter};

use cuelight_types::{ChannelId, Level};
use std::time::Duration;

/// Dense array of output intensities. Channel `c` occupies slot `c - 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Universe {
    slots: Vec<Level>,
}

impl Universe {
    /// Create a dark universe of `size` slots.
    pub fn new(size: usize) -> Self {
        Self {
            slots: vec![0; size],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Set a channel. Channels outside the universe are ignored.
    pub fn set(&mut self, channel: ChannelId, level: Level) {
        if let Some(slot) = self.slot_mut(channel) {
            *slot = level;
        }
    }

    /// Keep the higher of the current and the given level.
    pub fn merge_htp(&mut self, channel: ChannelId, level: Level) {
        if let Some(slot) = self.slot_mut(channel) {
            *slot = (*slot).max(level);
        }
    }

    pub fn get(&self, channel: ChannelId) -> Option<Level> {
        let index = usize::try_from(channel).ok()?.checked_sub(1)?;
        self.slots.get(index).copied()
    }

    pub fn as_slice(&self) -> &[Level] {
        &self.slots
    }

    fn slot_mut(&mut self, channel: ChannelId) -> Option<&mut Level> {
        let index = usize::try_from(channel).ok()?.checked_sub(1)?;
        self.slots.get_mut(index)
    }
}

/// Sink for universe snapshots.
///
/// Implementations must not block: they are driven from the engine task
/// and their failures never reach engine state. The task is spawned on the
/// tokio runtime, so they must be `Send + Sync`.
pub trait Transmitter: Send + Sync {
    /// A freshly resolved snapshot is available.
    fn update(&mut self, universe: &Universe);

    /// Called every scheduler iteration with the time since the last call,
    /// so the transmitter can keep its own refresh cadence.
    fn tick(&mut self, elapsed: Duration);
}

/// Transmitter that discards everything. Used when output is disabled.
#[derive(Debug, Default)]
pub struct NullTransmitter;

impl Transmitter for NullTransmitter {
    fn update(&mut self, _universe: &Universe) {}

    fn tick(&mut self, _elapsed: Duration) {}
}
