//! Sparse cue history.
//!
//! A cue stores only the channels whose value was explicitly recorded in
//! it. Anything absent is inherited from earlier cues through the resolver.

use cuelight_types::{ChannelId, CueNumber, Level};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::time::Duration;

/// A value recorded for one channel in one cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedValue {
    pub value: Level,
    /// A later cue had this channel tracked back onto this entry.
    pub track: bool,
    /// Resolution stops here and reports the channel as blocked.
    pub block: bool,
}

impl RecordedValue {
    pub fn new(value: Level) -> Self {
        Self {
            value,
            track: false,
            block: false,
        }
    }

    pub fn blocked(value: Level) -> Self {
        Self {
            block: true,
            ..Self::new(value)
        }
    }
}

/// One recorded cue.
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    number: CueNumber,
    fade_time: Duration,
    recorded: BTreeMap<ChannelId, RecordedValue>,
}

impl Cue {
    pub fn new(number: CueNumber, fade_time: Duration) -> Self {
        Self {
            number,
            fade_time,
            recorded: BTreeMap::new(),
        }
    }

    pub fn number(&self) -> CueNumber {
        self.number
    }

    pub fn fade_time(&self) -> Duration {
        self.fade_time
    }

    pub fn get(&self, channel: ChannelId) -> Option<&RecordedValue> {
        self.recorded.get(&channel)
    }

    pub fn get_mut(&mut self, channel: ChannelId) -> Option<&mut RecordedValue> {
        self.recorded.get_mut(&channel)
    }

    pub fn insert(&mut self, channel: ChannelId, value: RecordedValue) {
        self.recorded.insert(channel, value);
    }

    pub fn remove(&mut self, channel: ChannelId) -> Option<RecordedValue> {
        self.recorded.remove(&channel)
    }

    pub fn recorded(&self) -> impl Iterator<Item = (ChannelId, &RecordedValue)> {
        self.recorded.iter().map(|(channel, value)| (*channel, value))
    }

    pub fn len(&self) -> usize {
        self.recorded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recorded.is_empty()
    }
}

/// The cues immediately around a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Neighbors {
    pub previous: Option<CueNumber>,
    pub next: Option<CueNumber>,
}

/// Ordered collection of cues keyed by number.
#[derive(Debug, Clone, Default)]
pub struct CueStore {
    cues: BTreeMap<CueNumber, Cue>,
}

impl CueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a cue, returning the one it replaced.
    pub fn insert(&mut self, cue: Cue) -> Option<Cue> {
        self.cues.insert(cue.number(), cue)
    }

    pub fn remove(&mut self, number: CueNumber) -> Option<Cue> {
        self.cues.remove(&number)
    }

    pub fn get(&self, number: CueNumber) -> Option<&Cue> {
        self.cues.get(&number)
    }

    pub fn get_mut(&mut self, number: CueNumber) -> Option<&mut Cue> {
        self.cues.get_mut(&number)
    }

    pub fn contains(&self, number: CueNumber) -> bool {
        self.cues.contains_key(&number)
    }

    pub fn first(&self) -> Option<CueNumber> {
        self.cues.keys().next().copied()
    }

    pub fn last(&self) -> Option<CueNumber> {
        self.cues.keys().next_back().copied()
    }

    /// Lowest cue strictly after `number`.
    pub fn next_after(&self, number: CueNumber) -> Option<CueNumber> {
        self.cues
            .range((Bound::Excluded(number), Bound::Unbounded))
            .next()
            .map(|(n, _)| *n)
    }

    /// Highest cue strictly before `number`.
    pub fn previous_before(&self, number: CueNumber) -> Option<CueNumber> {
        self.cues.range(..number).next_back().map(|(n, _)| *n)
    }

    pub fn neighbors(&self, number: CueNumber) -> Neighbors {
        Neighbors {
            previous: self.previous_before(number),
            next: self.next_after(number),
        }
    }

    /// Cues at or before `number`, highest first.
    pub fn descending_from(&self, number: CueNumber) -> impl Iterator<Item = &Cue> {
        self.cues.range(..=number).rev().map(|(_, cue)| cue)
    }

    /// Cues strictly before `number`, highest first.
    pub fn descending_before(&mut self, number: CueNumber) -> impl Iterator<Item = &mut Cue> {
        self.cues.range_mut(..number).rev().map(|(_, cue)| cue)
    }

    /// Every cue in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &Cue> {
        self.cues.values()
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}
