//! Read-only projection of a list's live levels and statuses.

use super::channel::{ChannelState, ChannelTable};
use super::cue_store::CueStore;
use super::fade::FadeEngine;
use super::resolver::{self, Provenance, Resolution};
use cuelight_types::{ChannelId, CueNumber, Level, LevelEntry, Status};
use std::cmp::Ordering;

/// Live level and status of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelLevel {
    pub channel: ChannelId,
    pub level: Level,
    pub status: Status,
}

impl From<ChannelLevel> for LevelEntry {
    fn from(level: ChannelLevel) -> Self {
        LevelEntry {
            channel: level.channel,
            value: level.level,
            status: level.status,
        }
    }
}

/// Status implied by a fade moving a channel from `from` to `to`, if it
/// moves at all.
pub fn direction(from: Level, to: Level) -> Option<Status> {
    match to.cmp(&from) {
        Ordering::Greater => Some(Status::Raised),
        Ordering::Less => Some(Status::Lowered),
        Ordering::Equal => None,
    }
}

/// Computes what the operator sees, in priority order: a running fade, a
/// manual override, then the resting value resolved at the reference cue.
pub struct LevelStatusView<'a> {
    channels: &'a ChannelTable,
    cues: &'a CueStore,
    fade: &'a FadeEngine,
    reference: Option<CueNumber>,
}

impl<'a> LevelStatusView<'a> {
    pub fn new(
        channels: &'a ChannelTable,
        cues: &'a CueStore,
        fade: &'a FadeEngine,
        reference: Option<CueNumber>,
    ) -> Self {
        Self {
            channels,
            cues,
            fade,
            reference,
        }
    }

    /// Every known channel, ascending.
    pub fn levels(&self) -> Vec<ChannelLevel> {
        self.channels.ids().map(|c| self.channel(c)).collect()
    }

    pub fn channel(&self, channel: ChannelId) -> ChannelLevel {
        let state = self.channels.state(channel);

        let (level, status) = match self.fade.active() {
            Some(fade) if self.fade.drives(channel, state.manual.is_some()) => {
                let level = fade.level(channel).unwrap_or(0);
                let to = fade.target_of(channel).map_or(0, |t| t.value);
                let status = direction(fade.from_level(channel), to)
                    .unwrap_or_else(|| self.resting(channel, &state.undirected()).1);
                (level, status)
            }
            _ => match state.manual {
                Some(manual) => (manual, Status::Manual),
                None => self.resting(channel, &state),
            },
        };

        ChannelLevel {
            channel,
            level,
            status,
        }
    }

    /// Level and status a channel settles at when nothing overrides it.
    pub fn resting(&self, channel: ChannelId, state: &ChannelState) -> (Level, Status) {
        let Some(reference) = self.reference else {
            let status = state.mark.map_or(state.status, |mark| mark.status());
            return (state.level, status);
        };

        let resolution = resolver::resolve(self.cues, reference, channel);
        (
            resolution.value,
            self.classify(channel, state, &resolution, reference),
        )
    }

    /// Status of a resolved value as seen from `reference`.
    pub fn classify(
        &self,
        channel: ChannelId,
        state: &ChannelState,
        resolution: &Resolution,
        reference: CueNumber,
    ) -> Status {
        if let Some(mark) = state.mark {
            return mark.status();
        }
        // The direction of the fade that moved the channel here wins until
        // the history is edited
        if matches!(state.status, Status::Raised | Status::Lowered) {
            return state.status;
        }

        match resolution.provenance {
            Provenance::Unset => Status::Manual,
            _ if resolution.source.is_some_and(|source| source < reference) => Status::Tracked,
            Provenance::Blocked => Status::Blocked,
            Provenance::Recorded => {
                let previous = self
                    .cues
                    .previous_before(reference)
                    .map_or(0, |p| resolver::resolve(self.cues, p, channel).value);
                if resolution.value >= previous {
                    Status::Raised
                } else {
                    Status::Lowered
                }
            }
        }
    }
}
