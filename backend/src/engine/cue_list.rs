//! A cue list: sparse history, live channel state and playback position.

use super::channel::{ChannelState, ChannelTable, Mark};
use super::cue_store::{Cue, CueStore, RecordedValue};
use super::error::{EngineError, Result};
use super::fade::{Fade, FadeEngine};
use super::resolver::{self, Resolution};
use super::view::{direction, ChannelLevel, LevelStatusView};
use cuelight_types::{ChannelId, CueNumber, Level, ListId, Status};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tracing::{debug, info};

/// Name given to lists created implicitly by a command.
pub const DEFAULT_LIST_NAME: &str = "untitled";

/// One independently played cue list.
#[derive(Debug, Clone)]
pub struct CueList {
    id: ListId,
    name: String,
    cues: CueStore,
    channels: ChannelTable,
    fade: FadeEngine,
    /// Cue the list sits at or is fading into.
    current: Option<CueNumber>,
    /// Cue targeted by `track`/`block`: the last one recorded or faded to.
    anchor: Option<CueNumber>,
}

impl CueList {
    pub fn new(id: ListId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            cues: CueStore::new(),
            channels: ChannelTable::new(),
            fade: FadeEngine::new(),
            current: None,
            anchor: None,
        }
    }

    pub fn id(&self) -> ListId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cues(&self) -> &CueStore {
        &self.cues
    }

    pub fn channels(&self) -> &ChannelTable {
        &self.channels
    }

    pub fn current_cue(&self) -> Option<CueNumber> {
        self.current
    }

    pub fn anchor(&self) -> Option<CueNumber> {
        self.anchor
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_fading()
    }

    /// Progress of the running fade, 1.0 when idle.
    pub fn fade_progress(&self) -> f64 {
        self.fade.progress().unwrap_or(1.0)
    }

    /// Fade time of the current cue, zero without one.
    pub fn fade_time(&self) -> Duration {
        self.current
            .and_then(|n| self.cues.get(n))
            .map_or(Duration::ZERO, Cue::fade_time)
    }

    /// Cue a `go` would move to.
    pub fn next_cue(&self) -> Option<CueNumber> {
        match self.current {
            Some(current) => self.cues.next_after(current),
            None => self.cues.first(),
        }
    }

    /// Cue a `back` would move to.
    pub fn previous_cue(&self) -> Option<CueNumber> {
        self.current.and_then(|n| self.cues.previous_before(n))
    }

    pub fn last_cue(&self) -> Option<CueNumber> {
        self.cues.last()
    }

    /// Cue resting levels are resolved against.
    fn reference(&self) -> Option<CueNumber> {
        self.current.or(self.anchor)
    }

    pub fn view(&self) -> LevelStatusView<'_> {
        LevelStatusView::new(&self.channels, &self.cues, &self.fade, self.reference())
    }

    pub fn levels(&self) -> Vec<ChannelLevel> {
        self.view().levels()
    }

    pub fn level(&self, channel: ChannelId) -> ChannelLevel {
        self.view().channel(channel)
    }

    pub fn resolve(&self, at: CueNumber, channel: ChannelId) -> Resolution {
        resolver::resolve(&self.cues, at, channel)
    }

    /// Set or clear a manual override. Channel 0 is ignored.
    pub fn set_level(&mut self, channel: ChannelId, value: Option<Level>) {
        if channel == 0 {
            return;
        }
        let state = self.channels.entry(channel);
        state.manual = value;
        state.mark = None;
        if value.is_some() {
            self.fade.release(channel);
        }
    }

    /// Drop a channel's override and mark so it follows the cue again.
    pub fn reset_channel(&mut self, channel: ChannelId) {
        if channel == 0 {
            return;
        }
        self.set_level(channel, None);
    }

    /// Make a channel inherit its value from cues before the anchor.
    pub fn track(&mut self, channel: ChannelId) {
        if channel == 0 {
            return;
        }
        let state = self.channels.entry(channel);
        state.manual = None;
        state.mark = Some(Mark::Track);

        if let Some(anchor) = self.anchor {
            resolver::track(&mut self.cues, anchor, channel);
        }
        self.retarget_fade();
        self.settle();
        debug!(list = self.id, channel, anchor = ?self.anchor, "Tracked channel");
    }

    /// Freeze a channel's value in the anchor cue.
    pub fn block(&mut self, channel: ChannelId) {
        if channel == 0 {
            return;
        }
        self.channels.entry(channel).mark = Some(Mark::Block);

        if let Some(anchor) = self.anchor {
            resolver::block(&mut self.cues, anchor, channel);
        }
        self.retarget_fade();
        self.settle();
        debug!(list = self.id, channel, anchor = ?self.anchor, "Blocked channel");
    }

    /// Record the live state as cue `number`, replacing any cue already
    /// stored there. Tracked channels are left out so they keep tracking;
    /// track and block flags of the replaced entries are kept.
    pub fn record(&mut self, number: CueNumber, fade_secs: f64) -> Result<()> {
        let fade_time = Duration::try_from_secs_f64(fade_secs).map_err(|e| {
            EngineError::InvalidArgument(format!("invalid fade time {}: {}", fade_secs, e))
        })?;

        let mut cue = Cue::new(number, fade_time);
        let previous = self.cues.get(number);
        let view = self.view();
        for (channel, state) in self.channels.iter() {
            let live = view.channel(channel);
            if live.status == Status::Tracked {
                continue;
            }
            let kept = previous.and_then(|p| p.get(channel));
            cue.insert(
                channel,
                RecordedValue {
                    value: live.level,
                    track: kept.is_some_and(|v| v.track),
                    block: kept.is_some_and(|v| v.block)
                        || live.status == Status::Blocked
                        || state.mark == Some(Mark::Block),
                },
            );
        }

        let recorded = cue.len();
        let replaced = self.cues.insert(cue).is_some();
        self.anchor = Some(number);
        self.channels.clear_marks();
        self.retarget_fade();
        self.settle();

        info!(
            list = self.id,
            cue = %number,
            channels = recorded,
            fade_secs,
            replaced,
            "Recorded cue"
        );
        Ok(())
    }

    /// Delete a cue. Returns false if it did not exist.
    pub fn delete(&mut self, number: CueNumber) -> bool {
        if self.cues.remove(number).is_none() {
            return false;
        }
        if self.current == Some(number) {
            self.current = None;
        }
        if self.anchor == Some(number) {
            self.anchor = None;
        }
        self.retarget_fade();
        self.settle();
        info!(list = self.id, cue = %number, "Deleted cue");
        true
    }

    /// Fade to the next cue, or the first one when none is current.
    pub fn advance(&mut self) -> bool {
        match self.next_cue() {
            Some(target) => {
                self.start_fade(target);
                true
            }
            None => false,
        }
    }

    /// Fade back to the previous cue using its own fade time.
    pub fn retreat(&mut self) -> bool {
        match self.previous_cue() {
            Some(target) => {
                self.start_fade(target);
                true
            }
            None => false,
        }
    }

    /// Fade to a specific cue. Unknown cues are ignored.
    pub fn jump(&mut self, number: CueNumber) -> bool {
        if !self.cues.contains(number) {
            debug!(list = self.id, cue = %number, "Jump to unknown cue ignored");
            return false;
        }
        self.start_fade(number);
        true
    }

    /// Advance the running fade. Returns whether one was running.
    pub fn tick(&mut self, delta: Duration) -> bool {
        if !self.fade.is_fading() {
            return false;
        }
        if let Some(done) = self.fade.tick(delta) {
            self.complete_fade(done);
        }
        true
    }

    fn start_fade(&mut self, target: CueNumber) {
        let duration = self.fade_time_of(target);
        let mut from = BTreeMap::new();
        let mut to = BTreeMap::new();
        let mut captured = BTreeSet::new();

        let view = self.view();
        for (channel, state) in self.channels.iter() {
            let resolution = resolver::resolve(&self.cues, target, channel);
            if state.manual.is_some() {
                if !resolution.is_cue_sourced() {
                    // Nothing in the history to fade to; the override stays
                    continue;
                }
                captured.insert(channel);
            }
            from.insert(channel, view.channel(channel).level);
            to.insert(channel, resolution);
        }

        self.channels.clear_marks();
        self.current = Some(target);
        self.anchor = Some(target);
        info!(
            list = self.id,
            cue = %target,
            fade_secs = duration.as_secs_f64(),
            channels = to.len(),
            "Starting fade"
        );
        self.fade.start(Fade::new(target, from, to, captured, duration));
    }

    fn fade_time_of(&self, number: CueNumber) -> Duration {
        self.cues.get(number).map_or(Duration::ZERO, Cue::fade_time)
    }

    fn complete_fade(&mut self, done: Fade) {
        let reference = Some(done.target());
        let view = LevelStatusView::new(&self.channels, &self.cues, &self.fade, reference);
        let settled: Vec<_> = done
            .targets()
            .map(|(channel, target)| {
                let state = self.channels.state(channel);
                let status = direction(done.from_level(channel), target.value).unwrap_or_else(|| {
                    view.classify(channel, &state.undirected(), target, done.target())
                });
                (channel, *target, status)
            })
            .collect();

        for (channel, target, status) in settled {
            let state = self.channels.entry(channel);
            state.level = target.value;
            state.status = status;
            if target.is_cue_sourced() {
                state.manual = None;
            }
        }
        debug!(list = self.id, cue = %done.target(), "Fade complete");
    }

    /// Point the running fade at the current history of its target cue.
    fn retarget_fade(&mut self) {
        let Some(fade) = self.fade.active() else {
            return;
        };
        let target = fade.target();
        if !self.cues.contains(target) {
            return;
        }
        let updates: Vec<_> = fade
            .targets()
            .map(|(channel, _)| (channel, resolver::resolve(&self.cues, target, channel)))
            .collect();
        for (channel, resolution) in updates {
            self.fade.retarget(channel, resolution);
        }
    }

    /// Refresh the resting cache after the history changed. Statuses are
    /// re-derived from the history alone, dropping any fade direction.
    fn settle(&mut self) {
        let Some(reference) = self.reference() else {
            return;
        };
        let view = self.view();
        let resting: Vec<_> = self
            .channels
            .iter()
            .map(|(channel, state)| {
                let resolution = resolver::resolve(&self.cues, reference, channel);
                let unmarked = ChannelState {
                    mark: None,
                    ..state.undirected()
                };
                let status = view.classify(channel, &unmarked, &resolution, reference);
                (channel, resolution.value, status)
            })
            .collect();

        for (channel, level, status) in resting {
            let state = self.channels.entry(channel);
            state.level = level;
            state.status = status;
        }
    }
}
