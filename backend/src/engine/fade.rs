//! Time-based crossfade between two level snapshots.

use super::resolver::Resolution;
use cuelight_types::{ChannelId, CueNumber, Level};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

/// An in-flight fade toward a cue.
#[derive(Debug, Clone, PartialEq)]
pub struct Fade {
    target: CueNumber,
    from: BTreeMap<ChannelId, Level>,
    to: BTreeMap<ChannelId, Resolution>,
    /// Channels whose manual override was taken over by this fade.
    captured: BTreeSet<ChannelId>,
    elapsed: Duration,
    duration: Duration,
}

impl Fade {
    /// Build a fade. Channels missing from `from` start at 0.
    pub fn new(
        target: CueNumber,
        from: BTreeMap<ChannelId, Level>,
        to: BTreeMap<ChannelId, Resolution>,
        captured: BTreeSet<ChannelId>,
        duration: Duration,
    ) -> Self {
        Self {
            target,
            from,
            to,
            captured,
            elapsed: Duration::ZERO,
            duration,
        }
    }

    pub fn target(&self) -> CueNumber {
        self.target
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Fraction completed in 0.0..=1.0. A zero-length fade reports 0 until
    /// the tick that completes it.
    pub fn progress(&self) -> f64 {
        if self.duration.is_zero() {
            return 0.0;
        }
        (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    pub fn from_level(&self, channel: ChannelId) -> Level {
        self.from.get(&channel).copied().unwrap_or(0)
    }

    pub fn target_of(&self, channel: ChannelId) -> Option<&Resolution> {
        self.to.get(&channel)
    }

    /// Channels and their targets, ascending.
    pub fn targets(&self) -> impl Iterator<Item = (ChannelId, &Resolution)> {
        self.to.iter().map(|(channel, target)| (*channel, target))
    }

    pub fn is_captured(&self, channel: ChannelId) -> bool {
        self.captured.contains(&channel)
    }

    /// Interpolated level of a channel driven by this fade.
    pub fn level(&self, channel: ChannelId) -> Option<Level> {
        let to = self.to.get(&channel)?.value;
        Some(interpolate(self.from_level(channel), to, self.progress()))
    }

    fn is_complete(&self) -> bool {
        self.duration.is_zero() || self.elapsed >= self.duration
    }
}

/// Linear interpolation rounded to the nearest level.
pub fn interpolate(from: Level, to: Level, progress: f64) -> Level {
    let from = f64::from(from);
    let to = f64::from(to);
    let value = from + (to - from) * progress.clamp(0.0, 1.0);
    value.round().clamp(0.0, f64::from(Level::MAX)) as Level
}

/// Drives at most one fade at a time. Starting a new fade replaces the
/// running one.
#[derive(Debug, Clone, Default)]
pub struct FadeEngine {
    active: Option<Fade>,
}

impl FadeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, fade: Fade) {
        self.active = Some(fade);
    }

    pub fn is_fading(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&Fade> {
        self.active.as_ref()
    }

    pub fn progress(&self) -> Option<f64> {
        self.active.as_ref().map(Fade::progress)
    }

    /// Whether the running fade currently drives `channel`, given whether
    /// the channel holds a manual override.
    pub fn drives(&self, channel: ChannelId, has_override: bool) -> bool {
        self.active.as_ref().is_some_and(|fade| {
            fade.to.contains_key(&channel) && (!has_override || fade.is_captured(channel))
        })
    }

    /// Hand a captured channel back to its manual override.
    pub fn release(&mut self, channel: ChannelId) {
        if let Some(fade) = self.active.as_mut() {
            fade.captured.remove(&channel);
        }
    }

    /// Replace the target of a channel that is part of the running fade.
    pub fn retarget(&mut self, channel: ChannelId, target: Resolution) {
        if let Some(slot) = self
            .active
            .as_mut()
            .and_then(|fade| fade.to.get_mut(&channel))
        {
            *slot = target;
        }
    }

    /// Advance the running fade. Returns the fade once it has completed.
    pub fn tick(&mut self, delta: Duration) -> Option<Fade> {
        let fade = self.active.as_mut()?;
        fade.elapsed = (fade.elapsed + delta).min(fade.duration);

        if fade.is_complete() {
            self.active.take()
        } else {
            None
        }
    }
}
