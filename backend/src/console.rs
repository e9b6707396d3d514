//! The console: every cue list plus the output they drive.
//!
//! [`Console`] owns the list registry and applies decoded commands to it.
//! It is not shared; the scheduler task is its only caller.

use crate::engine::{CueList, EngineError, DEFAULT_LIST_NAME};
use crate::transmitter::{Transmitter, Universe};
use cuelight_types::{
    ConsoleCommand, ConsoleEvent, CueInfo, CueSummary, CuesPayload, LevelEntry, LevelsPayload,
    ListId, ListSummary, ListsPayload,
};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Cue lists keyed by id.
///
/// Lists are created on first reference and never removed.
#[derive(Debug, Default)]
pub struct ListRegistry {
    lists: BTreeMap<ListId, CueList>,
}

impl ListRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a list, creating an empty one if the id is new.
    pub fn get_or_create(&mut self, id: ListId) -> &mut CueList {
        self.lists.entry(id).or_insert_with(|| {
            info!(list = id, "Created cue list");
            CueList::new(id, DEFAULT_LIST_NAME)
        })
    }

    pub fn get(&self, id: ListId) -> Option<&CueList> {
        self.lists.get(&id)
    }

    /// Lists in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &CueList> {
        self.lists.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut CueList> {
        self.lists.values_mut()
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}

/// Build the levels payload of a list.
pub fn levels_payload(list: &CueList) -> LevelsPayload {
    LevelsPayload {
        list: list.id(),
        cue: CueInfo {
            current: list.current_cue(),
            fade_time: list.fade_time().as_secs_f64(),
            fade_progress: list.fade_progress(),
            fading: list.is_fading(),
            last: list.last_cue(),
            next: list.next_cue(),
            previous: list.previous_cue(),
        },
        values: list.levels().into_iter().map(LevelEntry::from).collect(),
    }
}

/// Build the cue listing of a list.
pub fn cues_payload(list: &CueList) -> CuesPayload {
    CuesPayload {
        list: list.id(),
        cue: list.current_cue(),
        cues: list
            .cues()
            .iter()
            .map(|cue| CueSummary {
                number: cue.number(),
                time: cue.fade_time().as_secs_f64(),
            })
            .collect(),
    }
}

/// Lighting console state.
pub struct Console {
    lists: ListRegistry,
    universe_size: usize,
    transmitter: Box<dyn Transmitter>,
}

impl Console {
    pub fn new(universe_size: usize, transmitter: Box<dyn Transmitter>) -> Self {
        Self {
            lists: ListRegistry::new(),
            universe_size,
            transmitter,
        }
    }

    pub fn lists(&self) -> &ListRegistry {
        &self.lists
    }

    pub fn list(&self, id: ListId) -> Option<&CueList> {
        self.lists.get(id)
    }

    /// Apply one command and return the payloads it produces.
    ///
    /// Only a rejected `save-cue` fails; the list state is then unchanged.
    pub fn apply(&mut self, command: ConsoleCommand) -> Result<Vec<ConsoleEvent>, EngineError> {
        debug!(kind = command.kind(), list = ?command.list_id(), "Applying command");

        let events = match command {
            ConsoleCommand::GetLists => vec![ConsoleEvent::GetLists(self.lists_payload())],
            ConsoleCommand::GetLevels { list_id } => {
                let list = self.lists.get_or_create(list_id);
                vec![ConsoleEvent::GetLevels(levels_payload(list))]
            }
            ConsoleCommand::SetLevels { list_id, values } => {
                let list = self.lists.get_or_create(list_id);
                for change in values {
                    list.set_level(change.channel, change.value);
                }
                vec![ConsoleEvent::GetLevels(levels_payload(list))]
            }
            ConsoleCommand::ResetChannel { list_id, channel } => {
                let list = self.lists.get_or_create(list_id);
                list.reset_channel(channel);
                vec![ConsoleEvent::GetLevels(levels_payload(list))]
            }
            ConsoleCommand::TrackChannel { list_id, channel } => {
                let list = self.lists.get_or_create(list_id);
                list.track(channel);
                vec![ConsoleEvent::GetLevels(levels_payload(list))]
            }
            ConsoleCommand::BlockChannel { list_id, channel } => {
                let list = self.lists.get_or_create(list_id);
                list.block(channel);
                vec![ConsoleEvent::GetLevels(levels_payload(list))]
            }
            ConsoleCommand::SaveCue { list_id, cue, time } => {
                let list = self.lists.get_or_create(list_id);
                if let Err(e) = list.record(cue, time) {
                    warn!(list = list_id, cue = %cue, "Rejected save-cue: {}", e);
                    return Err(e);
                }
                vec![
                    ConsoleEvent::GetLevels(levels_payload(list)),
                    ConsoleEvent::ListCues(cues_payload(list)),
                ]
            }
            ConsoleCommand::RestoreCue { list_id, cue } => {
                let list = self.lists.get_or_create(list_id);
                list.jump(cue);
                vec![ConsoleEvent::GetLevels(levels_payload(list))]
            }
            ConsoleCommand::GoCue { list_id } => {
                let list = self.lists.get_or_create(list_id);
                if !list.advance() {
                    debug!(list = list_id, "No next cue");
                }
                vec![ConsoleEvent::GetLevels(levels_payload(list))]
            }
            ConsoleCommand::BackCue { list_id } => {
                let list = self.lists.get_or_create(list_id);
                if !list.retreat() {
                    debug!(list = list_id, "No previous cue");
                }
                vec![ConsoleEvent::GetLevels(levels_payload(list))]
            }
            ConsoleCommand::DeleteCue { list_id, cue } => {
                let list = self.lists.get_or_create(list_id);
                if !list.delete(cue) {
                    debug!(list = list_id, cue = %cue, "Delete of unknown cue ignored");
                }
                vec![
                    ConsoleEvent::GetLevels(levels_payload(list)),
                    ConsoleEvent::ListCues(cues_payload(list)),
                ]
            }
            ConsoleCommand::ListCues { list_id } => {
                let list = self.lists.get_or_create(list_id);
                vec![ConsoleEvent::ListCues(cues_payload(list))]
            }
        };

        if events
            .iter()
            .any(|event| matches!(event, ConsoleEvent::GetLevels(_)))
        {
            self.push_universe();
        }
        Ok(events)
    }

    /// Advance every fading list by `elapsed` and refresh the output.
    ///
    /// Returns a levels payload for each list that was fading.
    pub fn tick(&mut self, elapsed: Duration) -> Vec<ConsoleEvent> {
        let mut events = Vec::new();
        for list in self.lists.iter_mut() {
            if list.tick(elapsed) {
                events.push(ConsoleEvent::GetLevels(levels_payload(list)));
            }
        }

        if !events.is_empty() {
            self.push_universe();
        }
        self.transmitter.tick(elapsed);
        events
    }

    pub fn lists_payload(&self) -> ListsPayload {
        ListsPayload {
            lists: self
                .lists
                .iter()
                .map(|list| ListSummary {
                    number: list.id(),
                    name: list.name().to_string(),
                })
                .collect(),
        }
    }

    /// Highest-takes-precedence merge of every list's live levels.
    pub fn universe(&self) -> Universe {
        let mut universe = Universe::new(self.universe_size);
        for list in self.lists.iter() {
            for level in list.levels() {
                universe.merge_htp(level.channel, level.level);
            }
        }
        universe
    }

    fn push_universe(&mut self) {
        let universe = self.universe();
        self.transmitter.update(&universe);
    }
}
