//! Story events - what changed after each command, for presentation layers.
//!
//! The core never renders. After a command succeeds the [`crate::Storybook`]
//! hands the matching [`StoryEvent`] to every registered [`StoryObserver`],
//! together with read access to the new state.

use story_graph::{ChoiceIndex, PartIndex, StoryGraph};

use crate::play::PlaySession;

/// A successful change to a storybook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoryEvent {
    PartAdded { part: PartIndex },
    PartRemoved { part: PartIndex, name: String },
    PartRenamed { part: PartIndex, name: String },
    PartTextChanged { part: PartIndex },
    ChoiceAdded { part: PartIndex, choice: ChoiceIndex },
    ChoiceRemoved { part: PartIndex, choice: ChoiceIndex },
    ChoiceChanged { part: PartIndex, choice: ChoiceIndex },

    PlayStarted,
    ChoiceTaken {
        from: PartIndex,
        choice: ChoiceIndex,
        to: PartIndex,
    },
    EndingReached { part: PartIndex },

    StoryImported { parts: usize },
    StoryReset,
    DarkModeChanged { enabled: bool },
}

impl StoryEvent {
    /// True for events that change the story structure rather than play.
    pub fn is_edit(&self) -> bool {
        matches!(
            self,
            StoryEvent::PartAdded { .. }
                | StoryEvent::PartRemoved { .. }
                | StoryEvent::PartRenamed { .. }
                | StoryEvent::PartTextChanged { .. }
                | StoryEvent::ChoiceAdded { .. }
                | StoryEvent::ChoiceRemoved { .. }
                | StoryEvent::ChoiceChanged { .. }
                | StoryEvent::StoryImported { .. }
                | StoryEvent::StoryReset
        )
    }
}

/// Receives every successful change along with the resulting state.
pub trait StoryObserver {
    fn on_event(&mut self, event: &StoryEvent, graph: &StoryGraph, session: &PlaySession);
}

/// Observer that keeps every event it sees.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<StoryEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[StoryEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl StoryObserver for EventLog {
    fn on_event(&mut self, event: &StoryEvent, _graph: &StoryGraph, _session: &PlaySession) {
        self.events.push(event.clone());
    }
}
