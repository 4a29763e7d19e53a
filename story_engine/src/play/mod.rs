//! Play sessions - walking a story graph and recording the route taken.
//!
//! A session only stores indices. Every operation takes the graph it plays
//! against, so a session can outlive edits and be checked with
//! [`PlaySession::fits`] before it is resumed.

mod progress;

pub use progress::*;

use serde::{Deserialize, Serialize};
use story_graph::{ChoiceIndex, Part, PartIndex, StoryGraph};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Identifies a play-through in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One step of a play-through: the part that was showing and the choice taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub part: PartIndex,
    pub choice: ChoiceIndex,
}

impl HistoryEntry {
    pub fn new(part: PartIndex, choice: ChoiceIndex) -> Self {
        Self { part, choice }
    }
}

/// Reasons a choice was refused. A refused choice never changes the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayError {
    #[error("this choice leads back to the same part, assign a different next part to avoid loops")]
    SelfLoop { part: PartIndex, choice: ChoiceIndex },

    #[error("this choice leads to part {target}, which does not exist (the story has {len} parts)")]
    OutOfRange {
        part: PartIndex,
        choice: ChoiceIndex,
        target: PartIndex,
        len: usize,
    },

    #[error("part {part} has no choice {choice}")]
    ChoiceNotFound { part: PartIndex, choice: ChoiceIndex },

    #[error("the current part {part} no longer exists, restart play")]
    NotPlaying { part: PartIndex },
}

/// Position and route of a play-through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaySession {
    id: SessionId,
    current_part: PartIndex,
    history: Vec<HistoryEntry>,
}

impl PlaySession {
    /// A session at the first part with no history.
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            current_part: 0,
            history: Vec::new(),
        }
    }

    /// Rebuild a session from stored state. Use [`PlaySession::fits`] to check
    /// it against the graph before playing.
    pub(crate) fn restore(current_part: PartIndex, history: Vec<HistoryEntry>) -> Self {
        Self {
            id: SessionId::new(),
            current_part,
            history,
        }
    }

    /// Identifies this run in log lines. Changes on every restart.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Index of the part being read. Not checked against any graph.
    pub fn current_part(&self) -> PartIndex {
        self.current_part
    }

    /// Choices taken so far, oldest first.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Reset to the first part with an empty history.
    pub fn start(&mut self) {
        self.id = SessionId::new();
        self.current_part = 0;
        self.history.clear();
        info!(session = %self.id, "Play started");
    }

    /// The part currently showing, if it still exists.
    pub fn current<'g>(&self, graph: &'g StoryGraph) -> Option<&'g Part> {
        graph.part(self.current_part)
    }

    /// Take a choice on the current part.
    ///
    /// Choices that loop back to the current part or lead past the end of the
    /// graph are refused. On success the step is appended to the history and
    /// the new current part is returned.
    pub fn choose(
        &mut self,
        graph: &StoryGraph,
        choice: ChoiceIndex,
    ) -> Result<PartIndex, PlayError> {
        let part = self.current_part;
        let current = graph
            .part(part)
            .ok_or(PlayError::NotPlaying { part })?;
        let target = current
            .choices
            .get(choice)
            .ok_or(PlayError::ChoiceNotFound { part, choice })?
            .next_part;

        if target == part {
            warn!(session = %self.id, part, choice, "Refused choice that loops back");
            return Err(PlayError::SelfLoop { part, choice });
        }
        if target >= graph.len() {
            warn!(session = %self.id, part, choice, target, "Refused choice with missing target");
            return Err(PlayError::OutOfRange {
                part,
                choice,
                target,
                len: graph.len(),
            });
        }

        self.history.push(HistoryEntry::new(part, choice));
        self.current_part = target;
        debug!(session = %self.id, part, choice, target, "Choice taken");

        if self.is_terminal(graph) {
            info!(session = %self.id, part = target, steps = self.history.len(), "Ending reached");
        }
        Ok(target)
    }

    /// True when the current part exists and has no choices.
    pub fn is_terminal(&self, graph: &StoryGraph) -> bool {
        self.current(graph).map(Part::is_ending).unwrap_or(false)
    }

    /// The text of every part visited before the ending, in order, separated
    /// by blank lines. `None` until an ending is reached.
    pub fn final_story(&self, graph: &StoryGraph) -> Option<String> {
        if !self.is_terminal(graph) {
            return None;
        }

        let texts: Vec<&str> = self
            .history
            .iter()
            .filter_map(|entry| graph.part(entry.part))
            .map(|part| part.text.as_str())
            .collect();
        Some(texts.join("\n\n"))
    }

    pub fn progress(&self, graph: &StoryGraph) -> Progress {
        Progress::new(self.current_part.saturating_add(1), graph.len())
    }

    /// The visited parts and the choices taken from them.
    pub fn transcript(&self, graph: &StoryGraph) -> Vec<TranscriptLine> {
        self.history
            .iter()
            .enumerate()
            .map(|(step, entry)| TranscriptLine {
                step: step + 1,
                part_text: graph
                    .part(entry.part)
                    .map(|p| p.text.clone())
                    .unwrap_or_default(),
                choice_text: graph
                    .choice(entry.part, entry.choice)
                    .map(|c| c.text.clone())
                    .unwrap_or_default(),
            })
            .collect()
    }

    /// Check that the current part and every history step exist in `graph`.
    pub fn fits(&self, graph: &StoryGraph) -> bool {
        graph.contains(self.current_part)
            && self
                .history
                .iter()
                .all(|entry| graph.choice(entry.part, entry.choice).is_some())
    }
}

impl Default for PlaySession {
    fn default() -> Self {
        Self::new()
    }
}
