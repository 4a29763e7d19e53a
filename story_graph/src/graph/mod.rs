//! Story graph - the ordered list of parts and the edit capability over it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EditError;
use crate::parts::{Choice, ChoiceIndex, Part, PartIndex};

/// Name given to the part every new story starts with.
pub const FIRST_PART_NAME: &str = "Part 1";

/// The complete structure of a story.
///
/// Serializes as the bare array of parts, which is also the export format.
/// Read access is available directly; changes go through [`StoryGraph::edit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryGraph {
    parts: Vec<Part>,
}

impl StoryGraph {
    /// Create a story holding a single empty part named "Part 1".
    pub fn new() -> Self {
        Self {
            parts: vec![Part::new(FIRST_PART_NAME)],
        }
    }

    /// Wrap an existing list of parts without checking it.
    pub fn from_parts(parts: Vec<Part>) -> Self {
        Self { parts }
    }

    /// Take the parts back out.
    pub fn into_parts(self) -> Vec<Part> {
        self.parts
    }

    /// All parts in story order. Choice targets index into this slice.
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Get a part by index.
    pub fn part(&self, index: PartIndex) -> Option<&Part> {
        self.parts.get(index)
    }

    /// Get a choice by part and choice index.
    pub fn choice(&self, part: PartIndex, choice: ChoiceIndex) -> Option<&Choice> {
        self.parts.get(part).and_then(|p| p.choices.get(choice))
    }

    /// Number of parts.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// True only for a graph built from no parts; editing never empties one.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Check whether an index names an existing part.
    pub fn contains(&self, index: PartIndex) -> bool {
        index < self.parts.len()
    }

    /// Find a part by name, ignoring case.
    pub fn find_by_name(&self, name: &str) -> Option<PartIndex> {
        self.parts.iter().position(|p| p.has_name(name))
    }

    /// Check whether any part other than `except` already uses `name`.
    pub fn is_name_taken(&self, name: &str, except: Option<PartIndex>) -> bool {
        self.parts
            .iter()
            .enumerate()
            .any(|(index, part)| Some(index) != except && part.has_name(name))
    }

    /// Borrow the graph for editing.
    pub fn edit(&mut self) -> EditableGraph<'_> {
        EditableGraph { graph: self }
    }
}

impl Default for StoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Unchecked edit capability over a [`StoryGraph`].
///
/// Edits only guarantee name uniqueness and that the addressed part or choice
/// exists. Choice targets are accepted as given; play and [`crate::validate`]
/// deal with targets that do not resolve.
pub struct EditableGraph<'a> {
    graph: &'a mut StoryGraph,
}

impl EditableGraph<'_> {
    /// Append a part with the first free "Part N" name. Returns its index.
    pub fn add_part(&mut self) -> PartIndex {
        let mut number = self.graph.len() + 1;
        let name = loop {
            let candidate = format!("Part {number}");
            if !self.graph.is_name_taken(&candidate, None) {
                break candidate;
            }
            number += 1;
        };

        debug!(part = self.graph.len(), name = %name, "Adding part");
        self.graph.parts.push(Part::new(name));
        self.graph.len() - 1
    }

    /// Rename a part. Names are trimmed and must stay unique ignoring case.
    pub fn rename_part(&mut self, index: PartIndex, new_name: &str) -> Result<(), EditError> {
        self.part_mut(index)?;

        let name = new_name.trim();
        if name.is_empty() {
            return Err(EditError::EmptyName);
        }
        if self.graph.is_name_taken(name, Some(index)) {
            return Err(EditError::DuplicateName {
                name: name.to_string(),
            });
        }

        debug!(part = index, name, "Renaming part");
        self.part_mut(index)?.name = name.to_string();
        Ok(())
    }

    /// Replace the narrative text of a part.
    pub fn set_part_text(
        &mut self,
        index: PartIndex,
        text: impl Into<String>,
    ) -> Result<(), EditError> {
        self.part_mut(index)?.text = text.into();
        Ok(())
    }

    /// Remove a part and rewire the choices that referred to the parts after it.
    ///
    /// Targets past the removed part shift down by one so they keep pointing at
    /// the same part. Choices that led to the removed part become unwired: they
    /// are pointed back at their own part, the same state a freshly added
    /// choice starts in.
    pub fn remove_part(&mut self, index: PartIndex) -> Result<Part, EditError> {
        self.part_mut(index)?;
        if self.graph.len() == 1 {
            return Err(EditError::LastPart);
        }

        let removed = self.graph.parts.remove(index);
        let mut unwired = 0usize;

        for (owner, part) in self.graph.parts.iter_mut().enumerate() {
            for choice in &mut part.choices {
                if choice.next_part == index {
                    choice.next_part = owner;
                    unwired += 1;
                } else if choice.next_part > index {
                    choice.next_part -= 1;
                }
            }
        }

        debug!(part = index, name = %removed.name, unwired, "Removed part");
        Ok(removed)
    }

    /// Append a choice to a part. New choices point back at their own part
    /// until a target is chosen. Returns the new choice index.
    pub fn add_choice(&mut self, part: PartIndex) -> Result<ChoiceIndex, EditError> {
        let owner = self.part_mut(part)?;
        owner.choices.push(Choice::new("", part));

        let choice = owner.choices.len() - 1;
        debug!(part, choice, "Adding choice");
        Ok(choice)
    }

    /// Remove a choice from a part.
    pub fn remove_choice(
        &mut self,
        part: PartIndex,
        choice: ChoiceIndex,
    ) -> Result<Choice, EditError> {
        self.choice_mut(part, choice)?;
        debug!(part, choice, "Removing choice");
        Ok(self.part_mut(part)?.choices.remove(choice))
    }

    /// Replace the label of a choice.
    pub fn set_choice_text(
        &mut self,
        part: PartIndex,
        choice: ChoiceIndex,
        text: impl Into<String>,
    ) -> Result<(), EditError> {
        self.choice_mut(part, choice)?.text = text.into();
        Ok(())
    }

    /// Point a choice at another part. The target is not checked here.
    pub fn set_choice_target(
        &mut self,
        part: PartIndex,
        choice: ChoiceIndex,
        next_part: PartIndex,
    ) -> Result<(), EditError> {
        debug!(part, choice, target = next_part, "Retargeting choice");
        self.choice_mut(part, choice)?.next_part = next_part;
        Ok(())
    }

    fn part_mut(&mut self, index: PartIndex) -> Result<&mut Part, EditError> {
        self.graph
            .parts
            .get_mut(index)
            .ok_or(EditError::PartNotFound { index })
    }

    fn choice_mut(&mut self, part: PartIndex, choice: ChoiceIndex) -> Result<&mut Choice, EditError> {
        self.part_mut(part)?
            .choices
            .get_mut(choice)
            .ok_or(EditError::ChoiceNotFound { part, choice })
    }
}
