//! Errors raised while editing a story graph.

use thiserror::Error;

use crate::parts::{ChoiceIndex, PartIndex};

/// Reasons an edit was rejected. A rejected edit never changes the graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("a part named \"{name}\" already exists, please choose a different name")]
    DuplicateName { name: String },

    #[error("part names cannot be blank")]
    EmptyName,

    #[error("there is no part {index}")]
    PartNotFound { index: PartIndex },

    #[error("part {part} has no choice {choice}")]
    ChoiceNotFound { part: PartIndex, choice: ChoiceIndex },

    #[error("a story needs at least one part")]
    LastPart,
}
