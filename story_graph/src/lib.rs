//! # Story Graph
//!
//! The data model for branching stories: parts, the labelled choices linking
//! them, and the graph that owns both. This crate knows nothing about play
//! sessions or storage; it is the single source of truth for story structure.
//!
//! ## Two-phase contract
//!
//! - **Editing** goes through [`EditableGraph`], which accepts temporarily
//!   inconsistent graphs (a choice may point at a part that does not exist yet).
//! - **Validation** runs through [`validate`] before play and reports every
//!   structural issue instead of failing on the first one.

pub mod error;
pub mod graph;
pub mod parts;
pub mod validation;

pub use error::*;
pub use graph::*;
pub use parts::*;
pub use validation::*;
