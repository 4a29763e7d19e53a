//! # Story Engine
//!
//! Plays, stores and serves branching stories built with `story_graph`.
//!
//! ## Core Components
//!
//! - **play**: Play sessions, choice checking, endings and the final story
//! - **storybook**: The owned state object every command goes through
//! - **persist**: Flat key-value persistence and JSON import/export
//! - **events**: Change notifications for presentation layers
//! - **command**: Parsing for the interactive `storyteller` binary
//! - **config**: TOML configuration
//!
//! ## Design Philosophy
//!
//! - **Pure transitions**: graph and session changes are plain functions of state
//! - **Injected side effects**: storage arrives as a [`KeyValueStore`], rendering as a [`StoryObserver`]
//! - **Lazy checking**: editing tolerates broken choices; play refuses them

pub mod command;
pub mod config;
pub mod events;
pub mod persist;
pub mod play;
pub mod storybook;

pub use command::{Command, CommandError};
pub use config::{ConfigError, StoryConfig};
pub use events::*;
pub use persist::{FileStore, KeyValueStore, MemoryStore, ParseError, PersistError};
pub use play::*;
pub use storybook::{Storybook, StorybookError};
