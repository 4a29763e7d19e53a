//! Persistence adapter - mirrors a storybook into flat key-value storage and
//! converts stories to and from the JSON export format.
//!
//! Four keys are used:
//! - `storyParts`: the graph as a JSON array of parts
//! - `currentPart`: the current part index as a decimal string
//! - `history`: the play history as a JSON array of `{part, choice}`
//! - `darkMode`: `"true"` or `"false"`

mod store;

pub use store::*;

use story_graph::StoryGraph;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::play::{HistoryEntry, PlaySession};

pub const STORY_PARTS_KEY: &str = "storyParts";
pub const CURRENT_PART_KEY: &str = "currentPart";
pub const HISTORY_KEY: &str = "history";
pub const DARK_MODE_KEY: &str = "darkMode";

/// Errors from reading or writing stored state.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not read store file: {0}")]
    TomlRead(#[from] toml::de::Error),

    #[error("could not write store file: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("stored value for \"{key}\" is invalid: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Errors from importing a story document. The current story is never
/// touched when one of these is returned.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid file format, please select a valid story JSON file: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("the story file contains no parts")]
    Empty,

    #[error("the story file has more than one part named \"{name}\"")]
    DuplicateName { name: String },
}

/// Everything restored from a store for one story.
#[derive(Debug, Clone)]
pub struct SavedStory {
    pub graph: StoryGraph,
    pub session: PlaySession,
}

/// Read the stored story. Returns `None` when no story has been saved.
///
/// A stored session that cannot be read, or that no longer fits the stored
/// graph, is dropped and play starts over. The graph itself must be valid.
pub fn load(store: &impl KeyValueStore) -> Result<Option<SavedStory>, PersistError> {
    let Some(parts) = store.get(STORY_PARTS_KEY)? else {
        return Ok(None);
    };
    let graph: StoryGraph = serde_json::from_str(&parts)?;
    if graph.is_empty() {
        return Err(PersistError::InvalidValue {
            key: STORY_PARTS_KEY,
            value: parts,
        });
    }

    let session = match load_session(store)? {
        Some(session) if session.fits(&graph) => session,
        Some(session) => {
            warn!(
                current_part = session.current_part(),
                parts = graph.len(),
                "Stored play session does not match the story, starting over"
            );
            PlaySession::new()
        }
        None => PlaySession::new(),
    };

    debug!(parts = graph.len(), steps = session.history().len(), "Loaded story");
    Ok(Some(SavedStory { graph, session }))
}

/// Read the stored session keys. Unreadable values yield `None`; missing
/// keys fall back to the start of the story.
fn load_session(store: &impl KeyValueStore) -> Result<Option<PlaySession>, PersistError> {
    let current_part = match store.get(CURRENT_PART_KEY)? {
        Some(value) => match value.trim().parse::<usize>() {
            Ok(part) => part,
            Err(err) => {
                warn!(value = %value, error = %err, "Stored current part is unreadable, starting over");
                return Ok(None);
            }
        },
        None => 0,
    };
    let history: Vec<HistoryEntry> = match store.get(HISTORY_KEY)? {
        Some(value) => match serde_json::from_str(&value) {
            Ok(history) => history,
            Err(err) => {
                warn!(error = %err, "Stored history is unreadable, starting over");
                return Ok(None);
            }
        },
        None => Vec::new(),
    };

    Ok(Some(PlaySession::restore(current_part, history)))
}

/// Write the story and play session as one batch.
pub fn save(
    store: &mut impl KeyValueStore,
    graph: &StoryGraph,
    session: &PlaySession,
) -> Result<(), PersistError> {
    store.set_many(&[
        (STORY_PARTS_KEY, serde_json::to_string(graph)?),
        (CURRENT_PART_KEY, session.current_part().to_string()),
        (HISTORY_KEY, serde_json::to_string(session.history())?),
    ])
}

/// Remove the story and play session, leaving preferences alone.
pub fn clear_story(store: &mut impl KeyValueStore) -> Result<(), PersistError> {
    store.remove(STORY_PARTS_KEY)?;
    store.remove(CURRENT_PART_KEY)?;
    store.remove(HISTORY_KEY)?;
    Ok(())
}

/// Read the dark-mode preference; unset means off.
pub fn load_dark_mode(store: &impl KeyValueStore) -> Result<bool, PersistError> {
    Ok(store.get(DARK_MODE_KEY)?.as_deref() == Some("true"))
}

pub fn save_dark_mode(store: &mut impl KeyValueStore, enabled: bool) -> Result<(), PersistError> {
    store.set(DARK_MODE_KEY, if enabled { "true" } else { "false" })
}

/// Serialize a story as the JSON array of its parts.
pub fn export_json(graph: &StoryGraph, pretty: bool) -> Result<Vec<u8>, PersistError> {
    let bytes = if pretty {
        serde_json::to_vec_pretty(graph)?
    } else {
        serde_json::to_vec(graph)?
    };
    info!(parts = graph.len(), bytes = bytes.len(), "Exported story");
    Ok(bytes)
}

/// Parse a story from the JSON export format.
pub fn import_json(bytes: &[u8]) -> Result<StoryGraph, ParseError> {
    let graph: StoryGraph = serde_json::from_slice(bytes)?;
    if graph.is_empty() {
        return Err(ParseError::Empty);
    }
    for (index, part) in graph.parts().iter().enumerate() {
        if graph.is_name_taken(&part.name, Some(index)) {
            return Err(ParseError::DuplicateName {
                name: part.name.clone(),
            });
        }
    }

    info!(parts = graph.len(), "Imported story");
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use story_graph::{Choice, Part};

    fn sample_graph() -> StoryGraph {
        StoryGraph::from_parts(vec![
            Part::new("Harbor")
                .with_text("Ships creak in the fog.")
                .with_choice(Choice::new("Board", 1))
                .with_choice(Choice::new("Wait", 0)),
            Part::new("Deck").with_text("The sails fill."),
        ])
    }

    #[test]
    fn test_load_empty_store() {
        assert!(load(&MemoryStore::new()).unwrap().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let graph = sample_graph();
        let mut session = PlaySession::new();
        session.choose(&graph, 0).unwrap();

        let mut store = MemoryStore::new();
        save(&mut store, &graph, &session).unwrap();
        let saved = load(&store).unwrap().unwrap();

        assert_eq!(saved.graph, graph);
        assert_eq!(saved.session.current_part(), 1);
        assert_eq!(saved.session.history(), &[HistoryEntry::new(0, 0)]);
    }

    #[test]
    fn test_stored_keys_use_flat_formats() {
        let graph = sample_graph();
        let mut session = PlaySession::new();
        session.choose(&graph, 0).unwrap();

        let mut store = MemoryStore::new();
        save(&mut store, &graph, &session).unwrap();

        assert_eq!(store.get(CURRENT_PART_KEY).unwrap().as_deref(), Some("1"));
        assert_eq!(
            store.get(HISTORY_KEY).unwrap().as_deref(),
            Some(r#"[{"part":0,"choice":0}]"#)
        );
    }

    #[test]
    fn test_load_without_session_keys() {
        let mut store = MemoryStore::new();
        store
            .set(STORY_PARTS_KEY, &serde_json::to_string(&sample_graph()).unwrap())
            .unwrap();

        let saved = load(&store).unwrap().unwrap();

        assert_eq!(saved.session.current_part(), 0);
        assert!(saved.session.history().is_empty());
    }

    #[test]
    fn test_load_drops_stale_session() {
        let mut store = MemoryStore::new();
        save(&mut store, &sample_graph(), &PlaySession::new()).unwrap();
        store.set(CURRENT_PART_KEY, "9").unwrap();

        let saved = load(&store).unwrap().unwrap();

        assert_eq!(saved.session.current_part(), 0);
    }

    #[test]
    fn test_load_drops_unreadable_current_part() {
        let graph = sample_graph();
        let mut session = PlaySession::new();
        session.choose(&graph, 0).unwrap();
        let mut store = MemoryStore::new();
        save(&mut store, &graph, &session).unwrap();
        store.set(CURRENT_PART_KEY, "NaN").unwrap();

        let saved = load(&store).unwrap().unwrap();

        assert_eq!(saved.graph, graph);
        assert_eq!(saved.session.current_part(), 0);
        assert!(saved.session.history().is_empty());
    }

    #[test]
    fn test_load_drops_unreadable_history() {
        let graph = sample_graph();
        let mut store = MemoryStore::new();
        save(&mut store, &graph, &PlaySession::new()).unwrap();
        store.set(CURRENT_PART_KEY, "1").unwrap();
        store.set(HISTORY_KEY, "not json").unwrap();

        let saved = load(&store).unwrap().unwrap();

        assert_eq!(saved.graph, graph);
        assert_eq!(saved.session.current_part(), 0);
        assert!(saved.session.history().is_empty());
    }

    #[test]
    fn test_load_rejects_empty_story() {
        let mut store = MemoryStore::new();
        store.set(STORY_PARTS_KEY, "[]").unwrap();

        assert!(matches!(
            load(&store),
            Err(PersistError::InvalidValue {
                key: STORY_PARTS_KEY,
                ..
            })
        ));
    }

    #[test]
    fn test_clear_story_keeps_dark_mode() {
        let mut store = MemoryStore::new();
        save(&mut store, &sample_graph(), &PlaySession::new()).unwrap();
        save_dark_mode(&mut store, true).unwrap();

        clear_story(&mut store).unwrap();

        assert!(load(&store).unwrap().is_none());
        assert!(load_dark_mode(&store).unwrap());
    }

    #[test]
    fn test_dark_mode_defaults_off() {
        let mut store = MemoryStore::new();
        assert!(!load_dark_mode(&store).unwrap());

        save_dark_mode(&mut store, true).unwrap();
        assert_eq!(store.get(DARK_MODE_KEY).unwrap().as_deref(), Some("true"));
    }

    #[test]
    fn test_export_import_preserves_parts() {
        let graph = sample_graph();

        let bytes = export_json(&graph, true).unwrap();
        let imported = import_json(&bytes).unwrap();

        assert_eq!(imported.parts(), graph.parts());
    }

    #[test]
    fn test_import_original_format() {
        let document = br#"[
            {"name": "Part 1", "text": "Start", "choices": [{"text": "Next", "nextPart": 1}]},
            {"name": "Part 2", "text": "End", "choices": []}
        ]"#;

        let graph = import_json(document).unwrap();

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.choice(0, 0), Some(&Choice::new("Next", 1)));
    }

    #[test]
    fn test_import_rejects_malformed() {
        assert!(matches!(
            import_json(b"{not json"),
            Err(ParseError::Malformed(_))
        ));
        assert!(matches!(
            import_json(br#"{"name": "Part 1"}"#),
            Err(ParseError::Malformed(_))
        ));
        assert!(matches!(import_json(b"[]"), Err(ParseError::Empty)));
    }

    #[test]
    fn test_import_rejects_duplicate_names() {
        let document = br#"[{"name": "Cave"}, {"name": "CAVE"}]"#;
        assert!(matches!(
            import_json(document),
            Err(ParseError::DuplicateName { .. })
        ));
    }
}
