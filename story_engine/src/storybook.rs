//! Storybook - the owned state of one story being written and played.
//!
//! Each command follows the same sequence:
//! 1. **Transition**: apply the change to the graph or session (or refuse it)
//! 2. **Persist**: mirror graph, session and preferences into the store
//! 3. **Notify**: hand the resulting [`StoryEvent`] to every observer
//!
//! A refused command changes nothing, writes nothing and notifies no one.

use std::cell::RefCell;
use std::rc::Rc;

use story_graph::{
    validate, ChoiceIndex, EditError, Part, PartIndex, StoryGraph, ValidationReport,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::events::{StoryEvent, StoryObserver};
use crate::persist::{self, KeyValueStore, ParseError, PersistError};
use crate::play::{HistoryEntry, PlayError, PlaySession, Progress, TranscriptLine};

/// Any reason a storybook command failed.
#[derive(Debug, Error)]
pub enum StorybookError {
    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Play(#[from] PlayError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("failed to save story: {0}")]
    Persist(#[from] PersistError),
}

/// A story graph, its play session and preferences, kept in sync with a store.
pub struct Storybook<S: KeyValueStore> {
    graph: StoryGraph,
    session: PlaySession,
    dark_mode: bool,
    pretty_export: bool,
    store: S,
    observers: Vec<Box<dyn StoryObserver>>,
}

impl<S: KeyValueStore> Storybook<S> {
    /// Open the story kept in `store`, or start a new one if it holds none.
    pub fn open(store: S) -> Result<Self, PersistError> {
        let dark_mode = persist::load_dark_mode(&store)?;
        let (graph, session) = match persist::load(&store)? {
            Some(saved) => (saved.graph, saved.session),
            None => {
                info!("No saved story, starting a new one");
                (StoryGraph::new(), PlaySession::new())
            }
        };

        Ok(Self {
            graph,
            session,
            dark_mode,
            pretty_export: true,
            store,
            observers: Vec::new(),
        })
    }

    /// Choose whether exported JSON is indented.
    pub fn with_pretty_export(mut self, pretty: bool) -> Self {
        self.pretty_export = pretty;
        self
    }

    /// Register an observer for every later change.
    pub fn subscribe(&mut self, observer: impl StoryObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn graph(&self) -> &StoryGraph {
        &self.graph
    }

    pub fn parts(&self) -> &[Part] {
        self.graph.parts()
    }

    pub fn session(&self) -> &PlaySession {
        &self.session
    }

    /// The part play is currently showing.
    pub fn current_part(&self) -> Option<&Part> {
        self.session.current(&self.graph)
    }

    pub fn history(&self) -> &[HistoryEntry] {
        self.session.history()
    }

    pub fn is_terminal(&self) -> bool {
        self.session.is_terminal(&self.graph)
    }

    pub fn final_story(&self) -> Option<String> {
        self.session.final_story(&self.graph)
    }

    pub fn progress(&self) -> Progress {
        self.session.progress(&self.graph)
    }

    pub fn transcript(&self) -> Vec<TranscriptLine> {
        self.session.transcript(&self.graph)
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn validate(&self) -> ValidationReport {
        validate(&self.graph)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    pub fn add_part(&mut self) -> Result<PartIndex, StorybookError> {
        let part = self.graph.edit().add_part();
        self.commit(StoryEvent::PartAdded { part })?;
        Ok(part)
    }

    pub fn rename_part(&mut self, part: PartIndex, name: &str) -> Result<(), StorybookError> {
        self.graph.edit().rename_part(part, name)?;
        let name = self.graph.part(part).map(|p| p.name.clone()).unwrap_or_default();
        self.commit(StoryEvent::PartRenamed { part, name })
    }

    pub fn set_part_text(&mut self, part: PartIndex, text: &str) -> Result<(), StorybookError> {
        self.graph.edit().set_part_text(part, text)?;
        self.commit(StoryEvent::PartTextChanged { part })
    }

    /// Remove a part. Play starts over, since history refers to part positions.
    pub fn remove_part(&mut self, part: PartIndex) -> Result<Part, StorybookError> {
        let removed = self.graph.edit().remove_part(part)?;
        self.session = PlaySession::new();
        self.commit(StoryEvent::PartRemoved {
            part,
            name: removed.name.clone(),
        })?;
        Ok(removed)
    }

    pub fn add_choice(&mut self, part: PartIndex) -> Result<ChoiceIndex, StorybookError> {
        let choice = self.graph.edit().add_choice(part)?;
        self.commit(StoryEvent::ChoiceAdded { part, choice })?;
        Ok(choice)
    }

    pub fn remove_choice(
        &mut self,
        part: PartIndex,
        choice: ChoiceIndex,
    ) -> Result<(), StorybookError> {
        self.graph.edit().remove_choice(part, choice)?;
        self.commit(StoryEvent::ChoiceRemoved { part, choice })
    }

    pub fn set_choice_text(
        &mut self,
        part: PartIndex,
        choice: ChoiceIndex,
        text: &str,
    ) -> Result<(), StorybookError> {
        self.graph.edit().set_choice_text(part, choice, text)?;
        self.commit(StoryEvent::ChoiceChanged { part, choice })
    }

    pub fn set_choice_target(
        &mut self,
        part: PartIndex,
        choice: ChoiceIndex,
        next_part: PartIndex,
    ) -> Result<(), StorybookError> {
        self.graph.edit().set_choice_target(part, choice, next_part)?;
        self.commit(StoryEvent::ChoiceChanged { part, choice })
    }

    // ------------------------------------------------------------------
    // Play
    // ------------------------------------------------------------------

    /// Enter play mode: validate the story and start from the first part.
    ///
    /// Structural issues do not block play; they are logged and returned so
    /// the caller can show them. Broken choices are refused when taken.
    pub fn start_play(&mut self) -> Result<ValidationReport, StorybookError> {
        let report = validate(&self.graph);
        for issue in &report.issues {
            warn!(severity = ?issue.severity(), "{issue}");
        }

        self.session.start();
        self.commit(StoryEvent::PlayStarted)?;
        Ok(report)
    }

    /// Play again from the first part.
    pub fn replay(&mut self) -> Result<ValidationReport, StorybookError> {
        self.start_play()
    }

    /// Take a choice on the current part.
    pub fn choose(&mut self, choice: ChoiceIndex) -> Result<PartIndex, StorybookError> {
        let from = self.session.current_part();
        let to = self.session.choose(&self.graph, choice)?;

        self.commit(StoryEvent::ChoiceTaken { from, choice, to })?;
        if self.is_terminal() {
            self.notify(&StoryEvent::EndingReached { part: to });
        }
        Ok(to)
    }

    // ------------------------------------------------------------------
    // Whole-story commands
    // ------------------------------------------------------------------

    /// Throw the story away and start over with a single empty part.
    /// The dark-mode preference is kept.
    pub fn reset_story(&mut self) -> Result<(), StorybookError> {
        self.graph = StoryGraph::new();
        self.session = PlaySession::new();
        persist::clear_story(&mut self.store)?;
        info!("Story reset");
        self.notify(&StoryEvent::StoryReset);
        Ok(())
    }

    /// Replace the story with one read from an exported JSON document.
    /// On any parse failure the current story is left untouched.
    pub fn import_json(&mut self, bytes: &[u8]) -> Result<(), StorybookError> {
        let graph = persist::import_json(bytes)?;
        let parts = graph.len();

        self.graph = graph;
        self.session = PlaySession::new();
        self.commit(StoryEvent::StoryImported { parts })
    }

    /// The story as a JSON array of parts.
    pub fn export_json(&self) -> Result<Vec<u8>, StorybookError> {
        Ok(persist::export_json(&self.graph, self.pretty_export)?)
    }

    /// Flip the dark-mode preference and return the new value.
    pub fn toggle_dark_mode(&mut self) -> Result<bool, StorybookError> {
        self.dark_mode = !self.dark_mode;
        persist::save_dark_mode(&mut self.store, self.dark_mode)?;
        self.notify(&StoryEvent::DarkModeChanged {
            enabled: self.dark_mode,
        });
        Ok(self.dark_mode)
    }

    fn commit(&mut self, event: StoryEvent) -> Result<(), StorybookError> {
        if event.is_edit() && !self.session.fits(&self.graph) {
            warn!(session = %self.session.id(), "Edit invalidated play session, starting over");
            self.session = PlaySession::new();
        }

        persist::save(&mut self.store, &self.graph, &self.session)?;
        self.notify(&event);
        Ok(())
    }

    fn notify(&mut self, event: &StoryEvent) {
        for observer in &mut self.observers {
            observer.on_event(event, &self.graph, &self.session);
        }
    }
}

/// Lets a caller keep a handle on an observer it registered.
impl<T: StoryObserver> StoryObserver for Rc<RefCell<T>> {
    fn on_event(&mut self, event: &StoryEvent, graph: &StoryGraph, session: &PlaySession) {
        self.borrow_mut().on_event(event, graph, session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventLog;
    use crate::persist::{MemoryStore, CURRENT_PART_KEY, HISTORY_KEY, STORY_PARTS_KEY};

    fn storybook() -> Storybook<MemoryStore> {
        Storybook::open(MemoryStore::new()).unwrap()
    }

    fn with_log(book: &mut Storybook<MemoryStore>) -> Rc<RefCell<EventLog>> {
        let log = Rc::new(RefCell::new(EventLog::new()));
        book.subscribe(Rc::clone(&log));
        log
    }

    #[test]
    fn test_new_storybook_starts_with_default_part() {
        let book = storybook();
        assert_eq!(book.parts().len(), 1);
        assert_eq!(book.parts()[0].name, "Part 1");
        assert!(book.is_terminal());
        assert!(!book.dark_mode());
    }

    #[test]
    fn test_every_edit_is_persisted() {
        let mut book = storybook();
        book.add_part().unwrap();
        book.set_part_text(1, "A quiet room.").unwrap();

        let stored = book.store().get(STORY_PARTS_KEY).unwrap().unwrap();
        assert!(stored.contains("A quiet room."));
        assert!(stored.contains("Part 2"));
    }

    #[test]
    fn test_observers_see_each_change() {
        let mut book = storybook();
        let log = with_log(&mut book);

        book.add_part().unwrap();
        book.add_choice(0).unwrap();
        book.set_choice_target(0, 0, 1).unwrap();
        book.start_play().unwrap();
        book.choose(0).unwrap();

        assert_eq!(
            log.borrow().events(),
            &[
                StoryEvent::PartAdded { part: 1 },
                StoryEvent::ChoiceAdded { part: 0, choice: 0 },
                StoryEvent::ChoiceChanged { part: 0, choice: 0 },
                StoryEvent::PlayStarted,
                StoryEvent::ChoiceTaken {
                    from: 0,
                    choice: 0,
                    to: 1
                },
                StoryEvent::EndingReached { part: 1 },
            ]
        );
    }

    #[test]
    fn test_refused_commands_emit_nothing() {
        let mut book = storybook();
        book.add_part().unwrap();
        book.add_choice(0).unwrap();
        let log = with_log(&mut book);

        assert!(matches!(
            book.rename_part(0, "part 2"),
            Err(StorybookError::Edit(EditError::DuplicateName { .. }))
        ));
        assert!(matches!(
            book.choose(0),
            Err(StorybookError::Play(PlayError::SelfLoop { .. }))
        ));
        assert!(log.borrow().events().is_empty());
    }

    #[test]
    fn test_start_play_reports_issues_without_blocking() {
        let mut book = storybook();
        book.add_choice(0).unwrap();

        let report = book.start_play().unwrap();

        assert!(!report.is_playable());
        assert_eq!(book.session().current_part(), 0);
    }

    #[test]
    fn test_remove_part_restarts_play() {
        let mut book = storybook();
        book.add_part().unwrap();
        book.add_part().unwrap();
        book.add_choice(0).unwrap();
        book.set_choice_target(0, 0, 2).unwrap();
        book.choose(0).unwrap();

        book.remove_part(1).unwrap();

        assert_eq!(book.session().current_part(), 0);
        assert!(book.history().is_empty());
        assert_eq!(book.graph().choice(0, 0).unwrap().next_part, 1);
        assert_eq!(
            book.store().get(CURRENT_PART_KEY).unwrap().as_deref(),
            Some("0")
        );
    }

    #[test]
    fn test_removing_a_taken_choice_restarts_play() {
        let mut book = storybook();
        book.add_part().unwrap();
        book.add_choice(0).unwrap();
        book.set_choice_target(0, 0, 1).unwrap();
        book.choose(0).unwrap();

        book.remove_choice(0, 0).unwrap();

        assert!(book.history().is_empty());
        assert_eq!(book.session().current_part(), 0);
    }

    #[test]
    fn test_open_with_unreadable_session_keeps_story() {
        let mut store = MemoryStore::new();
        store
            .set(STORY_PARTS_KEY, r#"[{"name": "Dock", "text": "Waves."}]"#)
            .unwrap();
        store.set(CURRENT_PART_KEY, "NaN").unwrap();
        store.set(HISTORY_KEY, "not json").unwrap();

        let book = Storybook::open(store).unwrap();

        assert_eq!(book.parts().len(), 1);
        assert_eq!(book.parts()[0].name, "Dock");
        assert_eq!(book.session().current_part(), 0);
        assert!(book.history().is_empty());
    }

    #[test]
    fn test_failed_import_keeps_story_and_store() {
        let mut book = storybook();
        book.set_part_text(0, "Original").unwrap();
        book.add_part().unwrap();
        book.add_choice(0).unwrap();
        book.set_choice_target(0, 0, 1).unwrap();
        book.start_play().unwrap();
        book.choose(0).unwrap();
        let stored_before = book.store().get(STORY_PARTS_KEY).unwrap();

        let result = book.import_json(b"definitely not json");

        assert!(matches!(result, Err(StorybookError::Parse(_))));
        assert_eq!(book.parts()[0].text, "Original");
        assert_eq!(book.session().current_part(), 1);
        assert_eq!(book.history(), &[HistoryEntry::new(0, 0)]);
        assert_eq!(book.store().get(STORY_PARTS_KEY).unwrap(), stored_before);
        assert_eq!(
            book.store().get(CURRENT_PART_KEY).unwrap().as_deref(),
            Some("1")
        );
    }

    #[test]
    fn test_import_replaces_story_and_restarts_play() {
        let mut book = storybook();
        let log = with_log(&mut book);

        book.import_json(br#"[{"name": "Only", "text": "Hi", "choices": []}, {"name": "Other"}]"#)
            .unwrap();

        assert_eq!(book.parts().len(), 2);
        assert_eq!(book.parts()[0].name, "Only");
        assert!(book.history().is_empty());
        assert_eq!(
            log.borrow().events(),
            &[StoryEvent::StoryImported { parts: 2 }]
        );
    }

    #[test]
    fn test_reset_story_keeps_dark_mode() {
        let mut book = storybook();
        book.toggle_dark_mode().unwrap();
        book.add_part().unwrap();

        book.reset_story().unwrap();

        assert_eq!(book.parts().len(), 1);
        assert!(book.dark_mode());
        assert_eq!(book.store().get(STORY_PARTS_KEY).unwrap(), None);

        let reopened = Storybook::open(book.into_store()).unwrap();
        assert_eq!(reopened.parts().len(), 1);
        assert!(reopened.dark_mode());
    }

    #[test]
    fn test_reopen_restores_everything() {
        let mut book = storybook();
        book.add_part().unwrap();
        book.add_choice(0).unwrap();
        book.set_choice_text(0, 0, "Onward").unwrap();
        book.set_choice_target(0, 0, 1).unwrap();
        book.choose(0).unwrap();
        book.toggle_dark_mode().unwrap();
        let graph = book.graph().clone();

        let reopened = Storybook::open(book.into_store()).unwrap();

        assert_eq!(reopened.graph(), &graph);
        assert_eq!(reopened.session().current_part(), 1);
        assert_eq!(reopened.history(), &[HistoryEntry::new(0, 0)]);
        assert!(reopened.dark_mode());
    }

    #[test]
    fn test_export_uses_configured_format() {
        let book = storybook().with_pretty_export(false);
        assert_eq!(
            book.export_json().unwrap(),
            br#"[{"name":"Part 1","text":"","choices":[]}]"#.to_vec()
        );
    }
}
