// src/application/notes_workspace.rs
use crate::application::folder_tree::{DropOutcome, DropRequest, FolderTree, Hierarchy};
use crate::application::note_editor::NoteEditor;
use crate::application::note_list::{NoteCommand, NoteList};
use crate::application::note_tabs::NoteTabs;
use crate::application::{FolderRepository, NoteRepository};
use crate::domain::{
    DomainError, Folder, FolderId, Note, NoteDraft, NoteFields, NoteId, OpenNote, TabKey,
    ValidationError,
};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Notes page state: canonical collections, folder selection, open tabs and the editor.
///
/// Every operation either completes or returns an error with the state unchanged
/// up to the failing backend call. Nothing is retried.
pub struct NotesWorkspace<R: NoteRepository + FolderRepository> {
    repository: R,
    notes: Vec<Note>,
    folders: Vec<Folder>,
    selected_folder: Option<FolderId>,
    tree: FolderTree,
    tabs: NoteTabs,
    editing: bool,
    editor: Option<NoteEditor>,
    autosave_quiet: Duration,
}

impl<R: NoteRepository + FolderRepository> NotesWorkspace<R> {
    pub fn new(repository: R, autosave_quiet: Duration) -> Self {
        Self {
            repository,
            notes: vec![],
            folders: vec![],
            selected_folder: None,
            tree: FolderTree::new(),
            tabs: NoteTabs::new(),
            editing: false,
            editor: None,
            autosave_quiet,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn hierarchy(&self) -> Hierarchy<'_> {
        Hierarchy::new(&self.folders, &self.notes)
    }

    pub fn tree(&self) -> &FolderTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut FolderTree {
        &mut self.tree
    }

    pub fn selected_folder(&self) -> Option<FolderId> {
        self.selected_folder
    }

    pub fn note_list(&self) -> NoteList<'_> {
        NoteList::scoped(&self.notes, self.selected_folder)
    }

    pub fn tabs(&self) -> &NoteTabs {
        &self.tabs
    }

    pub fn active_note(&self) -> Option<&OpenNote> {
        self.tabs.active()
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn editor(&self) -> Option<&NoteEditor> {
        self.editor.as_ref()
    }

    pub fn editor_mut(&mut self) -> Option<&mut NoteEditor> {
        self.editor.as_mut()
    }

    pub fn load(&mut self) -> Result<(), DomainError> {
        self.refresh_notes()?;
        self.refresh_folders()
    }

    fn refresh_notes(&mut self) -> Result<(), DomainError> {
        self.notes = self.repository.list_notes()?;
        let active_before = self.tabs.active_key();
        self.tabs.sync_with(&self.notes);
        // A vanished active tab hands focus to another note; the editor must follow it
        if self.tabs.active_key() != active_before {
            self.remount_editor();
        }
        debug!(count = self.notes.len(), "Refreshed notes");
        Ok(())
    }

    fn refresh_folders(&mut self) -> Result<(), DomainError> {
        self.folders = self.repository.list_folders()?;
        let hierarchy = Hierarchy::new(&self.folders, &self.notes);
        self.tree.prune(hierarchy);
        if let Some(selected) = self.selected_folder {
            if hierarchy.folder(selected).is_none() {
                self.selected_folder = None;
            }
        }
        debug!(count = self.folders.len(), "Refreshed folders");
        Ok(())
    }

    /// Keeps the editor bound to the active tab; a new editor means pending saves are dropped
    fn remount_editor(&mut self) {
        let active = self.tabs.active();
        match (self.editing, active) {
            (true, Some(note)) => {
                self.editor = Some(NoteEditor::for_note(note, self.autosave_quiet));
            }
            (true, None) => {
                self.editing = false;
                self.editor = None;
            }
            (false, _) => self.editor = None,
        }
    }

    fn find_note(&self, id: NoteId) -> Result<&Note, DomainError> {
        self.notes
            .iter()
            .find(|n| n.id == id)
            .ok_or(DomainError::NoteNotFound(id))
    }

    /// Opens a note in view mode
    pub fn select_note(&mut self, id: NoteId) -> Result<TabKey, DomainError> {
        let note = self.find_note(id)?.clone();
        let key = self.tabs.open(OpenNote::Persisted(note));
        self.editing = false;
        self.remount_editor();
        Ok(key)
    }

    pub fn edit_note(&mut self, id: NoteId) -> Result<TabKey, DomainError> {
        let key = self.select_note(id)?;
        self.start_editing()?;
        Ok(key)
    }

    /// Switches the active tab into edit mode
    pub fn start_editing(&mut self) -> Result<(), DomainError> {
        if self.tabs.active().is_none() {
            return Err(DomainError::NoActiveNote);
        }
        if !self.editing {
            self.editing = true;
            self.remount_editor();
        }
        Ok(())
    }

    pub fn activate_tab(&mut self, key: TabKey) -> bool {
        if self.tabs.active_key() == Some(key) {
            return self.tabs.contains(key);
        }
        let switched = self.tabs.activate(key);
        if switched {
            self.editing = false;
            self.remount_editor();
        }
        switched
    }

    /// Opens a local draft filed under `folder`, or under the selected folder.
    /// Only one draft exists at a time; asking again re-activates it.
    pub fn create_note(&mut self, folder: Option<FolderId>) -> TabKey {
        if self.tabs.contains(TabKey::Draft) {
            debug!("Draft already open, re-activating it");
            self.tabs.activate(TabKey::Draft);
        } else {
            let folder_id = folder.or(self.selected_folder);
            self.tabs.open(OpenNote::Draft(NoteDraft::new(folder_id)));
        }
        self.editing = true;
        self.remount_editor();
        TabKey::Draft
    }

    pub fn close_tab(&mut self, key: TabKey) -> bool {
        let was_active = self.tabs.active_key() == Some(key);
        let closed = self.tabs.close(key);
        if closed && was_active {
            self.remount_editor();
        }
        closed
    }

    /// Saves the active note. A draft is created on the backend and its tab promoted
    /// to the returned id; a saved note is updated in place.
    #[instrument(level = "debug", skip(self, fields), fields(title = %fields.title))]
    pub fn autosave(&mut self, fields: NoteFields) -> Result<TabKey, DomainError> {
        let active = self.tabs.active().ok_or(DomainError::NoActiveNote)?;
        let key = match active {
            OpenNote::Draft(draft) => {
                let input = draft.input_with(fields);
                let created = self.repository.create_note(&input)?;
                info!(note_id = created.id, "Created note from draft");
                let key = TabKey::Saved(created.id);
                self.tabs.promote_draft(created);
                key
            }
            OpenNote::Persisted(note) => {
                let id = note.id;
                let input = note.input_with(fields);
                let updated = self.repository.update_note(id, &input)?;
                debug!(note_id = id, "Updated note");
                self.tabs.update(&updated);
                TabKey::Saved(id)
            }
        };
        self.refresh_notes()?;
        Ok(key)
    }

    /// Fires the editor's autosave if its quiet period has elapsed
    pub fn poll_autosave(&mut self, now: Instant) -> Result<Option<TabKey>, DomainError> {
        let fields = self.editor.as_mut().and_then(|editor| editor.poll(now));
        match fields {
            Some(fields) => self.autosave(fields).map(Some),
            None => Ok(None),
        }
    }

    /// Saves pending edits immediately
    pub fn flush_autosave(&mut self) -> Result<Option<TabKey>, DomainError> {
        let fields = self.editor.as_mut().and_then(NoteEditor::flush);
        match fields {
            Some(fields) => self.autosave(fields).map(Some),
            None => Ok(None),
        }
    }

    pub fn next_autosave_in(&self, now: Instant) -> Option<Duration> {
        self.editor.as_ref().and_then(|e| e.next_save_in(now))
    }

    pub fn delete_note(&mut self, id: NoteId) -> Result<(), DomainError> {
        self.repository.delete_note(id)?;
        info!(note_id = id, "Deleted note");
        self.refresh_notes()?;
        self.close_tab(TabKey::Saved(id));
        Ok(())
    }

    /// Persists the favourite flag merged into the note's current fields
    pub fn set_favorite(&mut self, id: NoteId, is_favorite: bool) -> Result<(), DomainError> {
        let mut input = self.find_note(id)?.to_input();
        input.is_favorite = is_favorite;
        let updated = self.repository.update_note(id, &input)?;
        self.tabs.update(&updated);
        self.refresh_notes()
    }

    pub fn toggle_favorite(&mut self, id: NoteId) -> Result<bool, DomainError> {
        let flag = !self.find_note(id)?.is_favorite;
        self.set_favorite(id, flag)?;
        Ok(flag)
    }

    /// Runs a command coming from a note-list row
    pub fn run_note_command(&mut self, command: NoteCommand) -> Result<(), DomainError> {
        match command {
            NoteCommand::Open(id) => self.select_note(id).map(|_| ()),
            NoteCommand::Edit(id) => self.edit_note(id).map(|_| ()),
            NoteCommand::SetFavorite(id, flag) => self.set_favorite(id, flag),
            NoteCommand::Delete(id) => self.delete_note(id),
        }
    }

    pub fn select_folder(&mut self, id: FolderId) -> Result<(), DomainError> {
        let hierarchy = Hierarchy::new(&self.folders, &self.notes);
        self.tree
            .select(hierarchy, id)
            .ok_or(DomainError::FolderNotFound(id))?;
        self.selected_folder = Some(id);
        Ok(())
    }

    pub fn clear_folder_selection(&mut self) {
        self.selected_folder = None;
    }

    pub fn create_folder(
        &mut self,
        name: &str,
        parent: Option<FolderId>,
    ) -> Result<Folder, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingField("name").into());
        }
        let folder = self.repository.create_folder(name, parent)?;
        info!(folder_id = folder.id, ?parent, "Created folder");
        self.refresh_folders()?;
        Ok(folder)
    }

    /// Re-parents a folder; moves that would make it its own ancestor are refused
    pub fn move_folder(
        &mut self,
        id: FolderId,
        new_parent: Option<FolderId>,
    ) -> Result<(), DomainError> {
        let hierarchy = self.hierarchy();
        hierarchy.folder(id).ok_or(DomainError::FolderNotFound(id))?;
        if let Some(target) = new_parent {
            hierarchy
                .folder(target)
                .ok_or(DomainError::FolderNotFound(target))?;
            if target == id || hierarchy.is_ancestor(id, target) {
                return Err(DomainError::FolderCycle { folder: id, target });
            }
        }
        self.repository.move_folder(id, new_parent)?;
        info!(folder_id = id, ?new_parent, "Moved folder");
        self.refresh_folders()
    }

    /// Files a note under another folder (or at the root)
    pub fn move_note(&mut self, id: NoteId, folder: Option<FolderId>) -> Result<(), DomainError> {
        let mut input = self.find_note(id)?.to_input();
        input.folder_id = folder;
        let updated = self.repository.update_note(id, &input)?;
        self.tabs.update(&updated);
        info!(note_id = id, ?folder, "Moved note");
        self.refresh_notes()
    }

    /// Deletes a folder. The backend removes its notes too, so both collections are reloaded.
    pub fn delete_folder(&mut self, id: FolderId) -> Result<(), DomainError> {
        self.repository.delete_folder(id)?;
        info!(folder_id = id, "Deleted folder");
        if self.selected_folder == Some(id) {
            self.selected_folder = None;
        }
        self.refresh_folders()?;
        self.refresh_notes()
    }

    /// Applies a drag-and-drop gesture; rejected drops change nothing
    pub fn apply_drop(&mut self, request: DropRequest) -> Result<DropOutcome, DomainError> {
        let outcome = FolderTree::resolve_drop(self.hierarchy(), request);
        match &outcome {
            DropOutcome::MoveFolder { folder, new_parent } => {
                self.move_folder(*folder, *new_parent)?
            }
            DropOutcome::MoveNote { note, folder } => self.move_note(*note, *folder)?,
            DropOutcome::Rejected(reason) => warn!(%reason, "Drop rejected"),
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::testing::{folder, note, BackendCall, MockBackend};

    fn workspace(backend: MockBackend) -> NotesWorkspace<MockBackend> {
        let mut ws = NotesWorkspace::new(backend, Duration::from_millis(1000));
        ws.load().expect("Load should succeed");
        ws
    }

    #[test]
    fn given_selected_folder_when_creating_note_then_draft_is_filed_there() {
        // Arrange
        let backend = MockBackend::builder()
            .with_folder(folder(7, "CTF2024", None))
            .build();
        let mut ws = workspace(backend);
        ws.select_folder(7).unwrap();

        // Act
        let key = ws.create_note(None);

        // Assert
        assert_eq!(key, TabKey::Draft);
        assert_eq!(ws.active_note().and_then(OpenNote::folder_id), Some(7));
        assert!(ws.is_editing());
    }

    #[test]
    fn given_draft_when_autosaving_then_single_tab_carries_server_id() {
        // Arrange
        let backend = MockBackend::builder().with_next_id(100).build();
        let mut ws = workspace(backend);
        ws.create_note(None);

        // Act
        let key = ws
            .autosave(NoteFields {
                title: "heap".to_string(),
                content: "tcache".to_string(),
                tags: vec![],
            })
            .unwrap();

        // Assert
        assert_eq!(key, TabKey::Saved(100));
        assert_eq!(ws.tabs().len(), 1);
        assert_eq!(ws.tabs().active_key(), Some(TabKey::Saved(100)));
        assert!(!ws.tabs().contains(TabKey::Draft));
        assert_eq!(ws.notes().len(), 1);
    }

    #[test]
    fn given_promoted_draft_when_autosaving_again_then_updates_instead_of_creating() {
        let backend = MockBackend::builder().with_next_id(5).build();
        let mut ws = workspace(backend);
        ws.create_note(None);
        ws.autosave(NoteFields::default()).unwrap();

        ws.autosave(NoteFields {
            title: "second".to_string(),
            ..NoteFields::default()
        })
        .unwrap();

        let calls = ws.repository().calls();
        assert_eq!(
            calls
                .iter()
                .filter(|c| matches!(c, BackendCall::CreateNote))
                .count(),
            1
        );
        assert!(calls.contains(&BackendCall::UpdateNote(5)));
        assert_eq!(ws.notes()[0].title, "second");
    }

    #[test]
    fn given_failing_create_when_autosaving_draft_then_draft_stays_open() {
        let backend = MockBackend::builder().failing(BackendCall::CreateNote).build();
        let mut ws = workspace(backend);
        ws.create_note(None);

        let result = ws.autosave(NoteFields::default());

        assert!(matches!(result, Err(DomainError::Backend { .. })));
        assert_eq!(ws.tabs().active_key(), Some(TabKey::Draft));
    }

    #[test]
    fn given_open_draft_when_creating_again_then_no_second_draft() {
        let mut ws = workspace(MockBackend::builder().build());
        ws.create_note(None);
        ws.create_note(None);
        assert_eq!(ws.tabs().len(), 1);
    }

    #[test]
    fn given_open_note_when_deleting_then_tab_closes_and_collection_refreshes() {
        let backend = MockBackend::builder()
            .with_note(note(1, "a", None))
            .with_note(note(2, "b", None))
            .build();
        let mut ws = workspace(backend);
        ws.select_note(1).unwrap();
        ws.select_note(2).unwrap();

        ws.delete_note(2).unwrap();

        assert_eq!(ws.notes().len(), 1);
        assert_eq!(ws.tabs().active_key(), Some(TabKey::Saved(1)));
    }

    #[test]
    fn given_edited_note_when_deleting_it_then_editor_follows_remaining_tab() {
        // Arrange
        let backend = MockBackend::builder()
            .with_note(note(1, "keep", None))
            .with_note(note(2, "doomed", None))
            .build();
        let mut ws = workspace(backend);
        ws.select_note(1).unwrap();
        ws.edit_note(2).unwrap();

        // Act
        ws.delete_note(2).unwrap();
        let t0 = Instant::now();
        ws.editor_mut().unwrap().type_text(t0, "x");
        let saved = ws.poll_autosave(t0 + Duration::from_secs(2)).unwrap();

        // Assert
        assert_eq!(saved, Some(TabKey::Saved(1)));
        let kept = ws.notes().iter().find(|n| n.id == 1).unwrap();
        assert_eq!(kept.title, "keep");
        assert_eq!(kept.content, "x");
    }

    #[test]
    fn given_edited_note_when_deleting_it_then_pending_edits_do_not_leak() {
        let backend = MockBackend::builder()
            .with_note(note(1, "keep", None))
            .with_note(note(2, "doomed", None))
            .build();
        let mut ws = workspace(backend);
        ws.select_note(1).unwrap();
        ws.edit_note(2).unwrap();
        let t0 = Instant::now();
        ws.editor_mut().unwrap().set_title(t0, "doomed v2");

        ws.delete_note(2).unwrap();

        assert_eq!(ws.editor().map(NoteEditor::title), Some("keep"));
        assert_eq!(ws.poll_autosave(t0 + Duration::from_secs(2)).unwrap(), None);
        assert!(!ws.repository().calls().contains(&BackendCall::UpdateNote(1)));
    }

    #[test]
    fn given_refresh_failure_when_deleting_note_then_tab_stays_open() {
        let backend = MockBackend::builder()
            .with_note(note(1, "a", None))
            .failing_after(BackendCall::ListNotes, 1)
            .build();
        let mut ws = workspace(backend);
        ws.select_note(1).unwrap();

        let result = ws.delete_note(1);

        assert!(matches!(result, Err(DomainError::Backend { .. })));
        assert!(ws.tabs().contains(TabKey::Saved(1)));
        assert_eq!(ws.tabs().active_key(), Some(TabKey::Saved(1)));
    }

    #[test]
    fn given_note_when_toggling_favorite_then_full_note_is_sent() {
        let backend = MockBackend::builder()
            .with_note(note(1, "keep me", Some(3)))
            .with_folder(folder(3, "web", None))
            .build();
        let mut ws = workspace(backend);

        let flag = ws.toggle_favorite(1).unwrap();

        assert!(flag);
        let stored = &ws.notes()[0];
        assert!(stored.is_favorite);
        assert_eq!(stored.title, "keep me");
        assert_eq!(stored.folder_id, Some(3));
    }

    #[test]
    fn given_folder_move_under_descendant_when_moving_then_cycle_error_and_no_request() {
        let backend = MockBackend::builder()
            .with_folder(folder(1, "root", None))
            .with_folder(folder(2, "child", Some(1)))
            .build();
        let mut ws = workspace(backend);

        let result = ws.move_folder(1, Some(2));

        assert!(matches!(
            result,
            Err(DomainError::FolderCycle { folder: 1, target: 2 })
        ));
        assert!(!ws
            .repository()
            .calls()
            .iter()
            .any(|c| matches!(c, BackendCall::MoveFolder(..))));
    }

    #[test]
    fn given_selected_folder_when_deleted_then_selection_cleared_and_notes_reloaded() {
        let backend = MockBackend::builder()
            .with_folder(folder(1, "tmp", None))
            .with_note(note(9, "inside", Some(1)))
            .build();
        let mut ws = workspace(backend);
        ws.select_folder(1).unwrap();
        ws.select_note(9).unwrap();

        ws.delete_folder(1).unwrap();

        assert_eq!(ws.selected_folder(), None);
        assert!(ws.notes().is_empty());
        assert!(ws.tabs().is_empty());
    }

    #[test]
    fn given_unknown_note_when_selecting_then_not_found() {
        let mut ws = workspace(MockBackend::builder().build());
        assert!(matches!(
            ws.select_note(3),
            Err(DomainError::NoteNotFound(3))
        ));
    }

    #[test]
    fn given_editing_when_closing_active_tab_then_pending_save_is_dropped() {
        let backend = MockBackend::builder().with_note(note(1, "a", None)).build();
        let mut ws = workspace(backend);
        ws.edit_note(1).unwrap();
        let now = Instant::now();
        ws.editor_mut().unwrap().set_title(now, "changed");

        ws.close_tab(TabKey::Saved(1));

        assert!(ws.editor().is_none());
        assert_eq!(
            ws.poll_autosave(now + Duration::from_secs(2)).unwrap(),
            None
        );
    }
}
