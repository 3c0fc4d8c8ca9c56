// src/application/note_list.rs
use crate::domain::{FolderId, Note, NoteId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteAction {
    Open,
    ToggleFavorite,
    Edit,
    Delete,
}

/// Workspace request produced by a row action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteCommand {
    Open(NoteId),
    SetFavorite(NoteId, bool),
    Edit(NoteId),
    Delete(NoteId),
}

/// Notes of the selected folder, or the unfiled notes when no folder is selected
#[derive(Debug, Clone)]
pub struct NoteList<'a> {
    notes: Vec<&'a Note>,
}

impl<'a> NoteList<'a> {
    pub fn scoped(notes: &'a [Note], selected: Option<FolderId>) -> Self {
        Self {
            notes: notes.iter().filter(|n| n.folder_id == selected).collect(),
        }
    }

    pub fn notes(&self) -> &[&'a Note] {
        &self.notes
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Maps a row action to a command; `None` if the note is not in this list
    pub fn resolve(&self, id: NoteId, action: NoteAction) -> Option<NoteCommand> {
        let note = self.notes.iter().find(|n| n.id == id)?;
        Some(match action {
            NoteAction::Open => NoteCommand::Open(id),
            NoteAction::ToggleFavorite => NoteCommand::SetFavorite(id, !note.is_favorite),
            NoteAction::Edit => NoteCommand::Edit(id),
            NoteAction::Delete => NoteCommand::Delete(id),
        })
    }
}
