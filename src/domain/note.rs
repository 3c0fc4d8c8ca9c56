// src/domain/note.rs
use crate::constants::DRAFT_NOTE_TITLE;
use crate::domain::FolderId;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type NoteId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_favorite: bool,
    pub folder_id: Option<FolderId>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Note {
    pub fn fields(&self) -> NoteFields {
        NoteFields {
            title: self.title.clone(),
            content: self.content.clone(),
            tags: self.tags.clone(),
        }
    }

    /// Full request body for this note with the editable fields replaced.
    /// The backend overwrites every column on update, so nothing may be left out.
    pub fn input_with(&self, fields: NoteFields) -> NoteInput {
        NoteInput {
            title: fields.title,
            content: fields.content,
            tags: fields.tags,
            is_favorite: self.is_favorite,
            folder_id: self.folder_id,
        }
    }

    pub fn to_input(&self) -> NoteInput {
        self.input_with(self.fields())
    }
}

/// Editable part of a note, the payload produced by the autosave timer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFields {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

/// Create/update request body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteInput {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub is_favorite: bool,
    pub folder_id: Option<FolderId>,
}

/// A note that exists only locally until its first save completes
#[derive(Debug, Clone, PartialEq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub folder_id: Option<FolderId>,
}

impl NoteDraft {
    pub fn new(folder_id: Option<FolderId>) -> Self {
        Self {
            title: DRAFT_NOTE_TITLE.to_string(),
            content: String::new(),
            tags: vec![],
            folder_id,
        }
    }

    pub fn input_with(&self, fields: NoteFields) -> NoteInput {
        NoteInput {
            title: fields.title,
            content: fields.content,
            tags: fields.tags,
            is_favorite: false,
            folder_id: self.folder_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TabKey {
    Draft,
    Saved(NoteId),
}

impl fmt::Display for TabKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TabKey::Draft => write!(f, "draft"),
            TabKey::Saved(id) => write!(f, "{}", id),
        }
    }
}

/// Entry of the open-tab strip
#[derive(Debug, Clone, PartialEq)]
pub enum OpenNote {
    Draft(NoteDraft),
    Persisted(Note),
}

impl OpenNote {
    pub fn key(&self) -> TabKey {
        match self {
            OpenNote::Draft(_) => TabKey::Draft,
            OpenNote::Persisted(note) => TabKey::Saved(note.id),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            OpenNote::Draft(draft) => &draft.title,
            OpenNote::Persisted(note) => &note.title,
        }
    }

    pub fn folder_id(&self) -> Option<FolderId> {
        match self {
            OpenNote::Draft(draft) => draft.folder_id,
            OpenNote::Persisted(note) => note.folder_id,
        }
    }

    pub fn fields(&self) -> NoteFields {
        match self {
            OpenNote::Draft(draft) => NoteFields {
                title: draft.title.clone(),
                content: draft.content.clone(),
                tags: draft.tags.clone(),
            },
            OpenNote::Persisted(note) => note.fields(),
        }
    }

    pub fn is_draft(&self) -> bool {
        matches!(self, OpenNote::Draft(_))
    }
}
