// src/domain/mod.rs
pub mod challenge;
pub mod error;
pub mod folder;
pub mod note;
pub mod tool;

pub use challenge::{Challenge, ChallengeForm, ChallengeResources, FileResource, FlagOutcome};
pub use error::{DomainError, ValidationError};
pub use folder::{Folder, FolderId};
pub use note::{Note, NoteDraft, NoteFields, NoteId, NoteInput, OpenNote, TabKey};
pub use tool::{NewTool, Tool};
