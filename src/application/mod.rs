// src/application/mod.rs
pub mod challenge_catalogue;
pub mod debounce;
pub mod folder_tree;
pub mod markdown;
pub mod note_editor;
pub mod note_list;
pub mod note_tabs;
pub mod notes_workspace;
pub mod repository;
pub mod tool_catalogue;

pub use challenge_catalogue::{ChallengeCatalogue, ChallengeSort, SortDirection, SortField};
pub use folder_tree::{DragSource, DropOutcome, DropRequest, FolderTree, Hierarchy, ItemKind};
pub use note_editor::NoteEditor;
pub use note_list::{NoteAction, NoteCommand, NoteList};
pub use note_tabs::NoteTabs;
pub use notes_workspace::NotesWorkspace;
pub use repository::{ChallengeRepository, FolderRepository, NoteRepository, ToolRepository};
pub use tool_catalogue::ToolCatalogue;
