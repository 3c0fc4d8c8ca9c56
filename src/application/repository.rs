// src/application/repository.rs
//! Seams between the use cases and the backend
use crate::domain::{
    Challenge, ChallengeForm, DomainError, FileResource, FlagOutcome, Folder, FolderId, NewTool,
    Note, NoteId, NoteInput, Tool,
};
use std::path::Path;

pub trait NoteRepository {
    fn list_notes(&mut self) -> Result<Vec<Note>, DomainError>;

    fn get_note(&mut self, id: NoteId) -> Result<Note, DomainError>;

    /// Persist a new note; the backend assigns the id
    fn create_note(&mut self, input: &NoteInput) -> Result<Note, DomainError>;

    /// Replace all fields of an existing note
    fn update_note(&mut self, id: NoteId, input: &NoteInput) -> Result<Note, DomainError>;

    fn delete_note(&mut self, id: NoteId) -> Result<(), DomainError>;
}

pub trait FolderRepository {
    fn list_folders(&mut self) -> Result<Vec<Folder>, DomainError>;

    fn create_folder(&mut self, name: &str, parent: Option<FolderId>) -> Result<Folder, DomainError>;

    fn move_folder(&mut self, id: FolderId, new_parent: Option<FolderId>) -> Result<(), DomainError>;

    /// Deletes the folder; the backend also deletes the notes filed in it
    fn delete_folder(&mut self, id: FolderId) -> Result<(), DomainError>;
}

pub trait ToolRepository {
    fn list_tools(&mut self, category: Option<&str>) -> Result<Vec<Tool>, DomainError>;

    fn create_tool(&mut self, tool: &NewTool) -> Result<Tool, DomainError>;

    fn delete_tool(&mut self, id: i64) -> Result<(), DomainError>;
}

pub trait ChallengeRepository {
    fn list_challenges(&mut self) -> Result<Vec<Challenge>, DomainError>;

    fn get_challenge(&mut self, id: i64) -> Result<Challenge, DomainError>;

    fn create_challenge(&mut self, form: &ChallengeForm) -> Result<Challenge, DomainError>;

    fn update_challenge(&mut self, id: i64, form: &ChallengeForm) -> Result<Challenge, DomainError>;

    fn delete_challenge(&mut self, id: i64) -> Result<(), DomainError>;

    fn toggle_solved(&mut self, id: i64) -> Result<Challenge, DomainError>;

    fn check_flag(&mut self, id: i64, flag: &str) -> Result<FlagOutcome, DomainError>;

    /// Multipart upload of a local file as a challenge attachment
    fn upload_file(&mut self, id: i64, path: &Path) -> Result<FileResource, DomainError>;

    fn download_file(&mut self, id: i64, filename: &str) -> Result<Vec<u8>, DomainError>;

    fn delete_file(&mut self, id: i64, filename: &str) -> Result<(), DomainError>;
}
