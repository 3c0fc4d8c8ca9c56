// src/util/testing.rs

use anyhow::Result;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::env;
use std::mem::{discriminant, Discriminant};
use std::path::Path;
use tracing::{debug, info};
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::application::{ChallengeRepository, FolderRepository, NoteRepository, ToolRepository};
use crate::domain::{
    Challenge, ChallengeForm, DomainError, FileResource, FlagOutcome, Folder, FolderId, NewTool,
    Note, NoteId, NoteInput, Tool,
};

/// Every backend request the mock has seen, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    ListNotes,
    GetNote(NoteId),
    CreateNote,
    UpdateNote(NoteId),
    DeleteNote(NoteId),
    ListFolders,
    CreateFolder,
    MoveFolder(FolderId, Option<FolderId>),
    DeleteFolder(FolderId),
    ListTools,
    CreateTool,
    DeleteTool(i64),
    ListChallenges,
    GetChallenge(i64),
    CreateChallenge,
    UpdateChallenge(i64),
    DeleteChallenge(i64),
    ToggleSolved(i64),
    CheckFlag(i64),
    UploadFile(i64),
    DownloadFile(i64),
    DeleteFile(i64),
}

pub fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .expect("valid fixture date")
}

fn stamp(id: i64) -> NaiveDateTime {
    base_time() + Duration::minutes(id)
}

pub fn note(id: NoteId, title: &str, folder_id: Option<FolderId>) -> Note {
    Note {
        id,
        title: title.to_string(),
        content: String::new(),
        tags: vec![],
        is_favorite: false,
        folder_id,
        created_at: stamp(id),
        updated_at: stamp(id),
    }
}

pub fn folder(id: FolderId, name: &str, parent_id: Option<FolderId>) -> Folder {
    Folder {
        id,
        name: name.to_string(),
        parent_id,
        created_at: stamp(id),
        updated_at: stamp(id),
    }
}

pub fn tool(id: i64, name: &str, category: &str) -> Tool {
    Tool {
        id,
        name: name.to_string(),
        category: category.to_string(),
        description: None,
        command: None,
        url: None,
        created_at: Some(stamp(id)),
    }
}

pub fn challenge(id: i64, title: &str, solved: bool) -> Challenge {
    Challenge {
        id,
        title: title.to_string(),
        description: String::new(),
        category: "Misc".to_string(),
        difficulty: "Easy".to_string(),
        points: 0,
        solved,
        correct_flag: None,
        resources: Default::default(),
        created_at: stamp(id),
        updated_at: stamp(id),
    }
}

/// In-memory backend implementing every repository trait.
///
/// Behaves like the REST backend closely enough for the use cases: ids are
/// assigned on create, updates replace all fields, deleting a folder deletes
/// the notes filed directly in it.
///
/// # Examples
///
/// ```
/// use ctfdesk::util::testing::{note, MockBackend};
///
/// let mock = MockBackend::builder()
///     .with_note(note(1, "recon", None))
///     .with_next_id(10)
///     .build();
/// assert!(mock.calls().is_empty());
/// ```
pub struct MockBackend {
    notes: Vec<Note>,
    folders: Vec<Folder>,
    tools: Vec<Tool>,
    challenges: Vec<Challenge>,
    flags: HashMap<i64, String>,
    files: HashMap<(i64, String), Vec<u8>>,
    next_id: i64,
    /// Call kinds that fail, each with the number of calls still allowed to succeed first
    failing: Vec<(Discriminant<BackendCall>, usize)>,
    calls: Vec<BackendCall>,
}

impl MockBackend {
    pub fn builder() -> MockBackendBuilder {
        MockBackendBuilder::new()
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    fn record(&mut self, call: BackendCall) -> Result<(), DomainError> {
        let kind = discriminant(&call);
        let fails = match self.failing.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, 0)) => true,
            Some((_, remaining)) => {
                *remaining -= 1;
                false
            }
            None => false,
        };
        self.calls.push(call);
        if fails {
            return Err(DomainError::Backend {
                status: 500,
                detail: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn challenge_mut(&mut self, id: i64) -> Result<&mut Challenge, DomainError> {
        self.challenges
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(DomainError::ChallengeNotFound(id))
    }
}

impl NoteRepository for MockBackend {
    fn list_notes(&mut self) -> Result<Vec<Note>, DomainError> {
        self.record(BackendCall::ListNotes)?;
        Ok(self.notes.clone())
    }

    fn get_note(&mut self, id: NoteId) -> Result<Note, DomainError> {
        self.record(BackendCall::GetNote(id))?;
        self.notes
            .iter()
            .find(|n| n.id == id)
            .cloned()
            .ok_or(DomainError::NoteNotFound(id))
    }

    fn create_note(&mut self, input: &NoteInput) -> Result<Note, DomainError> {
        self.record(BackendCall::CreateNote)?;
        let id = self.allocate_id();
        let created = Note {
            id,
            title: input.title.clone(),
            content: input.content.clone(),
            tags: input.tags.clone(),
            is_favorite: input.is_favorite,
            folder_id: input.folder_id,
            created_at: stamp(id),
            updated_at: stamp(id),
        };
        self.notes.push(created.clone());
        Ok(created)
    }

    fn update_note(&mut self, id: NoteId, input: &NoteInput) -> Result<Note, DomainError> {
        self.record(BackendCall::UpdateNote(id))?;
        let stored = self
            .notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(DomainError::NoteNotFound(id))?;
        stored.title = input.title.clone();
        stored.content = input.content.clone();
        stored.tags = input.tags.clone();
        stored.is_favorite = input.is_favorite;
        stored.folder_id = input.folder_id;
        Ok(stored.clone())
    }

    fn delete_note(&mut self, id: NoteId) -> Result<(), DomainError> {
        self.record(BackendCall::DeleteNote(id))?;
        let before = self.notes.len();
        self.notes.retain(|n| n.id != id);
        if self.notes.len() == before {
            return Err(DomainError::NoteNotFound(id));
        }
        Ok(())
    }
}

impl FolderRepository for MockBackend {
    fn list_folders(&mut self) -> Result<Vec<Folder>, DomainError> {
        self.record(BackendCall::ListFolders)?;
        Ok(self.folders.clone())
    }

    fn create_folder(&mut self, name: &str, parent: Option<FolderId>) -> Result<Folder, DomainError> {
        self.record(BackendCall::CreateFolder)?;
        let id = self.allocate_id();
        let created = folder(id, name, parent);
        self.folders.push(created.clone());
        Ok(created)
    }

    fn move_folder(&mut self, id: FolderId, new_parent: Option<FolderId>) -> Result<(), DomainError> {
        self.record(BackendCall::MoveFolder(id, new_parent))?;
        let stored = self
            .folders
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or(DomainError::FolderNotFound(id))?;
        stored.parent_id = new_parent;
        Ok(())
    }

    fn delete_folder(&mut self, id: FolderId) -> Result<(), DomainError> {
        self.record(BackendCall::DeleteFolder(id))?;
        let before = self.folders.len();
        self.folders.retain(|f| f.id != id);
        if self.folders.len() == before {
            return Err(DomainError::FolderNotFound(id));
        }
        self.notes.retain(|n| n.folder_id != Some(id));
        Ok(())
    }
}

impl ToolRepository for MockBackend {
    fn list_tools(&mut self, category: Option<&str>) -> Result<Vec<Tool>, DomainError> {
        self.record(BackendCall::ListTools)?;
        Ok(self
            .tools
            .iter()
            .filter(|t| category.map_or(true, |c| t.category == c))
            .cloned()
            .collect())
    }

    fn create_tool(&mut self, new: &NewTool) -> Result<Tool, DomainError> {
        self.record(BackendCall::CreateTool)?;
        let id = self.allocate_id();
        let created = Tool {
            description: new.description.clone(),
            command: new.command.clone(),
            url: new.url.clone(),
            ..tool(id, &new.name, &new.category)
        };
        self.tools.push(created.clone());
        Ok(created)
    }

    fn delete_tool(&mut self, id: i64) -> Result<(), DomainError> {
        self.record(BackendCall::DeleteTool(id))?;
        let before = self.tools.len();
        self.tools.retain(|t| t.id != id);
        if self.tools.len() == before {
            return Err(DomainError::ToolNotFound(id));
        }
        Ok(())
    }
}

impl ChallengeRepository for MockBackend {
    fn list_challenges(&mut self) -> Result<Vec<Challenge>, DomainError> {
        self.record(BackendCall::ListChallenges)?;
        Ok(self.challenges.clone())
    }

    fn get_challenge(&mut self, id: i64) -> Result<Challenge, DomainError> {
        self.record(BackendCall::GetChallenge(id))?;
        self.challenge_mut(id).map(|c| c.clone())
    }

    fn create_challenge(&mut self, form: &ChallengeForm) -> Result<Challenge, DomainError> {
        self.record(BackendCall::CreateChallenge)?;
        let id = self.allocate_id();
        let mut created = challenge(id, &form.title, false);
        created.description = form.description.clone();
        created.category = form.category.clone();
        created.difficulty = form.difficulty.clone();
        created.correct_flag = Some(form.correct_flag.clone()).filter(|f| !f.is_empty());
        created.resources = form.resources.clone();
        self.challenges.push(created.clone());
        Ok(created)
    }

    fn update_challenge(&mut self, id: i64, form: &ChallengeForm) -> Result<Challenge, DomainError> {
        self.record(BackendCall::UpdateChallenge(id))?;
        let stored = self.challenge_mut(id)?;
        stored.title = form.title.clone();
        stored.description = form.description.clone();
        stored.category = form.category.clone();
        stored.difficulty = form.difficulty.clone();
        stored.correct_flag = Some(form.correct_flag.clone()).filter(|f| !f.is_empty());
        stored.resources = form.resources.clone();
        Ok(stored.clone())
    }

    fn delete_challenge(&mut self, id: i64) -> Result<(), DomainError> {
        self.record(BackendCall::DeleteChallenge(id))?;
        self.challenge_mut(id)?;
        self.challenges.retain(|c| c.id != id);
        Ok(())
    }

    fn toggle_solved(&mut self, id: i64) -> Result<Challenge, DomainError> {
        self.record(BackendCall::ToggleSolved(id))?;
        let stored = self.challenge_mut(id)?;
        stored.solved = !stored.solved;
        Ok(stored.clone())
    }

    fn check_flag(&mut self, id: i64, flag: &str) -> Result<FlagOutcome, DomainError> {
        self.record(BackendCall::CheckFlag(id))?;
        self.challenge_mut(id)?;
        Ok(match self.flags.get(&id) {
            Some(expected) if expected == flag => FlagOutcome::Correct,
            _ => FlagOutcome::Incorrect {
                message: Some("Flag incorrect".to_string()),
            },
        })
    }

    fn upload_file(&mut self, id: i64, path: &Path) -> Result<FileResource, DomainError> {
        self.record(BackendCall::UploadFile(id))?;
        let original_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| DomainError::Io(format!("not a file: {}", path.display())))?;
        let filename = format!("{}_{}", id, original_name);
        self.files.insert((id, filename.clone()), vec![]);
        Ok(FileResource {
            filename,
            original_name,
        })
    }

    fn download_file(&mut self, id: i64, filename: &str) -> Result<Vec<u8>, DomainError> {
        self.record(BackendCall::DownloadFile(id))?;
        self.files
            .get(&(id, filename.to_string()))
            .cloned()
            .ok_or_else(|| DomainError::Backend {
                status: 404,
                detail: "File not found".to_string(),
            })
    }

    fn delete_file(&mut self, id: i64, filename: &str) -> Result<(), DomainError> {
        self.record(BackendCall::DeleteFile(id))?;
        self.files.remove(&(id, filename.to_string()));
        let stored = self.challenge_mut(id)?;
        stored.resources.files.retain(|f| f.filename != filename);
        Ok(())
    }
}

/// Builder for MockBackend
///
/// Provides a fluent interface for seeding data and configuring failures.
pub struct MockBackendBuilder {
    backend: MockBackend,
}

impl MockBackendBuilder {
    pub fn new() -> Self {
        Self {
            backend: MockBackend {
                notes: vec![],
                folders: vec![],
                tools: vec![],
                challenges: vec![],
                flags: HashMap::new(),
                files: HashMap::new(),
                next_id: 1000,
                failing: vec![],
                calls: vec![],
            },
        }
    }

    pub fn with_note(mut self, note: Note) -> Self {
        self.backend.notes.push(note);
        self
    }

    pub fn with_folder(mut self, folder: Folder) -> Self {
        self.backend.folders.push(folder);
        self
    }

    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.backend.tools.push(tool);
        self
    }

    pub fn with_challenge(mut self, challenge: Challenge) -> Self {
        self.backend.challenges.push(challenge);
        self
    }

    /// Flag accepted by check_flag for a challenge
    pub fn with_flag(mut self, challenge_id: i64, flag: &str) -> Self {
        self.backend.flags.insert(challenge_id, flag.to_string());
        self
    }

    pub fn with_file(mut self, challenge_id: i64, filename: &str, bytes: Vec<u8>) -> Self {
        self.backend
            .files
            .insert((challenge_id, filename.to_string()), bytes);
        self
    }

    /// Id handed out by the next create call
    pub fn with_next_id(mut self, id: i64) -> Self {
        self.backend.next_id = id;
        self
    }

    /// Every call of the same kind as `call` fails with a backend error; arguments are ignored
    pub fn failing(self, call: BackendCall) -> Self {
        self.failing_after(call, 0)
    }

    /// Like `failing`, but the first `successes` calls of that kind still go through
    pub fn failing_after(mut self, call: BackendCall, successes: usize) -> Self {
        self.backend.failing.push((discriminant(&call), successes));
        self
    }

    pub fn build(self) -> MockBackend {
        self.backend
    }
}

impl Default for MockBackendBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn init_test_setup() -> Result<()> {
    // Set up logging first
    setup_test_logging();

    info!("Test Setup complete");
    Ok(())
}

fn setup_test_logging() {
    debug!("INIT: Attempting logger init from testing.rs");
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "trace");
    }

    // Create a filter for noisy modules
    let noisy_modules = ["reqwest", "hyper", "rustls", "mio"];
    let module_filter = filter_fn(move |metadata| {
        !noisy_modules
            .iter()
            .any(|name| metadata.target().starts_with(name))
    });

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(module_filter)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}
