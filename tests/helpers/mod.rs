use ctfdesk::application::NotesWorkspace;
use ctfdesk::util::testing::{challenge, folder, note, BackendCall, MockBackend, MockBackendBuilder};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

pub const QUIET: Duration = Duration::from_millis(1000);

/// Ids of the seeded CTF workspace
#[allow(dead_code)]
pub mod ids {
    pub const CTF2024: i64 = 1;
    pub const WEB: i64 = 2;
    pub const PWN: i64 = 3;
    pub const HEAP: i64 = 4;
    pub const ARCHIVE: i64 = 5;

    pub const SQLI_NOTE: i64 = 10;
    pub const TCACHE_NOTE: i64 = 11;
    pub const TODO_NOTE: i64 = 12;

    pub const BABY_ROP: i64 = 20;
    pub const PADDING_ORACLE: i64 = 21;

    pub const NEXT: i64 = 100;
}

/// CTF2024/{web, pwn/heap}, archive/ plus a few notes
pub fn ctf_backend() -> MockBackendBuilder {
    let mut sqli = note(ids::SQLI_NOTE, "SQLi cheatsheet", Some(ids::WEB));
    sqli.content = "' OR 1=1 --".to_string();
    sqli.tags = vec!["web".to_string()];

    MockBackend::builder()
        .with_folder(folder(ids::CTF2024, "CTF2024", None))
        .with_folder(folder(ids::WEB, "web", Some(ids::CTF2024)))
        .with_folder(folder(ids::PWN, "pwn", Some(ids::CTF2024)))
        .with_folder(folder(ids::HEAP, "heap", Some(ids::PWN)))
        .with_folder(folder(ids::ARCHIVE, "archive", None))
        .with_note(sqli)
        .with_note(note(ids::TCACHE_NOTE, "tcache poisoning", Some(ids::HEAP)))
        .with_note(note(ids::TODO_NOTE, "todo", None))
        .with_challenge(challenge(ids::BABY_ROP, "Baby ROP", false))
        .with_challenge(challenge(ids::PADDING_ORACLE, "Padding Oracle", true))
        .with_next_id(ids::NEXT)
}

#[allow(dead_code)]
pub fn workspace(backend: MockBackend) -> NotesWorkspace<MockBackend> {
    let mut ws = NotesWorkspace::new(backend, QUIET);
    ws.load().expect("Loading seeded workspace should succeed");
    ws
}

#[allow(dead_code)]
pub fn count_calls(calls: &[BackendCall], predicate: impl Fn(&BackendCall) -> bool) -> usize {
    calls.iter().filter(|c| predicate(c)).count()
}

/// Temporary files to attach to challenges
#[allow(dead_code)]
pub struct TestUploads {
    _temp_dir: TempDir,
    pub paths: Vec<PathBuf>,
}

#[allow(dead_code)]
impl TestUploads {
    pub fn new(names: &[&str]) -> Result<Self> {
        let temp_dir = tempfile::tempdir().context("Failed to create temporary directory")?;
        let paths = names
            .iter()
            .map(|name| {
                let path = temp_dir.path().join(name);
                std::fs::write(&path, format!("contents of {name}"))
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                Ok(path)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            _temp_dir: temp_dir,
            paths,
        })
    }

    pub fn dir(&self) -> &std::path::Path {
        self._temp_dir.path()
    }
}
