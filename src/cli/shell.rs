// src/cli/shell.rs
//! Line-oriented notes workspace. Stdin is read on its own thread so the
//! autosave debounce keeps ticking while the user is idle.
use crate::application::folder_tree::{ContextAction, FolderCommand};
use crate::application::markdown::MarkdownSnippet;
use crate::application::{
    DragSource, DropOutcome, DropRequest, FolderRepository, FolderTree, ItemKind, NoteAction,
    NoteCommand, NoteEditor, NoteRepository, NotesWorkspace,
};
use crate::domain::{DomainError, FolderId, TabKey};
use crate::ports::terminal::{render_editor, render_note_list, render_open_note, render_tabs, render_tree};
use std::io::{BufRead, Write};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

const HELP: &str = "\
navigation: tree | ls | tabs | open ID | edit [ID] | new [FOLDER] | tab ID|draft | close [ID|draft] | show
editing:    title TEXT | type TEXT | tag NAME | untag NAME | select START END | fmt SNIPPET | key CHORD | save
notes:      fav ID | rm ID
folders:    cd ID|/ | expand ID | mkdir NAME [PARENT] | rmdir ID | drop folder|note ID TARGET|/
            menu FOLDER|/ new-folder NAME | new-note | delete
other:      help | quit
";

#[derive(Error, Debug)]
pub enum ShellError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("{0}")]
    Usage(String),
}

impl ShellError {
    pub fn user_message(&self) -> String {
        match self {
            ShellError::Domain(e) => e.user_message(),
            ShellError::Usage(msg) => msg.clone(),
        }
    }
}

fn usage(msg: impl Into<String>) -> ShellError {
    ShellError::Usage(msg.into())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Continue(String),
    Quit,
}

pub struct Shell<R: NoteRepository + FolderRepository> {
    workspace: NotesWorkspace<R>,
}

impl<R: NoteRepository + FolderRepository> Shell<R> {
    pub fn new(workspace: NotesWorkspace<R>) -> Self {
        Self { workspace }
    }

    pub fn workspace(&self) -> &NotesWorkspace<R> {
        &self.workspace
    }

    /// Saves the active note if its quiet period is over
    pub fn tick(&mut self, now: Instant) -> Result<Option<String>, ShellError> {
        let saved = self.workspace.poll_autosave(now)?;
        Ok(saved.map(|key| format!("saved {key}\n")))
    }

    /// Pending edits are written before the shell exits
    pub fn finish(&mut self) -> Result<(), ShellError> {
        if let Some(key) = self.workspace.flush_autosave()? {
            info!(%key, "Flushed pending edits on exit");
        }
        Ok(())
    }

    pub fn execute(&mut self, line: &str, now: Instant) -> Result<Outcome, ShellError> {
        let line = line.trim();
        let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        debug!(command, rest, "Shell command");

        let output = match command {
            "" => String::new(),
            "help" | "?" => HELP.to_string(),
            "quit" | "exit" | "q" => {
                self.finish()?;
                return Ok(Outcome::Quit);
            }
            "tree" => self.render_tree(),
            "ls" => render_note_list(&self.workspace.note_list()),
            "tabs" => render_tabs(self.workspace.tabs()),
            "show" => self.render_active()?,
            "open" => {
                self.row_action(rest, NoteAction::Open)?;
                self.render_active()?
            }
            "edit" => {
                if rest.is_empty() {
                    self.workspace.start_editing()?;
                } else {
                    self.row_action(rest, NoteAction::Edit)?;
                }
                self.render_active()?
            }
            "new" => {
                let folder = parse_optional_id(rest)?;
                self.navigate()?;
                self.workspace.create_note(folder);
                self.render_active()?
            }
            "tab" => {
                let key = parse_tab_key(rest)?;
                self.navigate()?;
                if !self.workspace.activate_tab(key) {
                    return Err(usage(format!("no open tab {key}")));
                }
                render_tabs(self.workspace.tabs())
            }
            "close" => {
                let key = match rest {
                    "" => self
                        .workspace
                        .tabs()
                        .active_key()
                        .ok_or(DomainError::NoActiveNote)?,
                    other => parse_tab_key(other)?,
                };
                self.navigate()?;
                if !self.workspace.close_tab(key) {
                    return Err(usage(format!("no open tab {key}")));
                }
                render_tabs(self.workspace.tabs())
            }
            "title" => {
                self.editor()?.set_title(now, rest);
                String::new()
            }
            "type" => {
                self.editor()?.type_text(now, &unescape(rest));
                String::new()
            }
            "tag" => {
                require(rest, "tag NAME")?;
                self.editor()?.add_tag(now, rest);
                String::new()
            }
            "untag" => {
                require(rest, "untag NAME")?;
                self.editor()?.remove_tag(now, rest);
                String::new()
            }
            "select" => {
                let (start, end) = rest
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| usage("select START END"))?;
                let start = parse_offset(start)?;
                let end = parse_offset(end)?;
                self.editor()?.select(start, end);
                String::new()
            }
            "fmt" => {
                let snippet = MarkdownSnippet::from_name(rest).ok_or_else(|| {
                    let names: Vec<_> = MarkdownSnippet::ALL.iter().map(|s| s.name()).collect();
                    usage(format!("fmt {}", names.join("|")))
                })?;
                let editor = self.editor()?;
                editor.insert_markdown(now, snippet);
                render_editor(editor)
            }
            "key" => {
                let editor = self.editor()?;
                if !editor.apply_shortcut(now, rest) {
                    return Err(usage(format!("unknown shortcut: {rest}")));
                }
                render_editor(editor)
            }
            "save" => match self.workspace.flush_autosave()? {
                Some(key) => format!("saved {key}\n"),
                None => "nothing to save\n".to_string(),
            },
            "fav" => match self.row_action(rest, NoteAction::ToggleFavorite)? {
                NoteCommand::SetFavorite(id, favorite) => format!("{id} favorite: {favorite}\n"),
                _ => String::new(),
            },
            "rm" => match self.row_action(rest, NoteAction::Delete)? {
                NoteCommand::Delete(id) => format!("deleted note {id}\n"),
                _ => String::new(),
            },
            "cd" => {
                match rest {
                    "/" | "" => self.workspace.clear_folder_selection(),
                    other => self.workspace.select_folder(parse_id(other)?)?,
                }
                render_note_list(&self.workspace.note_list())
            }
            "expand" => {
                let id = parse_id(rest)?;
                self.workspace.tree_mut().toggle(id);
                self.render_tree()
            }
            "mkdir" => {
                let (name, parent) = split_name_and_parent(rest)?;
                let folder = self.workspace.create_folder(name, parent)?;
                format!("created folder {} [{}]\n", folder.name, folder.id)
            }
            "rmdir" => {
                let id = parse_id(rest)?;
                self.navigate()?;
                self.workspace.delete_folder(id)?;
                format!("deleted folder {id}\n")
            }
            "drop" => self.drop(rest)?,
            "menu" => self.menu(rest)?,
            other => return Err(usage(format!("unknown command: {other} (try `help`)"))),
        };
        Ok(Outcome::Continue(output))
    }

    /// Acts on a row of the current folder's note list, like clicking it
    fn row_action(&mut self, rest: &str, action: NoteAction) -> Result<NoteCommand, ShellError> {
        let id = parse_id(rest)?;
        if action != NoteAction::ToggleFavorite {
            self.navigate()?;
        }
        let command = self
            .workspace
            .note_list()
            .resolve(id, action)
            .ok_or_else(|| usage(format!("note {id} is not listed here (`cd` to its folder)")))?;
        self.workspace.run_note_command(command)?;
        Ok(command)
    }

    /// Leaving the active note writes its pending edits first
    fn navigate(&mut self) -> Result<(), ShellError> {
        self.workspace.flush_autosave()?;
        Ok(())
    }

    fn editor(&mut self) -> Result<&mut NoteEditor, ShellError> {
        self.workspace
            .editor_mut()
            .ok_or_else(|| usage("no note in edit mode (use `edit` or `new`)"))
    }

    fn render_tree(&self) -> String {
        let rows = self.workspace.tree().visible_rows(self.workspace.hierarchy());
        render_tree(&rows, self.workspace.selected_folder())
    }

    fn render_active(&self) -> Result<String, ShellError> {
        let mut out = render_tabs(self.workspace.tabs());
        match (self.workspace.editor(), self.workspace.active_note()) {
            (Some(editor), _) => out.push_str(&render_editor(editor)),
            (None, Some(note)) => out.push_str(&render_open_note(note)),
            (None, None) => return Err(DomainError::NoActiveNote.into()),
        }
        Ok(out)
    }

    fn drop(&mut self, rest: &str) -> Result<String, ShellError> {
        let parts: Vec<&str> = rest.split_whitespace().collect();
        let [kind, id, target] = parts.as_slice() else {
            return Err(usage("drop folder|note ID TARGET|/"));
        };
        let kind = match *kind {
            "folder" => ItemKind::Folder,
            "note" => ItemKind::Note,
            other => return Err(usage(format!("cannot drag a {other}"))),
        };
        let request = DropRequest {
            source: DragSource {
                id: parse_id(id)?,
                kind,
            },
            target: parse_folder_target(target)?,
        };
        match self.workspace.apply_drop(request)? {
            DropOutcome::Rejected(reason) => Err(usage(reason)),
            DropOutcome::MoveFolder { folder, new_parent } => {
                Ok(format!("moved folder {folder} to {}\n", describe(new_parent)))
            }
            DropOutcome::MoveNote { note, folder } => {
                Ok(format!("moved note {note} to {}\n", describe(folder)))
            }
        }
    }

    fn menu(&mut self, rest: &str) -> Result<String, ShellError> {
        let mut parts = rest.splitn(3, char::is_whitespace);
        let folder = parse_folder_target(parts.next().unwrap_or_default())?;
        let action = match parts.next().unwrap_or_default() {
            "new-folder" => ContextAction::NewFolder,
            "new-note" => ContextAction::NewNote,
            "delete" => ContextAction::Delete,
            _ => return Err(usage("menu FOLDER|/ new-folder NAME | new-note | delete")),
        };
        let command = FolderTree::context_command(folder, action)
            .ok_or_else(|| usage("the root level cannot be deleted"))?;
        match command {
            FolderCommand::CreateFolder { parent } => {
                let name = parts.next().unwrap_or_default();
                let folder = self.workspace.create_folder(name, parent)?;
                Ok(format!("created folder {} [{}]\n", folder.name, folder.id))
            }
            FolderCommand::CreateNote { folder } => {
                self.navigate()?;
                self.workspace.create_note(folder);
                self.render_active()
            }
            FolderCommand::DeleteFolder(id) => {
                self.navigate()?;
                self.workspace.delete_folder(id)?;
                Ok(format!("deleted folder {id}\n"))
            }
        }
    }
}

fn describe(folder: Option<FolderId>) -> String {
    folder.map_or_else(|| "/".to_string(), |id| id.to_string())
}

fn require(value: &str, hint: &str) -> Result<(), ShellError> {
    if value.is_empty() {
        Err(usage(hint))
    } else {
        Ok(())
    }
}

fn parse_id(value: &str) -> Result<i64, ShellError> {
    value
        .trim()
        .parse()
        .map_err(|_| usage(format!("expected a numeric id, got '{value}'")))
}

/// `NAME [PARENT]`: a trailing numeric token is the parent folder id
fn split_name_and_parent(value: &str) -> Result<(&str, Option<FolderId>), ShellError> {
    let (name, parent) = match value.rsplit_once(char::is_whitespace) {
        Some((name, last)) => match last.parse::<FolderId>() {
            Ok(parent) => (name.trim(), Some(parent)),
            Err(_) => (value, None),
        },
        None => (value, None),
    };
    if name.is_empty() {
        return Err(usage("mkdir NAME [PARENT]"));
    }
    Ok((name, parent))
}

fn parse_optional_id(value: &str) -> Result<Option<i64>, ShellError> {
    if value.is_empty() {
        Ok(None)
    } else {
        parse_id(value).map(Some)
    }
}

fn parse_offset(value: &str) -> Result<usize, ShellError> {
    value
        .trim()
        .parse()
        .map_err(|_| usage(format!("expected a byte offset, got '{value}'")))
}

fn parse_folder_target(value: &str) -> Result<Option<FolderId>, ShellError> {
    match value.trim() {
        "/" => Ok(None),
        "" => Err(usage("expected a folder id or / for the root")),
        other => parse_id(other).map(Some),
    }
}

fn parse_tab_key(value: &str) -> Result<TabKey, ShellError> {
    match value.trim() {
        "draft" => Ok(TabKey::Draft),
        other => parse_id(other).map(TabKey::Saved),
    }
}

/// `\n` and `\t` typed literally become real line breaks and tabs
fn unescape(text: &str) -> String {
    text.replace("\\n", "\n").replace("\\t", "\t")
}

fn report(out: &mut impl Write, error: &ShellError) -> std::io::Result<()> {
    warn!(error = %error, "Command failed");
    writeln!(out, "error: {}", error.user_message())
}

/// Drives the shell until `quit` or end of input.
///
/// Between lines the loop waits at most until the editor's save deadline, so
/// an idle user still gets their edits saved one quiet period after typing.
pub fn run<R, I, W>(mut shell: Shell<R>, input: I, out: &mut W) -> anyhow::Result<()>
where
    R: NoteRepository + FolderRepository,
    I: BufRead + Send + 'static,
    W: Write,
{
    let (tx, rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        for line in input.lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    write!(out, "{}", shell.render_tree())?;
    write!(out, "> ")?;
    out.flush()?;
    loop {
        let received = match shell.workspace().next_autosave_in(Instant::now()) {
            Some(wait) => rx.recv_timeout(wait),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match received {
            Ok(line) => {
                match shell.execute(&line, Instant::now()) {
                    Ok(Outcome::Quit) => return Ok(()),
                    Ok(Outcome::Continue(text)) => write!(out, "{text}")?,
                    Err(e) => report(out, &e)?,
                }
                write!(out, "> ")?;
            }
            Err(RecvTimeoutError::Timeout) => match shell.tick(Instant::now()) {
                Ok(Some(text)) => write!(out, "\n{text}> ")?,
                Ok(None) => {}
                Err(e) => report(out, &e)?,
            },
            Err(RecvTimeoutError::Disconnected) => break,
        }
        out.flush()?;
    }

    if let Err(e) = shell.finish() {
        report(out, &e)?;
    }
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::testing::{folder, note, BackendCall, MockBackend};
    use std::io::Cursor;
    use std::time::Duration;

    fn shell(backend: MockBackend) -> Shell<MockBackend> {
        let mut workspace = NotesWorkspace::new(backend, Duration::from_millis(1000));
        workspace.load().unwrap();
        Shell::new(workspace)
    }

    fn run_line(shell: &mut Shell<MockBackend>, line: &str, now: Instant) -> String {
        match shell.execute(line, now).unwrap() {
            Outcome::Continue(text) => text,
            Outcome::Quit => panic!("Unexpected quit"),
        }
    }

    #[test]
    fn given_new_note_when_typing_quickly_then_saves_once_after_quiet_period() {
        // Arrange
        let mut shell = shell(MockBackend::builder().with_next_id(42).build());
        let t0 = Instant::now();
        run_line(&mut shell, "new", t0);

        // Act
        run_line(&mut shell, "type a", t0);
        run_line(&mut shell, "type b", t0 + Duration::from_millis(200));
        run_line(&mut shell, "type c", t0 + Duration::from_millis(400));
        let early = shell.tick(t0 + Duration::from_millis(900)).unwrap();
        let saved = shell.tick(t0 + Duration::from_millis(1500)).unwrap();
        let again = shell.tick(t0 + Duration::from_millis(3000)).unwrap();

        // Assert
        assert_eq!(early, None);
        assert_eq!(saved.as_deref(), Some("saved 42\n"));
        assert_eq!(again, None);
        let creates = shell
            .workspace()
            .repository()
            .calls()
            .iter()
            .filter(|c| matches!(c, BackendCall::CreateNote))
            .count();
        assert_eq!(creates, 1);
        assert_eq!(shell.workspace().notes()[0].content, "abc");
    }

    #[test]
    fn given_pending_edit_when_quitting_then_flushes_before_exit() {
        let mut shell = shell(MockBackend::builder().with_note(note(1, "recon", None)).build());
        let now = Instant::now();
        run_line(&mut shell, "edit 1", now);
        run_line(&mut shell, "title recon v2", now);

        let outcome = shell.execute("quit", now).unwrap();

        assert_eq!(outcome, Outcome::Quit);
        assert!(shell
            .workspace()
            .repository()
            .calls()
            .contains(&BackendCall::UpdateNote(1)));
    }

    #[test]
    fn given_folder_when_dropping_onto_descendant_then_reports_rejection() {
        let backend = MockBackend::builder()
            .with_folder(folder(1, "CTF2024", None))
            .with_folder(folder(2, "pwn", Some(1)))
            .build();
        let mut shell = shell(backend);

        let result = shell.execute("drop folder 1 2", Instant::now());

        assert!(matches!(result, Err(ShellError::Usage(_))));
        assert!(!shell
            .workspace()
            .repository()
            .calls()
            .iter()
            .any(|c| matches!(c, BackendCall::MoveFolder(..))));
    }

    #[test]
    fn given_no_edit_mode_when_typing_then_returns_usage_error() {
        let mut shell = shell(MockBackend::builder().with_note(note(1, "recon", None)).build());
        run_line(&mut shell, "open 1", Instant::now());

        let result = shell.execute("type hello", Instant::now());

        assert!(matches!(result, Err(ShellError::Usage(_))));
    }

    #[test]
    fn given_root_menu_when_creating_folder_then_folder_is_listed() {
        let mut shell = shell(MockBackend::builder().with_next_id(9).build());

        let output = run_line(&mut shell, "menu / new-folder CTF2024", Instant::now());

        assert_eq!(output, "created folder CTF2024 [9]\n");
        assert!(run_line(&mut shell, "tree", Instant::now()).contains("[9] CTF2024/"));
    }

    #[test]
    fn given_trailing_parent_id_when_making_folder_then_files_it_under_parent() {
        let backend = MockBackend::builder()
            .with_folder(folder(1, "CTF2024", None))
            .with_next_id(9)
            .build();
        let mut shell = shell(backend);

        let output = run_line(&mut shell, "mkdir web 1", Instant::now());

        assert_eq!(output, "created folder web [9]\n");
        let web = shell.workspace().folders().iter().find(|f| f.id == 9).unwrap();
        assert_eq!(web.parent_id, Some(1));
    }

    #[test]
    fn given_name_with_spaces_when_splitting_then_only_numeric_tail_is_parent() {
        assert_eq!(
            split_name_and_parent("heap tricks 4").unwrap(),
            ("heap tricks", Some(4))
        );
        assert_eq!(split_name_and_parent("heap tricks").unwrap(), ("heap tricks", None));
        assert_eq!(split_name_and_parent("2024").unwrap(), ("2024", None));
        assert!(matches!(split_name_and_parent(""), Err(ShellError::Usage(_))));
    }

    #[test]
    fn given_note_outside_current_folder_when_removing_then_nothing_is_deleted() {
        let backend = MockBackend::builder()
            .with_folder(folder(1, "web", None))
            .with_note(note(5, "sqli", Some(1)))
            .build();
        let mut shell = shell(backend);

        let result = shell.execute("rm 5", Instant::now());

        assert!(matches!(result, Err(ShellError::Usage(_))));
        assert!(!shell
            .workspace()
            .repository()
            .calls()
            .contains(&BackendCall::DeleteNote(5)));
    }

    #[test]
    fn given_listed_note_when_toggling_favorite_then_reports_new_flag() {
        let backend = MockBackend::builder()
            .with_folder(folder(1, "web", None))
            .with_note(note(5, "sqli", Some(1)))
            .build();
        let mut shell = shell(backend);
        run_line(&mut shell, "cd 1", Instant::now());

        let output = run_line(&mut shell, "fav 5", Instant::now());

        assert_eq!(output, "5 favorite: true\n");
        assert!(shell.workspace().notes()[0].is_favorite);
    }

    #[test]
    fn given_escaped_newline_when_unescaping_then_becomes_line_break() {
        assert_eq!(unescape(r"line1\nline2"), "line1\nline2");
    }

    #[test]
    fn given_scripted_input_when_running_then_ends_on_quit() {
        let shell = shell(MockBackend::builder().with_folder(folder(1, "CTF2024", None)).build());
        let input = Cursor::new("help\ncd 1\nquit\n".as_bytes().to_vec());
        let mut out = Vec::new();

        run(shell, input, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("navigation:"));
        assert!(text.contains("No notes in this folder"));
    }
}
