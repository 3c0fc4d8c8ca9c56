// src/cli/commands.rs
//! One handler per subcommand group. Output goes to the given writer.
use crate::application::{
    ChallengeCatalogue, ChallengeRepository, FolderRepository, FolderTree, NoteList,
    NoteRepository, NotesWorkspace, ToolCatalogue, ToolRepository,
};
use crate::cli::args::{challenge_sort, ChallengesCommand, FoldersCommand, NotesCommand, ToolsCommand};
use crate::cli::shell::{self, Shell};
use crate::domain::{ChallengeForm, DomainError, FlagOutcome, NewTool};
use crate::infrastructure::PreviewRenderer;
use crate::ports::terminal::{render_challenge, render_challenges, render_note_list, render_tools, render_tree};
use crate::ports::HtmlPresenter;
use anyhow::{Context, Result};
use std::io::{BufReader, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

pub fn handle_tools<R: ToolRepository>(repository: R, command: ToolsCommand, out: &mut impl Write) -> Result<()> {
    let mut catalogue = ToolCatalogue::new(repository);
    match command {
        ToolsCommand::List { category } => {
            let tools = catalogue.list(category.as_deref())?;
            write!(out, "{}", render_tools(&tools))?;
        }
        ToolsCommand::Add {
            name,
            category,
            description,
            command,
            url,
        } => {
            let tool = catalogue.add(&NewTool {
                name,
                category,
                description,
                command,
                url,
            })?;
            writeln!(out, "Added tool {} [{}]", tool.name, tool.id)?;
        }
        ToolsCommand::Delete { id } => {
            catalogue.delete(id)?;
            writeln!(out, "Deleted tool {}", id)?;
        }
    }
    Ok(())
}

pub fn handle_challenges<R: ChallengeRepository>(
    repository: R,
    command: ChallengesCommand,
    out: &mut impl Write,
) -> Result<()> {
    let mut catalogue = ChallengeCatalogue::new(repository);
    match command {
        ChallengesCommand::List { sort, desc } => {
            let challenges = catalogue.list(challenge_sort(sort, desc))?;
            write!(out, "{}", render_challenges(&challenges))?;
        }
        ChallengesCommand::Show { id } => {
            let challenge = catalogue.get(id)?;
            write!(out, "{}", render_challenge(&challenge))?;
        }
        ChallengesCommand::Add { form, files } => {
            let mut payload = ChallengeForm::default();
            form.apply_to(&mut payload);
            let created = catalogue.create(&payload, &files)?;
            writeln!(out, "Created challenge {} [{}]", created.title, created.id)?;
        }
        ChallengesCommand::Edit { id, form } => {
            let mut payload = catalogue.get(id)?.to_form();
            form.apply_to(&mut payload);
            let updated = catalogue.update(id, &payload)?;
            writeln!(out, "Updated challenge {} [{}]", updated.title, updated.id)?;
        }
        ChallengesCommand::Delete { id } => {
            catalogue.delete(id)?;
            writeln!(out, "Deleted challenge {}", id)?;
        }
        ChallengesCommand::ToggleSolved { id } => {
            let challenge = catalogue.toggle_solved(id)?;
            let state = if challenge.solved { "solved" } else { "unsolved" };
            writeln!(out, "Challenge {} marked {}", id, state)?;
        }
        ChallengesCommand::CheckFlag { id, flag } => match catalogue.check_flag(id, &flag)? {
            FlagOutcome::Correct => writeln!(out, "Correct flag!")?,
            FlagOutcome::Incorrect { message } => {
                writeln!(out, "{}", message.as_deref().unwrap_or("Incorrect flag"))?
            }
        },
        ChallengesCommand::Upload { id, path } => {
            let file = catalogue.upload_file(id, &path)?;
            writeln!(out, "Uploaded {} as {}", file.original_name, file.filename)?;
        }
        ChallengesCommand::Download {
            id,
            filename,
            output,
        } => {
            let dest = output.unwrap_or_else(|| PathBuf::from(&filename));
            let written = catalogue.download_file(id, &filename, &dest)?;
            writeln!(out, "Saved {} bytes to {}", written, dest.display())?;
        }
        ChallengesCommand::DeleteFile { id, filename } => {
            catalogue.delete_file(id, &filename)?;
            writeln!(out, "Deleted file {}", filename)?;
        }
    }
    Ok(())
}

pub fn handle_notes<R>(
    repository: R,
    command: NotesCommand,
    autosave_quiet: Duration,
    out: &mut impl Write,
) -> Result<()>
where
    R: NoteRepository + FolderRepository,
{
    let mut workspace = NotesWorkspace::new(repository, autosave_quiet);
    workspace.load()?;
    match command {
        NotesCommand::Tree => {
            let hierarchy = workspace.hierarchy();
            let mut tree = FolderTree::new();
            for folder in workspace.folders() {
                tree.toggle(folder.id);
            }
            write!(out, "{}", render_tree(&tree.visible_rows(hierarchy), None))?;
        }
        NotesCommand::List { folder } => {
            let list = NoteList::scoped(workspace.notes(), folder);
            write!(out, "{}", render_note_list(&list))?;
        }
        NotesCommand::Preview { id, json } => {
            let note = workspace
                .notes()
                .iter()
                .find(|n| n.id == id)
                .ok_or(DomainError::NoteNotFound(id))?;
            debug!(note_id = id, json, "Previewing note");
            if json {
                let text = serde_json::to_string_pretty(note).context("Failed to serialize note")?;
                writeln!(out, "{}", text)?;
            } else {
                let html = HtmlPresenter::new().render(note);
                let mut renderer = PreviewRenderer::new();
                let path = renderer.create_temp_file(&html)?;
                info!(note_id = id, path = %path.display(), "Opening preview");
                renderer.open_in_browser(&path)?;
            }
        }
        NotesCommand::Shell => {
            let input = BufReader::new(std::io::stdin());
            shell::run(Shell::new(workspace), input, out)?;
        }
    }
    Ok(())
}

pub fn handle_folders<R>(repository: R, command: FoldersCommand, out: &mut impl Write) -> Result<()>
where
    R: NoteRepository + FolderRepository,
{
    let mut workspace = NotesWorkspace::new(repository, Duration::ZERO);
    workspace.load()?;
    match command {
        FoldersCommand::Add { name, parent } => {
            let folder = workspace.create_folder(&name, parent)?;
            writeln!(out, "Created folder {} [{}]", folder.name, folder.id)?;
        }
        FoldersCommand::Move { id, parent } => {
            workspace.move_folder(id, parent)?;
            let target = parent.map_or_else(|| "/".to_string(), |p| p.to_string());
            writeln!(out, "Moved folder {} to {}", id, target)?;
        }
        FoldersCommand::Delete { id } => {
            workspace.delete_folder(id)?;
            writeln!(out, "Deleted folder {}", id)?;
        }
    }
    Ok(())
}
