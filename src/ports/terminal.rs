// src/ports/terminal.rs
//! Plain-text rendering of the console's panes
use crate::application::folder_tree::{TreeRow, TreeRowKind};
use crate::application::tool_catalogue::group_by_category;
use crate::application::{NoteEditor, NoteList, NoteTabs};
use crate::domain::{Challenge, FolderId, OpenNote, TabKey, Tool};
use crate::util::text::{first_line, truncate};
use std::fmt::Write;

const PREVIEW_WIDTH: usize = 48;

pub fn render_tree(rows: &[TreeRow], selected: Option<FolderId>) -> String {
    if rows.is_empty() {
        return "No folders yet\n".to_string();
    }
    let mut out = String::new();
    for row in rows {
        let indent = "  ".repeat(row.depth);
        match &row.kind {
            TreeRowKind::Folder {
                id,
                name,
                expanded,
                has_children,
            } => {
                let marker = match (has_children, expanded) {
                    (false, _) => " ",
                    (true, true) => "v",
                    (true, false) => ">",
                };
                let cursor = if selected == Some(*id) { "*" } else { " " };
                let _ = writeln!(out, "{cursor}{indent}{marker} [{id}] {name}/");
            }
            TreeRowKind::Note { id, title } => {
                let _ = writeln!(out, " {indent}  ({id}) {title}");
            }
        }
    }
    out
}

pub fn render_note_list(list: &NoteList<'_>) -> String {
    if list.is_empty() {
        return "No notes in this folder. Use `new` to create one.\n".to_string();
    }
    let mut out = String::new();
    for note in list.notes() {
        let star = if note.is_favorite { "★" } else { " " };
        let _ = writeln!(
            out,
            "{star} {:>5}  {:<28}  {}",
            note.id,
            truncate(&note.title, 28),
            truncate(&first_line(&note.content), PREVIEW_WIDTH)
        );
    }
    out
}

pub fn render_tabs(tabs: &NoteTabs) -> String {
    if tabs.is_empty() {
        return "(no open notes)\n".to_string();
    }
    let active = tabs.active_key();
    let labels: Vec<String> = tabs
        .iter()
        .map(|open: &OpenNote| {
            let key = open.key();
            let label = match key {
                TabKey::Draft => format!("{} (unsaved)", truncate(open.title(), 20)),
                TabKey::Saved(id) => format!("{}:{}", id, truncate(open.title(), 20)),
            };
            if Some(key) == active {
                format!("[{label}]")
            } else {
                format!(" {label} ")
            }
        })
        .collect();
    format!("{}\n", labels.join("|"))
}

pub fn render_editor(editor: &NoteEditor) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Title: {}", editor.title());
    let _ = writeln!(
        out,
        "Tags:  {}",
        if editor.tags().is_empty() {
            "-".to_string()
        } else {
            editor.tags().join(", ")
        }
    );
    let (start, end) = editor.selection();
    let _ = writeln!(out, "Selection: {start}..{end}");
    let _ = writeln!(out, "{}", "-".repeat(40));
    let _ = writeln!(out, "{}", editor.content());
    if editor.has_pending_save() {
        let _ = writeln!(out, "(unsaved changes)");
    }
    out
}

pub fn render_open_note(note: &OpenNote) -> String {
    let fields = note.fields();
    let mut out = String::new();
    let _ = writeln!(out, "# {}", fields.title);
    if !fields.tags.is_empty() {
        let _ = writeln!(out, "tags: {}", fields.tags.join(", "));
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", fields.content);
    out
}

pub fn render_tools(tools: &[Tool]) -> String {
    if tools.is_empty() {
        return "No tools\n".to_string();
    }
    let mut out = String::new();
    for (category, tools) in group_by_category(tools) {
        let _ = writeln!(out, "{category}");
        for tool in tools {
            let _ = writeln!(
                out,
                "  {:>4}  {:<20} {}",
                tool.id,
                tool.name,
                tool.description.as_deref().unwrap_or("")
            );
            if let Some(command) = tool.command.as_deref().filter(|c| !c.is_empty()) {
                let _ = writeln!(out, "        $ {command}");
            }
        }
    }
    out
}

pub fn render_challenges(challenges: &[Challenge]) -> String {
    if challenges.is_empty() {
        return "No challenges\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>5}  {:<30} {:<10} {:<8} {:<6} {}",
        "ID", "TITLE", "CATEGORY", "LEVEL", "SOLVED", "CREATED"
    );
    for c in challenges {
        let _ = writeln!(
            out,
            "{:>5}  {:<30} {:<10} {:<8} {:<6} {}",
            c.id,
            truncate(&c.title, 30),
            c.category,
            c.difficulty,
            if c.solved { "yes" } else { "no" },
            c.created_at.format("%Y-%m-%d")
        );
    }
    out
}

pub fn render_challenge(c: &Challenge) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[{}] {} ({} / {})", c.id, c.title, c.category, c.difficulty);
    let _ = writeln!(out, "Solved: {}", if c.solved { "yes" } else { "no" });
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", c.description);
    if !c.resources.files.is_empty() {
        let _ = writeln!(out, "\nFiles:");
        for file in &c.resources.files {
            let _ = writeln!(out, "  {} ({})", file.original_name, file.filename);
        }
    }
    if !c.resources.links.is_empty() {
        let _ = writeln!(out, "\nLinks:");
        for link in &c.resources.links {
            let _ = writeln!(out, "  {link}");
        }
    }
    if !c.resources.commands.is_empty() {
        let _ = writeln!(out, "\nCommands:");
        for command in &c.resources.commands {
            let _ = writeln!(out, "  $ {command}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{FolderTree, Hierarchy};
    use crate::domain::NoteDraft;
    use crate::util::testing::{challenge, folder, note, tool};

    #[test]
    fn given_expanded_folder_when_rendering_tree_then_marks_selection_and_nests_notes() {
        let folders = vec![folder(1, "CTF2024", None)];
        let notes = vec![note(5, "writeup", Some(1))];
        let mut tree = FolderTree::new();
        tree.toggle(1);

        let text = render_tree(&tree.visible_rows(Hierarchy::new(&folders, &notes)), Some(1));

        assert!(text.contains("*v [1] CTF2024/"));
        assert!(text.contains("(5) writeup"));
    }

    #[test]
    fn given_empty_scope_when_rendering_note_list_then_offers_creation() {
        let notes: Vec<crate::domain::Note> = vec![];
        let text = render_note_list(&NoteList::scoped(&notes, None));
        assert!(text.contains("create one"));
    }

    #[test]
    fn given_draft_and_saved_tabs_when_rendering_then_brackets_active() {
        let mut tabs = NoteTabs::new();
        tabs.open(OpenNote::Persisted(note(3, "recon", None)));
        tabs.open(OpenNote::Draft(NoteDraft::new(None)));

        let text = render_tabs(&tabs);

        assert!(text.contains(" 3:recon "));
        assert!(text.contains("(unsaved)]"));
    }

    #[test]
    fn given_tools_when_rendering_then_grouped_under_category() {
        let mut sqlmap = tool(1, "sqlmap", "Web");
        sqlmap.command = Some("sqlmap -u URL".to_string());

        let text = render_tools(&[sqlmap, tool(2, "gdb", "Pwn")]);

        assert!(text.find("Pwn").unwrap() < text.find("Web").unwrap());
        assert!(text.contains("$ sqlmap -u URL"));
    }

    #[test]
    fn given_solved_challenge_when_rendering_table_then_shows_yes() {
        let text = render_challenges(&[challenge(1, "baby-rop", true)]);
        assert!(text.contains("baby-rop"));
        assert!(text.contains("yes"));
    }
}
