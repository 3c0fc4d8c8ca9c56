// src/application/folder_tree.rs
use crate::domain::{Folder, FolderId, Note, NoteId};
use std::collections::HashSet;
use tracing::debug;

/// Read-only view over the canonical folder and note collections
#[derive(Debug, Clone, Copy)]
pub struct Hierarchy<'a> {
    folders: &'a [Folder],
    notes: &'a [Note],
}

impl<'a> Hierarchy<'a> {
    pub fn new(folders: &'a [Folder], notes: &'a [Note]) -> Self {
        Self { folders, notes }
    }

    pub fn folder(&self, id: FolderId) -> Option<&'a Folder> {
        self.folders.iter().find(|f| f.id == id)
    }

    pub fn roots(&self) -> impl Iterator<Item = &'a Folder> {
        self.folders.iter().filter(|f| f.is_root())
    }

    pub fn children(&self, id: FolderId) -> impl Iterator<Item = &'a Folder> {
        self.folders
            .iter()
            .filter(move |f| f.parent_id == Some(id))
    }

    pub fn notes_in(&self, id: FolderId) -> impl Iterator<Item = &'a Note> {
        self.notes.iter().filter(move |n| n.folder_id == Some(id))
    }

    pub fn has_children(&self, id: FolderId) -> bool {
        self.children(id).next().is_some() || self.notes_in(id).next().is_some()
    }

    /// True if `ancestor` appears on the parent chain of `folder`.
    /// Tolerates cyclic data coming from the backend.
    pub fn is_ancestor(&self, ancestor: FolderId, folder: FolderId) -> bool {
        let mut seen = HashSet::new();
        let mut current = self.folder(folder).and_then(|f| f.parent_id);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            if !seen.insert(id) {
                return false;
            }
            current = self.folder(id).and_then(|f| f.parent_id);
        }
        false
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeRowKind {
    Folder {
        id: FolderId,
        name: String,
        expanded: bool,
        has_children: bool,
    },
    Note {
        id: NoteId,
        title: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub depth: usize,
    pub kind: TreeRowKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextAction {
    NewFolder,
    NewNote,
    Delete,
}

/// What a context-menu entry asks the workspace to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderCommand {
    CreateFolder { parent: Option<FolderId> },
    CreateNote { folder: Option<FolderId> },
    DeleteFolder(FolderId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Folder,
    Note,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSource {
    pub id: i64,
    pub kind: ItemKind,
}

/// Drag-and-drop interaction: `target` of `None` drops onto the root level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropRequest {
    pub source: DragSource,
    pub target: Option<FolderId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    MoveFolder {
        folder: FolderId,
        new_parent: Option<FolderId>,
    },
    MoveNote {
        note: NoteId,
        folder: Option<FolderId>,
    },
    Rejected(String),
}

/// Expansion state of the folder sidebar
#[derive(Debug, Clone, Default)]
pub struct FolderTree {
    expanded: HashSet<FolderId>,
}

impl FolderTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, id: FolderId) -> bool {
        self.expanded.contains(&id)
    }

    pub fn toggle(&mut self, id: FolderId) {
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
        }
    }

    /// Selecting a folder also toggles it open or closed when it has content
    pub fn select(&mut self, hierarchy: Hierarchy<'_>, id: FolderId) -> Option<FolderId> {
        hierarchy.folder(id)?;
        if hierarchy.has_children(id) {
            self.toggle(id);
        }
        Some(id)
    }

    /// Forgets expansion state of folders that no longer exist
    pub fn prune(&mut self, hierarchy: Hierarchy<'_>) {
        self.expanded.retain(|id| hierarchy.folder(*id).is_some());
    }

    /// Depth-first rows: each folder, then its notes and child folders when expanded
    pub fn visible_rows(&self, hierarchy: Hierarchy<'_>) -> Vec<TreeRow> {
        let mut rows = vec![];
        let mut on_path = HashSet::new();
        for root in hierarchy.roots() {
            self.push_folder(hierarchy, root, 0, &mut rows, &mut on_path);
        }
        rows
    }

    fn push_folder(
        &self,
        hierarchy: Hierarchy<'_>,
        folder: &Folder,
        depth: usize,
        rows: &mut Vec<TreeRow>,
        on_path: &mut HashSet<FolderId>,
    ) {
        if !on_path.insert(folder.id) {
            return;
        }
        let expanded = self.is_expanded(folder.id);
        rows.push(TreeRow {
            depth,
            kind: TreeRowKind::Folder {
                id: folder.id,
                name: folder.name.clone(),
                expanded,
                has_children: hierarchy.has_children(folder.id),
            },
        });
        if expanded {
            for note in hierarchy.notes_in(folder.id) {
                rows.push(TreeRow {
                    depth: depth + 1,
                    kind: TreeRowKind::Note {
                        id: note.id,
                        title: note.title.clone(),
                    },
                });
            }
            for child in hierarchy.children(folder.id) {
                self.push_folder(hierarchy, child, depth + 1, rows, on_path);
            }
        }
        on_path.remove(&folder.id);
    }

    pub fn context_command(folder: Option<FolderId>, action: ContextAction) -> Option<FolderCommand> {
        match action {
            ContextAction::NewFolder => Some(FolderCommand::CreateFolder { parent: folder }),
            ContextAction::NewNote => Some(FolderCommand::CreateNote { folder }),
            ContextAction::Delete => folder.map(FolderCommand::DeleteFolder),
        }
    }

    /// Decides what a drop means; folder drops that would create a cycle are refused
    pub fn resolve_drop(hierarchy: Hierarchy<'_>, request: DropRequest) -> DropOutcome {
        if let Some(target) = request.target {
            if hierarchy.folder(target).is_none() {
                return DropOutcome::Rejected(format!("folder {} does not exist", target));
            }
        }

        let outcome = match request.source.kind {
            ItemKind::Note => DropOutcome::MoveNote {
                note: request.source.id,
                folder: request.target,
            },
            ItemKind::Folder => {
                let folder = request.source.id;
                match request.target {
                    Some(target) if target == folder => {
                        DropOutcome::Rejected("a folder cannot contain itself".to_string())
                    }
                    Some(target) if hierarchy.is_ancestor(folder, target) => DropOutcome::Rejected(
                        format!("folder {} is inside folder {}", target, folder),
                    ),
                    target => DropOutcome::MoveFolder {
                        folder,
                        new_parent: target,
                    },
                }
            }
        };
        debug!(?request, ?outcome, "Resolved drop");
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::testing::{folder, note};

    fn sample() -> (Vec<Folder>, Vec<Note>) {
        let folders = vec![
            folder(1, "CTF2024", None),
            folder(2, "web", Some(1)),
            folder(3, "sqli", Some(2)),
            folder(4, "archive", None),
        ];
        let notes = vec![note(10, "login bypass", Some(2)), note(11, "loose", None)];
        (folders, notes)
    }

    #[test]
    fn given_collapsed_tree_when_listing_rows_then_only_roots_are_visible() {
        let (folders, notes) = sample();
        let h = Hierarchy::new(&folders, &notes);
        let tree = FolderTree::new();

        let rows = tree.visible_rows(h);

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.depth == 0));
    }

    #[test]
    fn given_folder_with_children_when_selected_twice_then_expands_and_collapses() {
        let (folders, notes) = sample();
        let h = Hierarchy::new(&folders, &notes);
        let mut tree = FolderTree::new();

        assert_eq!(tree.select(h, 1), Some(1));
        assert!(tree.is_expanded(1));
        tree.select(h, 1);
        assert!(!tree.is_expanded(1));
    }

    #[test]
    fn given_empty_folder_when_selected_then_expansion_is_unchanged() {
        let (folders, notes) = sample();
        let h = Hierarchy::new(&folders, &notes);
        let mut tree = FolderTree::new();

        assert_eq!(tree.select(h, 4), Some(4));
        assert!(!tree.is_expanded(4));
    }

    #[test]
    fn given_expanded_path_when_listing_rows_then_notes_precede_child_folders() {
        let (folders, notes) = sample();
        let h = Hierarchy::new(&folders, &notes);
        let mut tree = FolderTree::new();
        tree.toggle(1);
        tree.toggle(2);

        let rows = tree.visible_rows(h);

        let summary: Vec<(usize, String)> = rows
            .iter()
            .map(|r| match &r.kind {
                TreeRowKind::Folder { name, .. } => (r.depth, name.clone()),
                TreeRowKind::Note { title, .. } => (r.depth, format!("note:{title}")),
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                (0, "CTF2024".to_string()),
                (1, "web".to_string()),
                (2, "note:login bypass".to_string()),
                (2, "sqli".to_string()),
                (0, "archive".to_string()),
            ]
        );
    }

    #[test]
    fn given_folder_dropped_on_descendant_when_resolving_then_rejected() {
        let (folders, notes) = sample();
        let h = Hierarchy::new(&folders, &notes);
        let request = DropRequest {
            source: DragSource {
                id: 1,
                kind: ItemKind::Folder,
            },
            target: Some(3),
        };

        assert!(matches!(
            FolderTree::resolve_drop(h, request),
            DropOutcome::Rejected(_)
        ));
    }

    #[test]
    fn given_folder_dropped_on_itself_when_resolving_then_rejected() {
        let (folders, notes) = sample();
        let h = Hierarchy::new(&folders, &notes);
        let request = DropRequest {
            source: DragSource {
                id: 2,
                kind: ItemKind::Folder,
            },
            target: Some(2),
        };

        assert!(matches!(
            FolderTree::resolve_drop(h, request),
            DropOutcome::Rejected(_)
        ));
    }

    #[test]
    fn given_folder_dropped_on_sibling_when_resolving_then_moves() {
        let (folders, notes) = sample();
        let h = Hierarchy::new(&folders, &notes);
        let request = DropRequest {
            source: DragSource {
                id: 3,
                kind: ItemKind::Folder,
            },
            target: Some(4),
        };

        assert_eq!(
            FolderTree::resolve_drop(h, request),
            DropOutcome::MoveFolder {
                folder: 3,
                new_parent: Some(4)
            }
        );
    }

    #[test]
    fn given_note_dropped_on_folder_when_resolving_then_refiles_note() {
        let (folders, notes) = sample();
        let h = Hierarchy::new(&folders, &notes);
        let request = DropRequest {
            source: DragSource {
                id: 11,
                kind: ItemKind::Note,
            },
            target: Some(4),
        };

        assert_eq!(
            FolderTree::resolve_drop(h, request),
            DropOutcome::MoveNote {
                note: 11,
                folder: Some(4)
            }
        );
    }

    #[test]
    fn given_cyclic_backend_data_when_checking_ancestry_then_terminates() {
        let folders = vec![folder(1, "a", Some(2)), folder(2, "b", Some(1))];
        let h = Hierarchy::new(&folders, &[]);

        assert!(h.is_ancestor(2, 1));
        assert!(!h.is_ancestor(3, 1));
    }

    #[test]
    fn given_context_delete_on_root_when_resolving_then_no_command() {
        assert_eq!(FolderTree::context_command(None, ContextAction::Delete), None);
        assert_eq!(
            FolderTree::context_command(Some(5), ContextAction::NewNote),
            Some(FolderCommand::CreateNote { folder: Some(5) })
        );
    }
}
