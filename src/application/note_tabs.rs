// src/application/note_tabs.rs
use crate::domain::{Note, OpenNote, TabKey};

/// Ordered set of open notes with a single active tab.
///
/// Keys are unique and `active`, when set, always names an open tab.
#[derive(Debug, Clone, Default)]
pub struct NoteTabs {
    open: Vec<OpenNote>,
    active: Option<TabKey>,
}

impl NoteTabs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OpenNote> {
        self.open.iter()
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    pub fn contains(&self, key: TabKey) -> bool {
        self.open.iter().any(|n| n.key() == key)
    }

    pub fn get(&self, key: TabKey) -> Option<&OpenNote> {
        self.open.iter().find(|n| n.key() == key)
    }

    pub fn active_key(&self) -> Option<TabKey> {
        self.active
    }

    pub fn active(&self) -> Option<&OpenNote> {
        self.active.and_then(|key| self.get(key))
    }

    /// Opens `note` unless a tab with the same key exists, then activates it
    pub fn open(&mut self, note: OpenNote) -> TabKey {
        let key = note.key();
        if !self.contains(key) {
            self.open.push(note);
        }
        self.active = Some(key);
        key
    }

    pub fn activate(&mut self, key: TabKey) -> bool {
        if self.contains(key) {
            self.active = Some(key);
            true
        } else {
            false
        }
    }

    /// Closes a tab. If it was active, the last remaining tab becomes active.
    pub fn close(&mut self, key: TabKey) -> bool {
        let before = self.open.len();
        self.open.retain(|n| n.key() != key);
        if self.open.len() == before {
            return false;
        }
        if self.active == Some(key) {
            self.active = self.open.last().map(OpenNote::key);
        }
        true
    }

    /// Swaps the draft tab for its saved counterpart, keeping its position
    pub fn promote_draft(&mut self, note: Note) -> bool {
        let saved = TabKey::Saved(note.id);
        let Some(pos) = self.open.iter().position(OpenNote::is_draft) else {
            return false;
        };
        self.open[pos] = OpenNote::Persisted(note);
        // a stale tab for the same id must not survive next to the promoted one
        let mut index = 0;
        self.open.retain(|n| {
            let keep = index == pos || n.key() != saved;
            index += 1;
            keep
        });
        if self.active == Some(TabKey::Draft) || self.active == Some(saved) {
            self.active = Some(saved);
        }
        true
    }

    /// Replaces an open persisted tab with a fresher copy
    pub fn update(&mut self, note: &Note) {
        for open in self.open.iter_mut() {
            if open.key() == TabKey::Saved(note.id) {
                *open = OpenNote::Persisted(note.clone());
            }
        }
    }

    /// Refreshes persisted tabs from the canonical collection and drops those that vanished
    pub fn sync_with(&mut self, notes: &[Note]) {
        self.open.retain_mut(|open| match open {
            OpenNote::Draft(_) => true,
            OpenNote::Persisted(current) => match notes.iter().find(|n| n.id == current.id) {
                Some(fresh) => {
                    *current = fresh.clone();
                    true
                }
                None => false,
            },
        });
        if let Some(active) = self.active {
            if !self.contains(active) {
                self.active = self.open.last().map(OpenNote::key);
            }
        }
    }
}
