// src/application/note_editor.rs
use crate::application::debounce::Debouncer;
use crate::application::markdown::{floor_char_boundary, insert_snippet, MarkdownSnippet, Shortcut};
use crate::domain::{NoteFields, OpenNote};
use std::time::{Duration, Instant};
use tracing::trace;

/// Local edit buffers of one note plus its autosave timer.
///
/// Every change to title, content or tags re-arms the timer; `poll` hands out the
/// buffers once a full quiet period has passed without further edits.
#[derive(Debug, Clone)]
pub struct NoteEditor {
    title: String,
    content: String,
    tags: Vec<String>,
    selection: (usize, usize),
    autosave: Debouncer,
}

impl NoteEditor {
    pub fn new(fields: NoteFields, quiet: Duration) -> Self {
        let end = fields.content.len();
        Self {
            title: fields.title,
            content: fields.content,
            tags: fields.tags,
            selection: (end, end),
            autosave: Debouncer::new(quiet),
        }
    }

    pub fn for_note(note: &OpenNote, quiet: Duration) -> Self {
        Self::new(note.fields(), quiet)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn selection(&self) -> (usize, usize) {
        self.selection
    }

    pub fn fields(&self) -> NoteFields {
        NoteFields {
            title: self.title.clone(),
            content: self.content.clone(),
            tags: self.tags.clone(),
        }
    }

    fn changed(&mut self, now: Instant) {
        trace!(title = %self.title, "Edit buffer changed, re-arming autosave");
        self.autosave.arm(now);
    }

    pub fn set_title(&mut self, now: Instant, title: impl Into<String>) {
        self.title = title.into();
        self.changed(now);
    }

    pub fn set_content(&mut self, now: Instant, content: impl Into<String>) {
        self.content = content.into();
        let end = self.content.len();
        self.selection = (end, end);
        self.changed(now);
    }

    /// Types `text` at the cursor, replacing the selection
    pub fn type_text(&mut self, now: Instant, text: &str) {
        let (start, end) = self.clamped_selection();
        self.content.replace_range(start..end, text);
        let cursor = start + text.len();
        self.selection = (cursor, cursor);
        self.changed(now);
    }

    /// Adds a tag; blank or duplicate tags are ignored
    pub fn add_tag(&mut self, now: Instant, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.tags.iter().any(|t| t == tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        self.changed(now);
        true
    }

    pub fn remove_tag(&mut self, now: Instant, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        if self.tags.len() == before {
            return false;
        }
        self.changed(now);
        true
    }

    pub fn select(&mut self, start: usize, end: usize) {
        self.selection = (start, end);
        self.selection = self.clamped_selection();
    }

    fn clamped_selection(&self) -> (usize, usize) {
        let a = floor_char_boundary(&self.content, self.selection.0);
        let b = floor_char_boundary(&self.content, self.selection.1);
        (a.min(b), a.max(b))
    }

    pub fn insert_markdown(&mut self, now: Instant, snippet: MarkdownSnippet) {
        let (start, end) = self.selection;
        let (content, selected) = insert_snippet(&self.content, start, end, snippet);
        self.content = content;
        self.selection = (selected.start, selected.end);
        self.changed(now);
    }

    /// Applies a keyboard chord; returns false when the chord is not bound
    pub fn apply_shortcut(&mut self, now: Instant, chord: &str) -> bool {
        match Shortcut::parse(chord) {
            Some(shortcut) => {
                self.insert_markdown(now, shortcut.snippet());
                true
            }
            None => false,
        }
    }

    pub fn has_pending_save(&self) -> bool {
        self.autosave.is_pending()
    }

    pub fn next_save_in(&self, now: Instant) -> Option<Duration> {
        self.autosave.due_in(now)
    }

    /// Returns the payload to save if the quiet period has elapsed
    pub fn poll(&mut self, now: Instant) -> Option<NoteFields> {
        if self.autosave.fire(now) {
            Some(self.fields())
        } else {
            None
        }
    }

    /// Returns the pending payload immediately, skipping the rest of the quiet period
    pub fn flush(&mut self) -> Option<NoteFields> {
        if self.autosave.is_pending() {
            self.autosave.cancel();
            Some(self.fields())
        } else {
            None
        }
    }

    /// Drops a pending save, as when the editor goes away
    pub fn cancel(&mut self) {
        self.autosave.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> NoteEditor {
        NoteEditor::new(
            NoteFields {
                title: "recon".to_string(),
                content: String::new(),
                tags: vec![],
            },
            Duration::from_millis(1000),
        )
    }

    #[test]
    fn given_rapid_keystrokes_when_polling_then_saves_once_after_last_edit() {
        // Arrange
        let start = Instant::now();
        let mut ed = editor();

        // Act
        let mut saves = vec![];
        for (i, ch) in ["a", "b", "c"].iter().enumerate() {
            let at = start + Duration::from_millis(100 * i as u64);
            ed.type_text(at, ch);
            saves.extend(ed.poll(at));
        }
        saves.extend(ed.poll(start + Duration::from_millis(1100)));
        saves.extend(ed.poll(start + Duration::from_millis(1300)));
        saves.extend(ed.poll(start + Duration::from_millis(5000)));

        // Assert
        assert_eq!(saves.len(), 1);
        assert!(saves[0].content.ends_with("abc"));
    }

    #[test]
    fn given_no_edits_when_polling_then_never_saves() {
        let mut ed = editor();
        assert_eq!(ed.poll(Instant::now() + Duration::from_secs(10)), None);
    }

    #[test]
    fn given_duplicate_tag_when_adding_then_ignored() {
        let now = Instant::now();
        let mut ed = editor();
        assert!(ed.add_tag(now, "web"));
        assert!(!ed.add_tag(now, "web"));
        assert!(!ed.add_tag(now, "  "));
        assert_eq!(ed.tags(), &["web".to_string()]);
    }

    #[test]
    fn given_tag_removed_when_polling_then_payload_lacks_tag() {
        let start = Instant::now();
        let mut ed = editor();
        ed.add_tag(start, "web");
        ed.add_tag(start, "sqli");
        ed.remove_tag(start, "web");

        let saved = ed
            .poll(start + Duration::from_secs(1))
            .expect("Save should fire");
        assert_eq!(saved.tags, vec!["sqli".to_string()]);
    }

    #[test]
    fn given_selection_when_pressing_ctrl_b_then_wraps_and_arms_save() {
        let now = Instant::now();
        let mut ed = editor();
        ed.set_content(now, "flag here");
        ed.cancel();
        ed.select(0, 4);

        assert!(ed.apply_shortcut(now, "ctrl+b"));

        assert_eq!(ed.content(), "**flag** here");
        assert_eq!(ed.selection(), (2, 6));
        assert!(ed.has_pending_save());
    }

    #[test]
    fn given_selection_when_typing_then_replaces_selection() {
        let now = Instant::now();
        let mut ed = editor();
        ed.set_content(now, "hello world");
        ed.select(6, 11);
        ed.type_text(now, "there");
        assert_eq!(ed.content(), "hello there");
    }

    #[test]
    fn given_pending_save_when_flushing_then_returns_payload_once() {
        let now = Instant::now();
        let mut ed = editor();
        ed.set_title(now, "new title");

        assert_eq!(ed.flush().map(|f| f.title), Some("new title".to_string()));
        assert_eq!(ed.flush(), None);
        assert_eq!(ed.poll(now + Duration::from_secs(2)), None);
    }

    #[test]
    fn given_pending_save_when_cancelled_then_nothing_is_saved() {
        let now = Instant::now();
        let mut ed = editor();
        ed.set_title(now, "gone");
        ed.cancel();
        assert_eq!(ed.poll(now + Duration::from_secs(2)), None);
    }
}
