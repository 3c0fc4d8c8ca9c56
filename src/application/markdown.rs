// src/application/markdown.rs
//! Markdown quick-insert: wraps the current selection of the content buffer
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkdownSnippet {
    Bold,
    Italic,
    BulletList,
    NumberedList,
    Quote,
    CodeBlock,
    Table,
    Link,
    Image,
}

impl MarkdownSnippet {
    pub const ALL: [MarkdownSnippet; 9] = [
        MarkdownSnippet::Bold,
        MarkdownSnippet::Italic,
        MarkdownSnippet::BulletList,
        MarkdownSnippet::NumberedList,
        MarkdownSnippet::Quote,
        MarkdownSnippet::CodeBlock,
        MarkdownSnippet::Table,
        MarkdownSnippet::Link,
        MarkdownSnippet::Image,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MarkdownSnippet::Bold => "bold",
            MarkdownSnippet::Italic => "italic",
            MarkdownSnippet::BulletList => "list",
            MarkdownSnippet::NumberedList => "numbered",
            MarkdownSnippet::Quote => "quote",
            MarkdownSnippet::CodeBlock => "code",
            MarkdownSnippet::Table => "table",
            MarkdownSnippet::Link => "link",
            MarkdownSnippet::Image => "image",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.name().eq_ignore_ascii_case(name.trim()))
    }

    fn placeholder(&self) -> &'static str {
        match self {
            MarkdownSnippet::Bold => "bold text",
            MarkdownSnippet::Italic => "italic text",
            MarkdownSnippet::BulletList => "Item",
            MarkdownSnippet::NumberedList => "First",
            MarkdownSnippet::Quote => "Quote",
            MarkdownSnippet::CodeBlock => "code here",
            MarkdownSnippet::Table => "Header 1",
            MarkdownSnippet::Link => "link text",
            MarkdownSnippet::Image => "alt text",
        }
    }

    fn is_block(&self) -> bool {
        matches!(
            self,
            MarkdownSnippet::BulletList
                | MarkdownSnippet::NumberedList
                | MarkdownSnippet::Quote
                | MarkdownSnippet::CodeBlock
                | MarkdownSnippet::Table
        )
    }

    /// Returns the replacement text and the range inside it that should end up selected
    fn wrap(&self, selected: &str) -> (String, Range<usize>) {
        let body = if selected.is_empty() {
            self.placeholder()
        } else {
            selected
        };

        let surround = |prefix: &str, suffix: &str| {
            let text = format!("{prefix}{body}{suffix}");
            (text, prefix.len()..prefix.len() + body.len())
        };

        match self {
            MarkdownSnippet::Bold => surround("**", "**"),
            MarkdownSnippet::Italic => surround("*", "*"),
            MarkdownSnippet::CodeBlock => surround("```\n", "\n```"),
            MarkdownSnippet::Link => surround("[", "](url)"),
            MarkdownSnippet::Image => surround("![", "](image_url)"),
            MarkdownSnippet::Table => surround(
                "| ",
                " | Header 2 |\n|-----------|-----------|\n| Cell 1 | Cell 2 |",
            ),
            MarkdownSnippet::BulletList => prefix_lines(body, |_| "- ".to_string()),
            MarkdownSnippet::NumberedList => prefix_lines(body, |i| format!("{}. ", i + 1)),
            MarkdownSnippet::Quote => prefix_lines(body, |_| "> ".to_string()),
        }
    }
}

fn prefix_lines(body: &str, prefix: impl Fn(usize) -> String) -> (String, Range<usize>) {
    let text = body
        .lines()
        .enumerate()
        .map(|(i, line)| format!("{}{}", prefix(i), line))
        .collect::<Vec<_>>()
        .join("\n");
    let len = text.len();
    (text, 0..len)
}

/// Keyboard chords bound to toolbar actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    CtrlB,
    CtrlI,
}

impl Shortcut {
    pub fn parse(chord: &str) -> Option<Self> {
        match chord.trim().to_ascii_lowercase().replace(' ', "").as_str() {
            "ctrl+b" | "c-b" | "^b" => Some(Shortcut::CtrlB),
            "ctrl+i" | "c-i" | "^i" => Some(Shortcut::CtrlI),
            _ => None,
        }
    }

    pub fn snippet(&self) -> MarkdownSnippet {
        match self {
            Shortcut::CtrlB => MarkdownSnippet::Bold,
            Shortcut::CtrlI => MarkdownSnippet::Italic,
        }
    }
}

/// Largest char boundary of `s` that is `<= index`
pub fn floor_char_boundary(s: &str, index: usize) -> usize {
    let mut index = index.min(s.len());
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Applies `snippet` to `content[start..end]` and returns the new content with the new selection
pub fn insert_snippet(
    content: &str,
    start: usize,
    end: usize,
    snippet: MarkdownSnippet,
) -> (String, Range<usize>) {
    let (start, end) = {
        let a = floor_char_boundary(content, start);
        let b = floor_char_boundary(content, end);
        (a.min(b), a.max(b))
    };

    let (mut replacement, mut selected) = snippet.wrap(&content[start..end]);
    if snippet.is_block() && start > 0 && !content[..start].ends_with('\n') {
        replacement.insert(0, '\n');
        selected = selected.start + 1..selected.end + 1;
    }

    let mut out = String::with_capacity(content.len() + replacement.len());
    out.push_str(&content[..start]);
    out.push_str(&replacement);
    out.push_str(&content[end..]);

    (out, start + selected.start..start + selected.end)
}
