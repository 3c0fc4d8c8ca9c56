// src/ports/html.rs
use crate::domain::Note;
use crate::ports::markdown::markdown_to_html;
use html_escape::encode_text;
use tracing::instrument;

/// Builds a standalone HTML page previewing a note
#[derive(Debug, Default)]
pub struct HtmlPresenter;

impl HtmlPresenter {
    pub fn new() -> Self {
        Self
    }

    #[instrument(level = "debug", skip(self, note), fields(note_id = note.id))]
    pub fn render(&self, note: &Note) -> String {
        let body = markdown_to_html(&note.content);
        let title = encode_text(&note.title);
        let tags = if note.tags.is_empty() {
            "No tags".to_string()
        } else {
            note.tags
                .iter()
                .map(|t| format!(r#"<span class="tag">{}</span>"#, encode_text(t)))
                .collect::<Vec<_>>()
                .join("")
        };
        let favorite = if note.is_favorite { " ★" } else { "" };

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/highlight.js/11.9.0/styles/github.min.css">
    <script src="https://cdnjs.cloudflare.com/ajax/libs/highlight.js/11.9.0/highlight.min.js"></script>
    <script>document.addEventListener('DOMContentLoaded', () => hljs.highlightAll());</script>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
            line-height: 1.6;
            max-width: 860px;
            margin: 2rem auto;
            padding: 0 1rem;
            background-color: #f5f5f5;
        }}
        .note {{
            background: white;
            border-radius: 8px;
            padding: 2rem;
            box-shadow: 0 2px 4px rgba(0,0,0,0.1);
        }}
        pre {{
            white-space: pre-wrap;
            word-wrap: break-word;
            background-color: #f8f9fa;
            padding: 1rem;
            border-radius: 4px;
            overflow-x: auto;
        }}
        code {{
            background-color: #f0f0f0;
            padding: 2px 4px;
            border-radius: 3px;
            font-family: monospace;
        }}
        table {{
            border-collapse: collapse;
        }}
        th, td {{
            border: 1px solid #ddd;
            padding: 4px 8px;
        }}
        blockquote {{
            border-left: 4px solid #ddd;
            margin-left: 0;
            padding-left: 1rem;
            color: #555;
        }}
        .tag {{
            display: inline-block;
            background: #e0e0e0;
            padding: 4px 8px;
            border-radius: 4px;
            margin-right: 8px;
            font-size: 0.8em;
        }}
        .note-info {{
            margin-top: 1rem;
            padding-top: 1rem;
            border-top: 1px solid #eee;
            font-size: 0.9em;
            color: #666;
        }}
    </style>
</head>
<body>
    <div class="note">
        <h2>{title}{favorite}</h2>
        <div class="tags">{tags}</div>
        <div class="content">{body}</div>
        <div class="note-info">
            <div>Note ID: {id}</div>
            <div>Updated: {updated}</div>
        </div>
    </div>
</body>
</html>"#,
            title = title,
            favorite = favorite,
            tags = tags,
            body = body,
            id = note.id,
            updated = note.updated_at.format("%Y-%m-%d %H:%M"),
        )
    }
}
