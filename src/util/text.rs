// src/util/text.rs
use html_escape::decode_html_entities;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref MARKUP_PREFIX: Regex =
        Regex::new(r"^(?:#{1,6}\s+|>\s*|[-*+]\s+|\d+\.\s+)+").expect("valid prefix regex");
    static ref INLINE_MARKUP: Regex =
        Regex::new(r"(\*\*|\*|`)").expect("valid inline regex");
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]+>").expect("valid tag regex");
}

/// Extract the first line of plain text from markdown content.
///
/// Skips blank lines and code fences, strips heading/list/quote markers,
/// inline emphasis and raw HTML tags, and decodes HTML entities.
///
/// # Examples
///
/// ```
/// use ctfdesk::util::text::first_line;
///
/// let md = "\n# Heap &amp; tcache\n\nbody";
/// assert_eq!(first_line(md), "Heap & tcache");
/// ```
pub fn first_line(markdown: &str) -> String {
    markdown
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("```"))
        .map(|line| {
            let line = MARKUP_PREFIX.replace(line, "");
            let line = HTML_TAG.replace_all(&line, "");
            let line = INLINE_MARKUP.replace_all(&line, "");
            decode_html_entities(line.trim()).to_string()
        })
        .find(|line| !line.is_empty())
        .unwrap_or_default()
}

/// Shortens `text` to at most `max` characters, marking the cut with an ellipsis
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_heading_when_extracting_first_line_then_strips_marker() {
        assert_eq!(first_line("## Recon\nnmap"), "Recon");
    }

    #[test]
    fn given_leading_code_fence_when_extracting_first_line_then_skips_fence() {
        assert_eq!(first_line("```\nls -la\n```"), "ls -la");
    }

    #[test]
    fn given_emphasis_when_extracting_first_line_then_removes_markup() {
        assert_eq!(first_line("- **bold** and `code`"), "bold and code");
    }

    #[test]
    fn given_empty_content_when_extracting_first_line_then_returns_empty_string() {
        assert_eq!(first_line("\n  \n"), "");
    }

    #[test]
    fn given_long_text_when_truncating_then_keeps_limit_with_ellipsis() {
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("abc", 4), "abc");
    }

    #[test]
    fn given_multibyte_text_when_truncating_then_cuts_on_chars() {
        assert_eq!(truncate("ééééé", 3), "éé…");
    }
}
