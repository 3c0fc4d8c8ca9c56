// src/ports/markdown.rs
use lazy_static::lazy_static;
use pulldown_cmark::{html, Options, Parser};
use regex::Regex;

lazy_static! {
    // Raw <script> blocks in note content must not execute in the preview
    static ref SCRIPT_TAG_REGEX: Regex =
        Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("Failed to compile script regex");
}

/// Renders note markdown the way the live preview pane shows it:
/// GitHub-style tables, strikethrough, task lists and footnotes, raw HTML kept.
pub fn markdown_to_html(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(text, options);

    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);

    SCRIPT_TAG_REGEX.replace_all(&html_output, "").into_owned()
}
