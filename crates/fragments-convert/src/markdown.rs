//! Markdown to HTML rendering.
//!
//! CommonMark with the table and strikethrough extensions, rendered by
//! `pulldown-cmark`. Output is deterministic for a given input.

use pulldown_cmark::{html, Options, Parser};

/// Render Markdown source to an HTML fragment.
pub fn render_markdown(source: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(source, options);
    let mut out = String::with_capacity(source.len() + source.len() / 2);
    html::push_html(&mut out, parser);
    out
}
