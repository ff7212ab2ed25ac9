//! Markdown conversion and plain-text projection.
//!
//! The conversion itself is delegated to `pulldown-cmark` behind a single
//! opaque function; everything else here turns rendered HTML back into the
//! plain-text previews and excerpts used by summary views, related-post
//! records, and feed descriptions.

use pulldown_cmark::{Options, Parser, html};

/// Convert Markdown source to HTML.
pub fn markdown_to_html(source: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(source, options);
    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Strip tags from an HTML fragment and collapse whitespace.
pub fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;

    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                // Tag boundaries separate words ("<p>a</p><p>b</p>")
                out.push(' ');
            }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }

    let decoded = out
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");

    // Collapse whitespace, then mend the gaps tag removal left before
    // punctuation ("</a>." would otherwise read "link .")
    decoded
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace(" .", ".")
        .replace(" ,", ",")
        .replace(" ;", ";")
        .replace(" :", ":")
        .replace(" !", "!")
        .replace(" ?", "?")
}

/// Truncate at a word boundary within `max_len` characters, appending an
/// ellipsis when anything was cut.
pub fn truncate_at_word_boundary(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }

    let cut: String = text.chars().take(max_len).collect();
    let truncated = match cut.rfind(char::is_whitespace) {
        Some(idx) if idx > 0 => cut[..idx].trim_end(),
        _ => cut.as_str(),
    };
    format!("{truncated}…")
}

/// Plain-text preview of a Markdown body, truncated at a word boundary.
pub fn plain_text_preview(markdown: &str, max_len: usize) -> String {
    truncate_at_word_boundary(&strip_html(&markdown_to_html(markdown)), max_len)
}

/// Normalize an excerpt string to a character cap.
pub fn excerpt_text(text: &str, max_len: usize) -> String {
    truncate_at_word_boundary(text.trim(), max_len)
}

// ============================================================================
// Tests
// ============================================================================
