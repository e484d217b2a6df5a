//! Visible-text extraction from fetched markup.
//!
//! Fragments are gathered in a fixed priority order: the first `<title>`, the
//! meta description, then `h1`–`h3`, `p` and `li` elements in document order.
//! Relevance never reorders them.

use dom_query::{Document, Selection};

use crate::noise::{STRUCTURAL_NOISE_SELECTOR, is_noisy, normalize_whitespace};

/// Upper bound on the extracted blob, in bytes.
pub const MAX_TEXT_BYTES: usize = 20_000;
/// Content fragments shorter than this (in characters) are dropped.
pub const MIN_FRAGMENT_CHARS: usize = 10;

const CONTENT_SELECTOR: &str = "h1, h2, h3, p, li";
const META_DESCRIPTION_SELECTOR: &str = r#"meta[name="description"]"#;

/// Extract the meaningful visible text of a page.
///
/// Never fails; markup without usable content yields an empty string so the
/// caller's fallback tiers can take over.
///
/// ```
/// use sitetopic_web::extract::extract_visible_text;
///
/// let html = r#"<html><head><title>Пекарня</title></head>
///   <body><script>var x = 1;</script><p>Свежий хлеб каждое утро.</p></body></html>"#;
/// assert_eq!(extract_visible_text(html), "Пекарня Свежий хлеб каждое утро.");
/// ```
pub fn extract_visible_text(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let doc = Document::from(html);
    doc.select(STRUCTURAL_NOISE_SELECTOR).remove();

    let mut parts: Vec<String> = Vec::new();

    let title = normalize_whitespace(&doc.select("title").first().text());
    if !title.is_empty() && !is_noisy(&title) {
        parts.push(title);
    }

    if let Some(desc) = last_meta_description(&doc) {
        if !desc.is_empty() && !is_noisy(&desc) {
            parts.push(desc);
        }
    }

    for node in doc.select(CONTENT_SELECTOR).nodes() {
        let text = normalize_whitespace(&Selection::from(*node).text());
        if !text.is_empty() && !is_noisy(&text) && text.chars().count() >= MIN_FRAGMENT_CHARS {
            parts.push(text);
        }
    }

    let mut text = parts.join(" ");
    truncate_at_byte_boundary(&mut text, MAX_TEXT_BYTES);
    text
}

/// When several description tags exist the last one wins.
fn last_meta_description(doc: &Document) -> Option<String> {
    let mut found = None;
    for node in doc.select(META_DESCRIPTION_SELECTOR).nodes() {
        if let Some(content) = Selection::from(*node).attr("content") {
            found = Some(normalize_whitespace(&content));
        }
    }
    found
}

/// Cut `text` to at most `max` bytes, backing off to a char boundary.
pub(crate) fn truncate_at_byte_boundary(text: &mut String, max: usize) {
    if text.len() <= max {
        return;
    }
    let mut cut = max;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
}
