//! Minimal summaries for pages that carry almost no visible text.

use dom_query::Document;
use url::Url;

use crate::heuristic::SUMMARY_LABEL;
use crate::noise::normalize_whitespace;

/// Extracted text shorter than this (in characters) goes down the low-text path.
pub const LOW_TEXT_THRESHOLD: usize = 40;
/// Returned when neither the markup nor the URL names anything.
pub const UNKNOWN_TOPIC_SUMMARY: &str = "Не удалось определить тематику сайта";

/// Summarize from the page title, the meta description, or the host name, in
/// that order.
///
/// ```
/// use sitetopic_web::fallback::fallback_summary;
/// use url::Url;
///
/// let url = Url::parse("https://pizza.example/").unwrap();
/// assert_eq!(
///     fallback_summary(&url, "<title>Pizza Place</title>"),
///     "Краткое описание по тексту сайта: Pizza Place"
/// );
/// assert_eq!(fallback_summary(&url, ""), "Сайт: pizza.example");
/// ```
pub fn fallback_summary(url: &Url, html: &str) -> String {
    if let Some(brief) = markup_brief(html) {
        return format!("{SUMMARY_LABEL}{brief}");
    }
    match url.host_str() {
        Some(host) if !host.is_empty() => format!("Сайт: {host}"),
        _ => UNKNOWN_TOPIC_SUMMARY.to_string(),
    }
}

/// Whether extracted text is too thin to classify on its own.
pub fn is_low_text(text: &str) -> bool {
    text.trim().chars().count() < LOW_TEXT_THRESHOLD
}

fn markup_brief(html: &str) -> Option<String> {
    if html.trim().is_empty() {
        return None;
    }
    let doc = Document::from(html);

    let title = normalize_whitespace(&doc.select("title").first().text());
    if !title.is_empty() {
        return Some(title);
    }

    // Attribute lookup reads the first matching tag only.
    let desc = doc
        .select(r#"meta[name="description"]"#)
        .first()
        .attr("content")
        .map(|c| normalize_whitespace(&c))
        .unwrap_or_default();
    (!desc.is_empty()).then_some(desc)
}
