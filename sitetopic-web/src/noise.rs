//! Lexical noise detection for text fragments.
//!
//! Everything here is a pure function of its input so the rules can be tested
//! without a document, a network, or any shared state.

/// Subtrees removed from the document before any text is read.
pub const STRUCTURAL_NOISE_SELECTOR: &str =
    "script, style, noscript, nav, header, footer, template, svg, iframe, aside";

/// Widget/cookie/tracking vocabulary; matched against lower-cased text.
pub const BOILERPLATE_TERMS: &[&str] = &["widgets", "cookie", "tracking"];

/// Non-letter to letter ratio above which a fragment looks like code or symbols.
const MAX_SYMBOL_RATIO: f64 = 0.7;

/// Collapse every run of whitespace into a single space and trim the ends.
///
/// ```
/// use sitetopic_web::noise::normalize_whitespace;
///
/// assert_eq!(normalize_whitespace("  Пицца \n\t на  заказ "), "Пицца на заказ");
/// ```
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when the lower-cased text mentions any boilerplate term.
pub fn has_boilerplate(lowered: &str) -> bool {
    BOILERPLATE_TERMS.iter().any(|term| lowered.contains(term))
}

/// Decide whether a fragment is structural noise rather than visible content.
///
/// Callers pass normalized fragments; the density rule counts every
/// non-space character that is not a Latin or Russian letter.
///
/// ```
/// use sitetopic_web::noise::is_noisy;
///
/// assert!(is_noisy(r#"{"@context":"https://schema.org"}"#));
/// assert!(is_noisy("Мы используем cookie для аналитики"));
/// assert!(!is_noisy("Свежая выпечка каждый день"));
/// ```
pub fn is_noisy(fragment: &str) -> bool {
    let lowered = fragment.to_lowercase();

    if lowered.contains('{') && lowered.contains('}') {
        return true;
    }
    if lowered.contains('[') && lowered.contains(']') {
        return true;
    }
    if has_boilerplate(&lowered) {
        return true;
    }

    let (letters, others) = lowered.chars().fold((0usize, 0usize), |(l, o), c| {
        if is_counted_letter(c) {
            (l + 1, o)
        } else if c != ' ' {
            (l, o + 1)
        } else {
            (l, o)
        }
    });

    letters > 0 && others as f64 / (letters + 1) as f64 > MAX_SYMBOL_RATIO
}

fn is_counted_letter(c: char) -> bool {
    c.is_ascii_lowercase() || ('а'..='я').contains(&c) || c == 'ё'
}
