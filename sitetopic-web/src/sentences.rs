//! Sentence splitting on `.`, `!`, `?` and `…`.

/// Characters that close a sentence span.
pub const SENTENCE_TERMINATORS: [char; 4] = ['.', '!', '?', '…'];

pub fn is_terminator(c: char) -> bool {
    SENTENCE_TERMINATORS.contains(&c)
}

/// Split text into trimmed sentences, each keeping its terminator.
///
/// Text after the last terminator becomes a final sentence when it is not blank.
///
/// ```
/// use sitetopic_web::sentences::split_sentences;
///
/// let parts = split_sentences("Привет! Как дела? Всё хорошо… без точки");
/// assert_eq!(parts, vec!["Привет!", "Как дела?", "Всё хорошо…", "без точки"]);
/// ```
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut start = 0;

    for (idx, c) in text.char_indices() {
        if is_terminator(c) {
            let end = idx + c.len_utf8();
            let part = text[start..end].trim();
            if !part.is_empty() {
                out.push(part.to_string());
            }
            start = end;
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        out.push(tail.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_every_terminator() {
        let text = "Раз. Два! Три? Четыре… Пять.";
        let joined: String = split_sentences(text).concat();
        let expected: Vec<char> = text.chars().filter(|c| is_terminator(*c)).collect();
        let got: Vec<char> = joined.chars().filter(|c| is_terminator(*c)).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn non_blank_input_yields_a_sentence() {
        assert_eq!(split_sentences("без терминатора"), vec!["без терминатора"]);
        assert_eq!(split_sentences("."), vec!["."]);
        assert!(split_sentences("   ").is_empty());
        assert!(split_sentences("").is_empty());
    }

    #[test]
    fn consecutive_terminators_form_their_own_spans() {
        assert_eq!(split_sentences("Что?! Да."), vec!["Что?", "!", "Да."]);
    }

    #[test]
    fn whitespace_around_sentences_is_trimmed() {
        assert_eq!(
            split_sentences("  Первое.\n\n  Второе.  "),
            vec!["Первое.", "Второе."]
        );
    }
}
