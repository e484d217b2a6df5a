//! Rule-based topic summaries for extracted page text.
//!
//! Four tiers are tried in order until one produces output: the domain rule
//! table, the first sentence, the first clean sentence from the splitter, and a
//! truncated excerpt. The function is total; every input yields a non-empty
//! summary.

use crate::noise::{has_boilerplate, normalize_whitespace};
use crate::sentences::{is_terminator, split_sentences};

/// Prefix for summaries quoted from the page itself.
pub const SUMMARY_LABEL: &str = "Краткое описание по тексту сайта: ";
/// Returned for empty input.
pub const UNDETERMINED_SUMMARY: &str = "Информация о сайте не определена";

const MIN_SENTENCE_CHARS: usize = 30;
const MAX_SENTENCE_CHARS: usize = 220;
const EXCERPT_CHARS: usize = 180;

/// A keyword rule: matches when every group has at least one term present.
#[derive(Debug)]
pub struct TopicRule {
    pub name: &'static str,
    pub all_of: &'static [&'static [&'static str]],
    pub summary: &'static str,
}

impl TopicRule {
    pub fn matches(&self, lowered: &str) -> bool {
        self.all_of
            .iter()
            .all(|group| group.iter().any(|term| lowered.contains(term)))
    }
}

/// Domain rules, highest precedence first. The first match wins.
pub const TOPIC_RULES: &[TopicRule] = &[
    TopicRule {
        name: "marketplace",
        all_of: &[
            &["маркетплейс", "продавцы", "продавцов", "отзывы", "рейтинг"],
            &["товар", "каталог", "купить", "цены", "доставка"],
        ],
        summary: "Маркетплейс: товары от разных продавцов.",
    },
    TopicRule {
        name: "marketplace_brand",
        all_of: &[&[
            "яндекс маркет",
            "market.yandex",
            "яндекс\u{2011}маркет",
            "yandex market",
        ]],
        summary: "Маркетплейс: Яндекс Маркет (онлайн\u{2011}покупки).",
    },
    TopicRule {
        name: "online_store",
        all_of: &[&[
            "каталог", "товар", "купить", "заказать", "цены", "доставка", "корзина",
        ]],
        summary: "Интернет\u{2011}магазин (каталог товаров, покупки онлайн).",
    },
    TopicRule {
        name: "food_delivery",
        all_of: &[&[
            "доставка еды",
            "пицца",
            "суши",
            "роллы",
            "бургер",
            "заказ еды",
        ]],
        summary: "Доставка готовой еды.",
    },
    TopicRule {
        name: "services",
        all_of: &[&["услуги", "заказать услугу", "портфолио", "наши услуги"]],
        summary: "Сайт компании\u{2011}услугодателя.",
    },
];

/// Summarize page text without any external help.
///
/// ```
/// use sitetopic_web::heuristic::heuristic_summarize;
///
/// let summary = heuristic_summarize("Добро пожаловать! Мы продаём товары, каталог, доставка, цены.");
/// assert_eq!(summary, "Интернет\u{2011}магазин (каталог товаров, покупки онлайн).");
/// ```
pub fn heuristic_summarize(text: &str) -> String {
    if text.trim().is_empty() {
        return UNDETERMINED_SUMMARY.to_string();
    }

    let lowered = text.to_lowercase();
    if let Some(rule) = TOPIC_RULES.iter().find(|rule| rule.matches(&lowered)) {
        tracing::debug!(rule = rule.name, "topic rule matched");
        return rule.summary.to_string();
    }

    let candidate = first_sentence(text);
    if !is_noisy_sentence(candidate) {
        return labelled(candidate);
    }

    if let Some(sentence) = split_sentences(text)
        .into_iter()
        .find(|s| !is_noisy_sentence(s))
    {
        return labelled(&sentence);
    }

    labelled(&excerpt(text))
}

/// A sentence is unusable as a summary when it is blank, looks like code or
/// boilerplate, or falls outside the readable length window.
pub fn is_noisy_sentence(sentence: &str) -> bool {
    let lowered = sentence.trim().to_lowercase();
    if lowered.is_empty() {
        return true;
    }
    if lowered.contains('{') || lowered.contains('}') || has_boilerplate(&lowered) {
        return true;
    }
    let len = lowered.chars().count();
    !(MIN_SENTENCE_CHARS..=MAX_SENTENCE_CHARS).contains(&len)
}

/// Text up to and including the first terminator. A text that starts with a
/// terminator, or has none, is its own candidate.
fn first_sentence(text: &str) -> &str {
    match text.char_indices().find(|(_, c)| is_terminator(*c)) {
        Some((idx, c)) if idx > 0 => text[..idx + c.len_utf8()].trim(),
        _ => text.trim(),
    }
}

fn excerpt(text: &str) -> String {
    let collapsed = normalize_whitespace(text);
    if collapsed.chars().count() <= EXCERPT_CHARS {
        return collapsed;
    }
    let mut cut: String = collapsed.chars().take(EXCERPT_CHARS).collect();
    cut.push('…');
    cut
}

fn labelled(body: &str) -> String {
    format!("{SUMMARY_LABEL}{body}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary_of(name: &str) -> &'static str {
        TOPIC_RULES
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.summary)
            .unwrap()
    }

    #[test]
    fn empty_text_is_undetermined() {
        assert_eq!(heuristic_summarize(""), UNDETERMINED_SUMMARY);
        assert_eq!(heuristic_summarize("   \n"), UNDETERMINED_SUMMARY);
    }

    #[test]
    fn online_store_rule() {
        let text = "Добро пожаловать! Мы продаём товары, каталог, доставка, цены.";
        assert_eq!(heuristic_summarize(text), summary_of("online_store"));
    }

    #[test]
    fn marketplace_needs_both_vocabularies() {
        let text = "Отзывы покупателей и рейтинг продавцов. Купить по лучшей цене.";
        assert_eq!(heuristic_summarize(text), summary_of("marketplace"));

        // Seller vocabulary alone is not enough for the marketplace rule.
        let text = "Рейтинг лучших фильмов года по версии критиков нашего журнала.";
        assert_ne!(heuristic_summarize(text), summary_of("marketplace"));
    }

    #[test]
    fn brand_rule_matches_case_insensitively() {
        let text = "Официальный партнёр Yandex Market в вашем регионе России.";
        assert_eq!(heuristic_summarize(text), summary_of("marketplace_brand"));
    }

    #[test]
    fn rule_precedence_is_fixed() {
        // "пицца" would match food delivery, but "заказать" hits the store rule first.
        let text = "Пицца и роллы: заказать на дом быстро и вкусно.";
        assert_eq!(heuristic_summarize(text), summary_of("online_store"));

        let text = "Горячая пицца и свежие роллы от нашего повара каждый день.";
        assert_eq!(heuristic_summarize(text), summary_of("food_delivery"));

        let text = "Наши услуги: проектирование домов, портфолио работ.";
        assert_eq!(heuristic_summarize(text), summary_of("services"));
    }

    #[test]
    fn first_sentence_is_quoted_when_clean() {
        let text = "Мы проектируем мосты и тоннели для городов Сибири. Работаем с 1998 года.";
        assert_eq!(
            heuristic_summarize(text),
            format!("{SUMMARY_LABEL}Мы проектируем мосты и тоннели для городов Сибири.")
        );
    }

    #[test]
    fn short_first_sentence_falls_through_to_sentence_list() {
        let text = "Привет! Мы проектируем мосты и тоннели для городов Сибири.";
        assert_eq!(
            heuristic_summarize(text),
            format!("{SUMMARY_LABEL}Мы проектируем мосты и тоннели для городов Сибири.")
        );
    }

    #[test]
    fn boilerplate_sentence_is_skipped() {
        let text = "Этот сайт использует cookie для работы статистики. \
                    Студия йоги в центре Новосибирска для начинающих.";
        assert_eq!(
            heuristic_summarize(text),
            format!("{SUMMARY_LABEL}Студия йоги в центре Новосибирска для начинающих.")
        );
    }

    #[test]
    fn excerpt_is_last_resort() {
        assert_eq!(heuristic_summarize("Йога"), format!("{SUMMARY_LABEL}Йога"));

        let long = "слово ".repeat(100);
        let summary = heuristic_summarize(&long);
        let body = summary.strip_prefix(SUMMARY_LABEL).unwrap();
        assert_eq!(body.chars().count(), EXCERPT_CHARS + 1);
        assert!(body.ends_with('…'));
    }

    #[test]
    fn never_empty() {
        for text in ["", ".", "…", "{}", "a", "!!!", "cookie", "  x  "] {
            assert!(!heuristic_summarize(text).is_empty(), "{text:?}");
        }
    }

    #[test]
    fn sentence_window_is_measured_in_characters() {
        // 29 Cyrillic letters are 58 bytes but still too short.
        assert!(is_noisy_sentence(&"я".repeat(29)));
        assert!(!is_noisy_sentence(&"я".repeat(30)));
        assert!(!is_noisy_sentence(&"я".repeat(220)));
        assert!(is_noisy_sentence(&"я".repeat(221)));
    }
}
