//! AI-backed site summarization.
//!
//! The model is asked for strict JSON carrying a one-phrase topic summary and
//! two keyword lists for ad targeting. Replies that are not valid JSON are not
//! fatal: the raw reply becomes the summary and the lists stay empty.

use crate::traits::LlmClient;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sitetopic_common::{Result, SiteTopicError};
use std::sync::OnceLock;

/// Page text beyond this many characters is not sent to the model.
pub const MAX_AI_INPUT_CHARS: usize = 4000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSummary {
    pub summary: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub negative_keywords: Vec<String>,
}

const SITE_CLASSIFIER_PROMPT: &str = r#"Ты — сервис классификации сайтов.

1) Одной деловой фразой на русском языке опиши тематику сайта: сферу, услугу или товар, а также город или бренд, если они явно указаны.
   Без пояснений, без ссылок, без лишних слов.

2) Составь список ключевых слов и фраз для запуска рекламы в Яндекс.Директ (30–40 штук, только по этому контенту).

3) Составь список минус-слов (30–50 штук), отсекающих нерелевантные запросы.

Ответь СТРОГО валидным JSON следующей структуры, без текста вокруг:
{
  "summary": "краткое описание одной фразой",
  "keywords": ["...", "..."],
  "negative_keywords": ["...", "..."]
}

Контент сайта:
"#;

/// Ask the model to classify a site from its visible text.
///
/// Fails only when the model call itself fails or yields nothing; the caller
/// is expected to fall back to heuristics in that case.
pub async fn summarize_site(llm: &dyn LlmClient, text: &str) -> Result<SiteSummary> {
    let input = truncate_chars(text, MAX_AI_INPUT_CHARS);
    let prompt = format!("{SITE_CLASSIFIER_PROMPT}{input}");

    let resp = llm.generate(&prompt, None, None, None).await?;
    let raw = resp.text.trim();
    if raw.is_empty() {
        return Err(SiteTopicError::Llm("empty AI response".to_string()));
    }

    tracing::debug!(
        model = llm.model_name(),
        tokens_used = ?resp.tokens_used,
        reply_len = raw.len(),
        "ai.summarize.reply"
    );

    Ok(parse_site_summary(raw))
}

/// Decode a model reply, tolerating fenced blocks and prose around the JSON.
pub fn parse_site_summary(raw: &str) -> SiteSummary {
    let json = extract_json_block(raw).unwrap_or_else(|| raw.to_string());
    match serde_json::from_str::<SiteSummary>(&json) {
        Ok(mut parsed) => {
            parsed.summary = parsed.summary.trim().to_string();
            parsed
        }
        Err(e) => {
            tracing::warn!(error = %e, "ai.summarize.malformed_json");
            SiteSummary {
                summary: raw.to_string(),
                ..SiteSummary::default()
            }
        }
    }
}

/// Try to extract a ```json ... ``` fenced block; fall back to the outermost braces.
fn extract_json_block(text: &str) -> Option<String> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    static PLAIN: OnceLock<Option<Regex>> = OnceLock::new();

    let re_fence = FENCE
        .get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").ok())
        .as_ref()?;
    if let Some(caps) = re_fence.captures(text) {
        return Some(caps.get(1)?.as_str().to_string());
    }
    let re_plain = PLAIN
        .get_or_init(|| Regex::new(r"(?s)(\{.*\})").ok())
        .as_ref()?;
    re_plain
        .captures(text)
        .and_then(|c| c.get(1).map(|m| m.as_str().to_string()))
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_strict_json() {
        let s = parse_site_summary(
            r#"{"summary":" Доставка пиццы в Казани ","keywords":["пицца"],"negative_keywords":["бесплатно"]}"#,
        );
        assert_eq!(s.summary, "Доставка пиццы в Казани");
        assert_eq!(s.keywords, vec!["пицца"]);
        assert_eq!(s.negative_keywords, vec!["бесплатно"]);
    }

    #[test]
    fn parses_fenced_json() {
        let raw = "Вот ответ:\n```json\n{\"summary\": \"Юридические услуги\"}\n```";
        let s = parse_site_summary(raw);
        assert_eq!(s.summary, "Юридические услуги");
        assert!(s.keywords.is_empty());
    }

    #[test]
    fn malformed_reply_becomes_summary() {
        let s = parse_site_summary("Интернет-магазин электроники");
        assert_eq!(s.summary, "Интернет-магазин электроники");
        assert!(s.keywords.is_empty());
        assert!(s.negative_keywords.is_empty());
    }

    #[test]
    fn truncation_counts_characters() {
        let text = "ж".repeat(MAX_AI_INPUT_CHARS + 10);
        assert_eq!(truncate_chars(&text, MAX_AI_INPUT_CHARS).chars().count(), MAX_AI_INPUT_CHARS);
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
