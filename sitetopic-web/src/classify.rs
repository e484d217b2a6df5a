//! The per-request classification pipeline.
//!
//! fetch → extract → (AI | heuristics) → fallback. Only the fetch can fail
//! from the caller's point of view; once markup is in hand a summary is
//! always produced.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sitetopic_common::{OUTPUT_LANG, Result, SiteTopicError};
use sitetopic_llm::summarize::{SiteSummary, summarize_site};
use sitetopic_llm::traits::LlmClient;
use tokio::time::{Instant, timeout, timeout_at};
use url::Url;

use crate::extract::extract_visible_text;
use crate::fallback::{UNKNOWN_TOPIC_SUMMARY, fallback_summary, is_low_text};
use crate::fetch::PageFetcher;
use crate::heuristic::heuristic_summarize;

/// Where a summary came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Ai,
    Heuristic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub summary: String,
    pub lang: String,
    pub source: Source,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub negative_keywords: Vec<String>,
}

impl ClassificationResult {
    pub fn heuristic(summary: String) -> Self {
        Self {
            summary,
            lang: OUTPUT_LANG.to_string(),
            source: Source::Heuristic,
            keywords: Vec::new(),
            negative_keywords: Vec::new(),
        }
    }

    fn from_ai(summary: SiteSummary) -> Self {
        Self {
            summary: summary.summary,
            lang: OUTPUT_LANG.to_string(),
            source: Source::Ai,
            keywords: summary.keywords,
            negative_keywords: summary.negative_keywords,
        }
    }
}

/// Time budgets for one classification.
#[derive(Debug, Clone, Copy)]
pub struct ClassifierSettings {
    /// Outer deadline covering the fetch and the AI call.
    pub request_timeout: Duration,
    pub fetch_timeout: Duration,
    /// Cap on the AI call; further limited by what is left of the outer deadline.
    pub ai_timeout: Duration,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(12),
            fetch_timeout: Duration::from_secs(10),
            ai_timeout: Duration::from_secs(10),
        }
    }
}

/// Stateless apart from its collaborators; share it behind an `Arc`.
pub struct Classifier {
    fetcher: Arc<dyn PageFetcher>,
    llm: Option<Arc<dyn LlmClient>>,
    settings: ClassifierSettings,
}

impl Classifier {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        llm: Option<Arc<dyn LlmClient>>,
        settings: ClassifierSettings,
    ) -> Self {
        Self {
            fetcher,
            llm,
            settings,
        }
    }

    /// True when an AI collaborator is wired in.
    pub fn has_ai(&self) -> bool {
        self.llm.is_some()
    }

    /// Classify the page at `url`. `use_ai` is ignored when no AI client is
    /// configured.
    pub async fn classify(&self, url: &Url, use_ai: bool) -> Result<ClassificationResult> {
        let deadline = Instant::now() + self.settings.request_timeout;
        let use_ai = use_ai && self.has_ai();
        tracing::info!(use_ai, url = %url, "classify.start");

        let fetch_budget = self.settings.fetch_timeout.min(self.settings.request_timeout);
        let html = match timeout_at(deadline, self.fetcher.fetch(url, fetch_budget)).await {
            Ok(res) => res?,
            Err(_) => return Err(SiteTopicError::Timeout),
        };

        let text = extract_visible_text(&html);
        tracing::info!(text_len = text.len(), "classify.extracted");

        if is_low_text(&text) {
            return Ok(self.classify_low_text(url, &html, use_ai, deadline).await);
        }

        let mut result = None;
        if use_ai {
            result = self
                .ask_ai(&text, deadline)
                .await
                .map(ClassificationResult::from_ai);
            if result.is_none() {
                tracing::info!("classify.ai_fallback_to_heuristic");
            }
        }
        let mut result =
            result.unwrap_or_else(|| ClassificationResult::heuristic(heuristic_summarize(&text)));

        if result.summary.trim().is_empty() {
            tracing::info!("classify.empty_summary_fallback");
            let summary = fallback_summary(url, &html);
            result.summary = if summary.trim().is_empty() {
                UNKNOWN_TOPIC_SUMMARY.to_string()
            } else {
                summary
            };
        }

        tracing::info!(source = ?result.source, "classify.done");
        Ok(result)
    }

    async fn classify_low_text(
        &self,
        url: &Url,
        html: &str,
        use_ai: bool,
        deadline: Instant,
    ) -> ClassificationResult {
        let brief = fallback_summary(url, html);
        let host = url.host_str().unwrap_or_default();
        tracing::info!(host, "classify.low_text");

        if use_ai {
            let mut input = format!("Домен: {host}");
            if !brief.trim().is_empty() {
                input.push_str("\nTitle/Meta: ");
                input.push_str(brief.trim());
            }
            if let Some(summary) = self.ask_ai(&input, deadline).await {
                return ClassificationResult::from_ai(summary);
            }
            tracing::info!("classify.ai_fallback_to_heuristic");
        }

        if brief.trim().is_empty() {
            ClassificationResult::heuristic(format!("Веб-сайт компании/сервиса {host}"))
        } else {
            ClassificationResult::heuristic(brief)
        }
    }

    /// One AI attempt bounded by the AI timeout and the outer deadline.
    /// Every failure mode collapses to `None`.
    async fn ask_ai(&self, input: &str, deadline: Instant) -> Option<SiteSummary> {
        let llm = self.llm.as_ref()?;
        let left = deadline.saturating_duration_since(Instant::now());
        let budget = self.settings.ai_timeout.min(left);
        if budget.is_zero() {
            tracing::warn!("classify.ai_skipped_no_time_left");
            return None;
        }

        match timeout(budget, summarize_site(llm.as_ref(), input)).await {
            Ok(Ok(summary)) if !summary.summary.trim().is_empty() => {
                tracing::info!(
                    keywords = summary.keywords.len(),
                    negative_keywords = summary.negative_keywords.len(),
                    "classify.ai_ok"
                );
                Some(summary)
            }
            Ok(Ok(_)) => {
                tracing::warn!("classify.ai_empty_summary");
                None
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "classify.ai_failed");
                None
            }
            Err(_) => {
                tracing::warn!(budget_ms = budget.as_millis() as u64, "classify.ai_timeout");
                None
            }
        }
    }
}
