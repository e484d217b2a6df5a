mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sitetopic_common::{Result, SiteTopicError};
use sitetopic_llm::traits::{LlmClient, LlmResponse};
use sitetopic_web::heuristic::SUMMARY_LABEL;
use sitetopic_web::{Classifier, ClassifierSettings, PageFetcher, Source};
use url::Url;

const STORE_PAGE: &str = r#"<html><head><title>Магазин инструментов</title></head><body>
    <p>Добро пожаловать! Мы продаём товары, каталог, доставка, цены.</p>
</body></html>"#;

struct StaticPage {
    html: String,
    delay: Duration,
}

impl StaticPage {
    fn new(html: &str) -> Arc<Self> {
        Arc::new(Self {
            html: html.to_string(),
            delay: Duration::ZERO,
        })
    }
}

#[async_trait]
impl PageFetcher for StaticPage {
    async fn fetch(&self, _url: &Url, _timeout: Duration) -> Result<String> {
        tokio::time::sleep(self.delay).await;
        Ok(self.html.clone())
    }
}

struct BrokenSite;

#[async_trait]
impl PageFetcher for BrokenSite {
    async fn fetch(&self, _url: &Url, _timeout: Duration) -> Result<String> {
        Err(SiteTopicError::Fetch("non-2xx status: 404 Not Found".into()))
    }
}

/// Replays a fixed outcome and records every prompt it was given.
struct ScriptedLlm {
    reply: std::result::Result<String, String>,
    delay: Duration,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(r#"{"summary":"слишком поздно"}"#.to_string()),
            delay,
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn generate(
        &self,
        prompt: &str,
        _system_prompt: Option<&str>,
        _max_tokens: Option<u32>,
        _temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        tokio::time::sleep(self.delay).await;
        match &self.reply {
            Ok(text) => Ok(LlmResponse {
                text: text.clone(),
                model: Some("scripted".into()),
                tokens_used: None,
            }),
            Err(message) => Err(SiteTopicError::Llm(message.clone())),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

fn classifier(fetcher: Arc<dyn PageFetcher>, llm: Option<Arc<dyn LlmClient>>) -> Classifier {
    Classifier::new(fetcher, llm, ClassifierSettings::default())
}

#[tokio::test]
async fn heuristic_path_without_ai() {
    common::init_test_tracing();
    let c = classifier(StaticPage::new(STORE_PAGE), None);

    let result = c.classify(&url("https://tools.example/"), true).await.unwrap();
    assert_eq!(result.source, Source::Heuristic);
    assert_eq!(result.lang, "ru");
    assert_eq!(
        result.summary,
        "Интернет\u{2011}магазин (каталог товаров, покупки онлайн)."
    );
    assert!(result.keywords.is_empty());
}

#[tokio::test]
async fn ai_summary_is_used_when_enabled() {
    common::init_test_tracing();
    let llm = ScriptedLlm::replying(
        "```json\n{\"summary\":\"Магазин инструментов\",\"keywords\":[\"дрель\"],\"negative_keywords\":[\"бесплатно\"]}\n```",
    );
    let c = classifier(StaticPage::new(STORE_PAGE), Some(llm.clone()));

    let result = c.classify(&url("https://tools.example/"), true).await.unwrap();
    assert_eq!(result.source, Source::Ai);
    assert_eq!(result.summary, "Магазин инструментов");
    assert_eq!(result.keywords, vec!["дрель"]);
    assert_eq!(result.negative_keywords, vec!["бесплатно"]);

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Мы продаём товары"));
}

#[tokio::test]
async fn ai_not_consulted_when_caller_opts_out() {
    common::init_test_tracing();
    let llm = ScriptedLlm::replying(r#"{"summary":"не должно использоваться"}"#);
    let c = classifier(StaticPage::new(STORE_PAGE), Some(llm.clone()));

    let result = c.classify(&url("https://tools.example/"), false).await.unwrap();
    assert_eq!(result.source, Source::Heuristic);
    assert!(llm.prompts().is_empty());
}

#[tokio::test]
async fn ai_failure_falls_back_to_heuristic() {
    common::init_test_tracing();
    let c = classifier(
        StaticPage::new(STORE_PAGE),
        Some(ScriptedLlm::failing("no choices from AI")),
    );

    let result = c.classify(&url("https://tools.example/"), true).await.unwrap();
    assert_eq!(result.source, Source::Heuristic);
    assert!(!result.summary.is_empty());
}

#[tokio::test]
async fn ai_blank_summary_falls_back_to_heuristic() {
    common::init_test_tracing();
    let c = classifier(
        StaticPage::new(STORE_PAGE),
        Some(ScriptedLlm::replying(r#"{"summary":"   ","keywords":["x"]}"#)),
    );

    let result = c.classify(&url("https://tools.example/"), true).await.unwrap();
    assert_eq!(result.source, Source::Heuristic);
    assert!(result.keywords.is_empty());
}

#[tokio::test]
async fn ai_timeout_falls_back_to_heuristic() {
    common::init_test_tracing();
    let settings = ClassifierSettings {
        ai_timeout: Duration::from_millis(50),
        ..ClassifierSettings::default()
    };
    let c = Classifier::new(
        StaticPage::new(STORE_PAGE),
        Some(ScriptedLlm::slow(Duration::from_secs(5))),
        settings,
    );

    let started = std::time::Instant::now();
    let result = c.classify(&url("https://tools.example/"), true).await.unwrap();
    assert_eq!(result.source, Source::Heuristic);
    assert!(!result.summary.is_empty());
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn ai_budget_is_capped_by_outer_deadline() {
    common::init_test_tracing();
    let settings = ClassifierSettings {
        request_timeout: Duration::from_millis(300),
        fetch_timeout: Duration::from_millis(300),
        ai_timeout: Duration::from_secs(10),
    };
    let fetcher = Arc::new(StaticPage {
        html: STORE_PAGE.to_string(),
        delay: Duration::from_millis(100),
    });
    let c = Classifier::new(
        fetcher,
        Some(ScriptedLlm::slow(Duration::from_secs(5))),
        settings,
    );

    let started = std::time::Instant::now();
    let result = c.classify(&url("https://tools.example/"), true).await.unwrap();
    assert_eq!(result.source, Source::Heuristic);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn low_text_page_uses_title() {
    common::init_test_tracing();
    let c = classifier(StaticPage::new("<title>Pizza Place</title>"), None);

    let result = c.classify(&url("https://pizza.example/"), false).await.unwrap();
    assert_eq!(result.source, Source::Heuristic);
    assert_eq!(result.summary, format!("{SUMMARY_LABEL}Pizza Place"));
}

#[tokio::test]
async fn low_text_page_without_markup_names_host() {
    common::init_test_tracing();
    let c = classifier(StaticPage::new(""), None);

    let result = c.classify(&url("https://empty.example/"), false).await.unwrap();
    assert_eq!(result.source, Source::Heuristic);
    assert_eq!(result.summary, "Сайт: empty.example");
}

#[tokio::test]
async fn low_text_page_asks_ai_with_domain_and_brief() {
    common::init_test_tracing();
    let llm = ScriptedLlm::replying(r#"{"summary":"Пиццерия в Казани","keywords":["пицца"]}"#);
    let c = classifier(
        StaticPage::new("<title>Pizza Place</title>"),
        Some(llm.clone()),
    );

    let result = c.classify(&url("https://pizza.example/"), true).await.unwrap();
    assert_eq!(result.source, Source::Ai);
    assert_eq!(result.summary, "Пиццерия в Казани");
    assert_eq!(result.keywords, vec!["пицца"]);

    let prompts = llm.prompts();
    assert!(prompts[0].ends_with(&format!(
        "Домен: pizza.example\nTitle/Meta: {SUMMARY_LABEL}Pizza Place"
    )));
}

#[tokio::test]
async fn low_text_ai_failure_returns_brief() {
    common::init_test_tracing();
    let c = classifier(
        StaticPage::new("<title>Pizza Place</title>"),
        Some(ScriptedLlm::failing("boom")),
    );

    let result = c.classify(&url("https://pizza.example/"), true).await.unwrap();
    assert_eq!(result.source, Source::Heuristic);
    assert_eq!(result.summary, format!("{SUMMARY_LABEL}Pizza Place"));
}

#[tokio::test]
async fn fetch_errors_reach_the_caller() {
    common::init_test_tracing();
    let c = classifier(Arc::new(BrokenSite), None);

    let err = c
        .classify(&url("https://gone.example/"), false)
        .await
        .unwrap_err();
    assert!(matches!(err, SiteTopicError::Fetch(ref m) if m.contains("404")));
}

#[tokio::test]
async fn slow_fetch_hits_request_deadline() {
    common::init_test_tracing();
    let settings = ClassifierSettings {
        request_timeout: Duration::from_millis(50),
        ..ClassifierSettings::default()
    };
    let fetcher = Arc::new(StaticPage {
        html: STORE_PAGE.to_string(),
        delay: Duration::from_secs(5),
    });
    let c = Classifier::new(fetcher, None, settings);

    let err = c
        .classify(&url("https://slow.example/"), false)
        .await
        .unwrap_err();
    assert!(matches!(err, SiteTopicError::Timeout));
}
