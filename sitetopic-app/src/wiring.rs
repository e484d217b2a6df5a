use anyhow::Result;
use sitetopic_common::observability::LogConfig;
use sitetopic_config::{LlmProvider, SiteTopicConfig};
use sitetopic_llm::openai::{OpenAiClient, OpenAiOptions};
use sitetopic_llm::traits::LlmClient;
use sitetopic_web::{Classifier, ClassifierSettings, HttpPageFetcher};
use std::sync::Arc;

pub fn log_config(cfg: &SiteTopicConfig) -> LogConfig {
    LogConfig {
        app_name: "sitetopic",
        log_dir: cfg.logging.dir.clone(),
        emit_stderr: cfg.logging.emit_stderr,
        format: cfg.logging.format,
        default_filter: cfg.logging.filter.clone(),
    }
}

/// `abcd…wxyz`; keys too short to mask safely are hidden entirely.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.is_empty() {
        return String::new();
    }
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}

pub fn log_boot(cfg: &SiteTopicConfig) {
    tracing::info!(
        use_ai = cfg.ai.enabled,
        model = %cfg.ai.model,
        key_set = cfg.ai.has_key(),
        key = %mask_key(&cfg.ai.auth_token),
        bind = %cfg.server.bind,
        "boot"
    );
}

/// The AI client, when AI is switched on and a key is present.
pub fn build_llm(cfg: &SiteTopicConfig) -> Result<Option<Arc<dyn LlmClient>>> {
    if !cfg.ai.enabled {
        return Ok(None);
    }
    if !cfg.ai.has_key() {
        tracing::warn!("AI enabled but no API key configured; using heuristics only");
        return Ok(None);
    }

    let client: Arc<dyn LlmClient> = match cfg.ai.provider {
        LlmProvider::Openai => Arc::new(OpenAiClient::with_endpoint(
            cfg.ai.auth_token.clone(),
            cfg.ai.model.clone(),
            &cfg.ai.endpoint,
            OpenAiOptions {
                temperature: cfg.ai.temperature,
                max_tokens: cfg.ai.max_tokens,
                seed: cfg.ai.seed,
                timeout: cfg.ai.timeout(),
            },
        )?),
    };
    Ok(Some(client))
}

pub fn build_classifier(cfg: &SiteTopicConfig) -> Result<Classifier> {
    let fetcher = HttpPageFetcher::new(cfg.classify.max_body_bytes, cfg.classify.user_agent.clone())?;
    let settings = ClassifierSettings {
        request_timeout: cfg.classify.request_timeout(),
        fetch_timeout: cfg.classify.fetch_timeout(),
        ai_timeout: cfg.ai.timeout(),
    };
    Ok(Classifier::new(Arc::new(fetcher), build_llm(cfg)?, settings))
}
