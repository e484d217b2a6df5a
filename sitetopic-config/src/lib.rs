//! Loader for sitetopic configuration with YAML + environment overlays.
//!
//! Precedence, lowest first: field defaults, YAML files/snippets in the order
//! they were attached, then `SITETOPIC__`-prefixed environment variables
//! (`SITETOPIC__AI__ENABLED=true`, `SITETOPIC__SERVER__BIND=0.0.0.0:9000`).
//! `${VAR}` placeholders are expanded after merging. The legacy `USE_AI=true`
//! switch is honoured as well.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use sitetopic_common::observability::LogFormat;
use std::path::{Path, PathBuf};
use std::time::Duration;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "SITETOPIC";
const LEGACY_USE_AI_ENV: &str = "USE_AI";
const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteTopicConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub classify: ClassifyConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Per-request budgets for the classify pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifyConfig {
    /// Outer deadline covering fetch, extraction and the AI call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl ClassifyConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            max_body_bytes: default_max_body_bytes(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Openai,
}

/// Settings for the external AI collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub provider: LlmProvider,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_auth_token")]
    pub auth_token: String,
    #[serde(default = "default_openai_endpoint")]
    pub endpoint: String,
    /// Nested deadline for the AI call; always capped by the request deadline.
    #[serde(default = "default_ai_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_seed")]
    pub seed: Option<i64>,
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn has_key(&self) -> bool {
        !self.auth_token.trim().is_empty()
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: LlmProvider::default(),
            model: default_model(),
            auth_token: default_auth_token(),
            endpoint: default_openai_endpoint(),
            timeout_secs: default_ai_timeout_secs(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            seed: default_seed(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_true")]
    pub emit_stderr: bool,
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            emit_stderr: true,
            dir: None,
            filter: default_filter(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".into()
}
fn default_request_timeout_secs() -> u64 {
    12
}
fn default_fetch_timeout_secs() -> u64 {
    10
}
fn default_max_body_bytes() -> usize {
    2 << 20
}
fn default_user_agent() -> String {
    "site-check/1.0".into()
}
fn default_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_auth_token() -> String {
    std::env::var(OPENAI_KEY_ENV).unwrap_or_default()
}
fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".into()
}
fn default_ai_timeout_secs() -> u64 {
    10
}
fn default_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> u32 {
    800
}
fn default_seed() -> Option<i64> {
    Some(42)
}
fn default_true() -> bool {
    true
}
fn default_filter() -> String {
    "info".into()
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

fn legacy_use_ai() -> bool {
    std::env::var(LEGACY_USE_AI_ENV)
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct SiteTopicConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for SiteTopicConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteTopicConfigLoader {
    /// Start empty; the environment overlay is attached by [`Self::load`] so it always wins.
    ///
    /// ```
    /// use sitetopic_config::SiteTopicConfigLoader;
    ///
    /// let config = SiteTopicConfigLoader::new()
    ///     .with_yaml_str("server:\n  bind: '127.0.0.1:9000'")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.server.bind, "127.0.0.1:9000");
    /// assert_eq!(config.classify.request_timeout_secs, 12);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Like [`Self::with_file`], but a missing file is skipped so env-only deployments work.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// ```
    /// use sitetopic_config::{LlmProvider, SiteTopicConfigLoader};
    ///
    /// let config = SiteTopicConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// ai:
    ///   enabled: true
    ///   model: "gpt-4o-mini"
    ///   auth_token: "sk-inline"
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert!(config.ai.enabled);
    /// assert_eq!(config.ai.provider, LlmProvider::Openai);
    /// assert_eq!(config.ai.model, "gpt-4o-mini");
    /// assert_eq!(config.ai.endpoint, "https://api.openai.com/v1");
    /// ```
    pub fn load(self) -> Result<SiteTopicConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let mut typed: SiteTopicConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        if legacy_use_ai() {
            typed.ai.enabled = true;
        }

        Ok(typed)
    }
}
