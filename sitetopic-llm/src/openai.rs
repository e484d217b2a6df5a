use crate::traits::{LlmClient, LlmResponse};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sitetopic_common::{Result, SiteTopicError};
use sitetopic_http::{HttpClient, HttpError};
use std::time::Duration;

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1/";

/// Sampling knobs sent with every chat completion.
#[derive(Debug, Clone)]
pub struct OpenAiOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    pub seed: Option<i64>,
    pub timeout: Duration,
}

impl Default for OpenAiOptions {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 800,
            seed: Some(42),
            timeout: Duration::from_secs(10),
        }
    }
}

pub struct OpenAiClient {
    client: HttpClient,
    api_key: String,
    model: String,
    options: OpenAiOptions,
}

#[derive(Serialize)]
pub struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<i64>,
}

#[derive(Serialize)]
pub struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<ChatUsage>,
}

/// One element in the `choices` array
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatUsage {
    pub total_tokens: u32,
}

impl OpenAiClient {
    /// Create a new client for the given API key and model against the public endpoint.
    pub fn new(api_key: String, model: String) -> Result<Self> {
        Self::with_endpoint(api_key, model, OPENAI_API_BASE, OpenAiOptions::default())
    }

    /// Create a client for an OpenAI-compatible endpoint (gateways, proxies, test doubles).
    pub fn with_endpoint(
        api_key: String,
        model: String,
        endpoint: &str,
        options: OpenAiOptions,
    ) -> Result<Self> {
        // `Url::join` drops the last segment unless the base ends with '/'.
        let base = if endpoint.ends_with('/') {
            endpoint.to_string()
        } else {
            format!("{endpoint}/")
        };
        let client = HttpClient::new(&base)
            .map_err(|e| SiteTopicError::Config(format!("HttpClient init failed: {e}")))?
            .with_timeout(options.timeout);

        Ok(Self {
            client,
            api_key,
            model,
            options,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let req = ChatCompletionRequest {
            model: &self.model,
            messages,
            max_tokens: max_tokens.unwrap_or(self.options.max_tokens),
            temperature: temperature.unwrap_or(self.options.temperature),
            seed: self.options.seed,
        };

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "openai.chat.request");

        let resp: ChatCompletionResponse = self
            .client
            .post_json("chat/completions", Some(self.api_key.as_str()), &req)
            .await
            .map_err(http_to_sitetopic)?;

        let Some(choice) = resp.choices.into_iter().next() else {
            return Err(SiteTopicError::Llm("no choices from AI".to_string()));
        };

        let text = choice.message.content.unwrap_or_default().trim().to_string();
        if text.is_empty() {
            return Err(SiteTopicError::Llm("empty AI response".to_string()));
        }

        Ok(LlmResponse {
            text,
            model: resp.model,
            tokens_used: resp.usage.map(|u| u.total_tokens),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn http_to_sitetopic(e: HttpError) -> SiteTopicError {
    match e {
        HttpError::Timeout(_) => SiteTopicError::Timeout,
        other => SiteTopicError::Llm(other.to_string()),
    }
}
