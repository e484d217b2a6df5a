//! LLM integration for sitetopic.
//!
//! This crate exposes a small [`traits::LlmClient`] interface, an OpenAI chat
//! completions implementation, and [`summarize::summarize_site`], which turns
//! visible page text into a topic summary plus advertising keyword lists.
//!
//! # Examples
//! ```no_run
//! use sitetopic_llm::openai::OpenAiClient;
//! use sitetopic_llm::summarize::summarize_site;
//!
//! # async fn demo() -> sitetopic_common::Result<()> {
//! let client = OpenAiClient::new("sk-...".into(), sitetopic_llm::DEFAULT_OPENAI_MODEL.into())?;
//! let summary = summarize_site(&client, "Доставка пиццы и роллов по Казани.").await?;
//! assert!(!summary.summary.is_empty());
//! # Ok(())
//! # }
//! ```
pub mod openai;
pub mod summarize;
pub mod traits;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
