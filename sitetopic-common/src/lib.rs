//! Common types and utilities shared across sitetopic crates.
//!
//! This crate defines the shared error type and observability helpers used
//! throughout the sitetopic workspace. It is intentionally lightweight so that
//! every crate can depend on it without pulling in heavy transitive costs.
//!
//! # Overview
//!
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`SiteTopicError`] and [`Result`]: Shared error handling
//! - [`OUTPUT_LANG`]: the fixed locale every summary is produced in
//!
//! # Examples
//!
//! ```rust
//! use sitetopic_common::SiteTopicError;
//!
//! let err = SiteTopicError::Fetch("non-2xx status: 404 Not Found".into());
//! assert_eq!(err.to_string(), "Fetch error: non-2xx status: 404 Not Found");
//! ```

pub mod observability;

/// Language tag attached to every classification result.
pub const OUTPUT_LANG: &str = "ru";

/// Error types used across the sitetopic system.
#[derive(thiserror::Error, Debug)]
pub enum SiteTopicError {
    /// Downloading the page failed (transport, status, size cap).
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// The AI collaborator failed or returned nothing usable.
    #[error("LLM error: {0}")]
    Llm(String),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The caller supplied a URL we cannot classify.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Operation exceeded its deadline.
    #[error("Timeout occurred")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Convenient alias for results that use [`SiteTopicError`].
pub type Result<T> = std::result::Result<T, SiteTopicError>;
