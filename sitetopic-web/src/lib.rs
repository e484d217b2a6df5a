//! Page acquisition and topic classification.
//!
//! - Page download behind the [`fetch::PageFetcher`] seam (`fetch`)
//! - Structural and lexical noise filtering (`noise`)
//! - Visible-text extraction with `dom_query` (`extract`)
//! - Rule-based summaries and the sentence splitter they use (`heuristic`, `sentences`)
//! - Title/meta/host summaries for thin pages (`fallback`)
//! - The request pipeline tying it together, with the optional AI step (`classify`)

pub mod classify;
pub mod extract;
pub mod fallback;
pub mod fetch;
pub mod heuristic;
pub mod noise;
pub mod sentences;

pub use classify::{ClassificationResult, Classifier, ClassifierSettings, Source};
pub use fetch::{HttpPageFetcher, PageFetcher};
