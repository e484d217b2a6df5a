use std::time::Duration;

use async_trait::async_trait;
use sitetopic_common::{Result, SiteTopicError};
use sitetopic_http::{FetchOpts, HttpClient, HttpError};
use url::Url;

/// Downloads the markup of a single page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url`, giving up once `timeout` has elapsed.
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<String>;
}

/// [`PageFetcher`] backed by the shared [`HttpClient`].
#[derive(Clone)]
pub struct HttpPageFetcher {
    http: HttpClient,
    max_bytes: usize,
    user_agent: String,
}

impl HttpPageFetcher {
    pub fn new(max_bytes: usize, user_agent: impl Into<String>) -> Result<Self> {
        let http = HttpClient::unanchored()
            .map_err(|e| SiteTopicError::Fetch(e.to_string()))?;
        Ok(Self {
            http,
            max_bytes,
            user_agent: user_agent.into(),
        })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<String> {
        let opts = FetchOpts {
            timeout: Some(timeout),
            max_bytes: self.max_bytes,
            user_agent: &self.user_agent,
        };
        self.http.fetch_text(url, opts).await.map_err(|e| match e {
            HttpError::Timeout(_) => SiteTopicError::Timeout,
            HttpError::Api { message, .. } => SiteTopicError::Fetch(message),
            other => SiteTopicError::Fetch(other.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_custom_agent() {
        let fetcher = HttpPageFetcher::new(1024, "site-audit/2.0").unwrap();
        assert_eq!(fetcher.max_bytes, 1024);
        assert_eq!(fetcher.user_agent, "site-audit/2.0");
    }
}
