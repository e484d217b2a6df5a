//! Minimal HTTP client with safe logging, bounded page downloads and bearer auth.
//!
//! - JSON POSTs (`post_json`) against a base URL, used by the AI client
//! - Page fetches (`fetch_text`) with a byte cap, a status check and a custom user agent
//! - Never logs secret values
//! - One attempt per call; failures go straight back to the caller
//! - Optional *raw* request/response logging via `SITETOPIC_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), sitetopic_http::HttpError> {
//! let client = sitetopic_http::HttpClient::unanchored()?;
//! let url = reqwest::Url::parse("https://example.com/").unwrap();
//! let html = client
//!     .fetch_text(&url, sitetopic_http::FetchOpts::default())
//!     .await?;
//! # let _ = html;
//! # Ok(()) }
//! ```
//!
//! Security: bearer tokens are sanitized before use, and logs only ever
//! include the auth kind (bearer/none), not the secret.
//!
//! Observability: structured `tracing` events are emitted for request start,
//! headers, body snippets (truncated), final errors, and (optionally)
//! raw request/response lines (target `http.raw`) when `SITETOPIC_HTTP_RAW=1`.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

// ==============================
// Raw logging toggles
// ==============================

const RAW_ENV: &str = "SITETOPIC_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024; // cap raw body logs (64 KiB)

/// Default cap for downloaded pages (2 MiB).
pub const DEFAULT_MAX_PAGE_BYTES: usize = 2 << 20;
pub const DEFAULT_USER_AGENT: &str = "site-check/1.0";

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

/// Render a best-effort curl command for repro/debug, with secrets redacted.
fn make_curl(method: &Method, url: &Url, headers: &HeaderMap, body: Option<&[u8]>) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{}", method)];
    for (name, val) in headers.iter() {
        let mut v = val.to_str().unwrap_or("").to_string();
        if name.as_str().eq_ignore_ascii_case("authorization") {
            v = "Bearer <redacted>".into();
        }
        parts.push(format!(
            "-H '{}: {}'",
            name.as_str(),
            v.replace('\'', r"'\''")
        ));
    }
    if let Some(bytes) = body {
        if let Ok(s) = std::str::from_utf8(bytes) {
            let mut s = s.to_string();
            if s.len() > RAW_MAX_BODY {
                s.truncate(floor_char_boundary(&s, RAW_MAX_BODY));
                s.push('…');
            }
            parts.push(format!("-d '{}'", s.replace('\'', r"'\''")));
        } else {
            parts.push(format!("--data-binary @- # ({} bytes)", bytes.len()));
        }
    }
    parts.push(format!("'{}'", url.as_str()));
    parts.join(" ")
}

/// Redact sensitive headers for logging
fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let mut val = v.to_str().unwrap_or("").to_string();
            if key.eq_ignore_ascii_case("authorization") {
                val = "Bearer <redacted>".into();
            }
            (key, val)
        })
        .collect()
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("response body exceeds {limit} bytes")]
    TooLarge { limit: usize },
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

// ==============================
// Fetch options
// ==============================

/// Knobs for [`HttpClient::fetch_text`].
///
/// ```
/// use sitetopic_http::{FetchOpts, DEFAULT_MAX_PAGE_BYTES};
///
/// let opts = FetchOpts::default();
/// assert_eq!(opts.max_bytes, DEFAULT_MAX_PAGE_BYTES);
/// assert!(opts.timeout.is_none());
/// ```
#[derive(Clone, Debug)]
pub struct FetchOpts<'a> {
    /// Overall deadline for headers + body. Falls back to the client default.
    pub timeout: Option<Duration>,
    /// The download aborts with [`HttpError::TooLarge`] past this many bytes.
    pub max_bytes: usize,
    pub user_agent: &'a str,
}

impl Default for FetchOpts<'_> {
    fn default() -> Self {
        Self {
            timeout: None,
            max_bytes: DEFAULT_MAX_PAGE_BYTES,
            user_agent: DEFAULT_USER_AGENT,
        }
    }
}

// ==============================
// Client
// ==============================

#[derive(Clone)]
pub struct HttpClient {
    base: Option<Url>,
    inner: Client,
    pub default_timeout: Duration,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// ```no_run
    /// use sitetopic_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.example.com")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(15));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let mut client = Self::unanchored()?;
        client.base = Some(base);
        Ok(client)
    }

    /// Construct a client without a base URL; only absolute URLs can be used.
    pub fn unanchored() -> Result<Self, HttpError> {
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base: None,
            inner,
            default_timeout: Duration::from_secs(15),
        })
    }

    /// Override the default timeout returned by [`HttpClient::new`].
    ///
    /// ```no_run
    /// use sitetopic_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.example.com")?
    ///     .with_timeout(Duration::from_secs(2));
    /// assert_eq!(client.default_timeout, Duration::from_secs(2));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    /// POST a JSON body to `path` (relative to the base URL) and decode the
    /// JSON reply. A bearer token, when given, is sanitised before use.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        bearer: Option<&str>,
        body: &B,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.resolve(path)?;
        let bearer = bearer.map(sanitize_api_key).transpose()?;
        let payload = serde_json::to_vec(body)
            .map_err(|e| HttpError::Build(format!("body encode failed: {e}")))?;
        self.send_json(&url, bearer.as_deref(), payload).await
    }

    // ==============================
    // Page download
    // ==============================

    /// GET an absolute URL and return its body as (lossily decoded) text.
    ///
    /// Never retries. Fails on transport errors, on a status outside 200–299,
    /// when the body grows past `opts.max_bytes`, or when the deadline elapses.
    pub async fn fetch_text(&self, url: &Url, opts: FetchOpts<'_>) -> Result<String, HttpError> {
        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        let req_id = new_request_id();

        tracing::debug!(
            req_id=%req_id,
            host_path=%format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
            timeout_ms=timeout.as_millis() as u64,
            max_bytes=opts.max_bytes,
            "http.fetch.start"
        );

        let t0 = std::time::Instant::now();
        let mut resp = self
            .inner
            .get(url.clone())
            .timeout(timeout)
            .header(USER_AGENT, opts.user_agent)
            .send()
            .await
            .map_err(|e| transport_error(e, timeout))?;

        let status = resp.status();
        if !status.is_success() {
            let request_id = header_request_id(resp.headers());
            tracing::warn!(req_id=%req_id, %status, x_request_id=%request_id, "http.fetch.status");
            return Err(HttpError::Api {
                status,
                message: format!("non-2xx status: {status}"),
                request_id,
            });
        }

        if let Some(declared) = resp.content_length() {
            if declared as usize > opts.max_bytes {
                tracing::warn!(req_id=%req_id, declared, limit=opts.max_bytes, "http.fetch.too_large");
                return Err(HttpError::TooLarge {
                    limit: opts.max_bytes,
                });
            }
        }

        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| transport_error(e, timeout))?
        {
            if body.len() + chunk.len() > opts.max_bytes {
                tracing::warn!(req_id=%req_id, limit=opts.max_bytes, "http.fetch.too_large");
                return Err(HttpError::TooLarge {
                    limit: opts.max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!(
            req_id=%req_id,
            %status,
            duration_ms=t0.elapsed().as_millis() as u64,
            body_len=body.len(),
            "http.fetch.done"
        );

        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    // ==============================
    // Core request implementation
    // ==============================

    fn resolve(&self, path: &str) -> Result<Url, HttpError> {
        match &self.base {
            Some(base) => base.join(path).map_err(|e| HttpError::Url(e.to_string())),
            None => Url::parse(path).map_err(|e| HttpError::Url(e.to_string())),
        }
    }

    /// One JSON call, single attempt. Transport errors, non-2xx replies and
    /// undecodable bodies are all returned to the caller.
    async fn send_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        bearer: Option<&str>,
        payload: Vec<u8>,
    ) -> Result<T, HttpError> {
        let timeout = self.default_timeout;
        let req_id = new_request_id();
        let headers = json_headers(bearer)?;

        tracing::debug!(
            req_id=%req_id,
            host_path=%format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
            timeout_ms=timeout.as_millis() as u64,
            auth_kind=if bearer.is_some() { "bearer" } else { "none" },
            "http.request.start"
        );
        if raw_enabled() {
            let curl = make_curl(&Method::POST, url, &headers, Some(payload.as_slice()));
            tracing::debug!(target: "http.raw", %req_id, %curl, "request");
        }

        let rb = self
            .inner
            .post(url.clone())
            .timeout(timeout)
            .headers(headers)
            .body(payload);

        let t0 = std::time::Instant::now();
        let (status, headers, bytes) = read_response(rb).await.map_err(|err| {
            tracing::warn!(req_id=%req_id, message=%err, "http.network_error");
            transport_error(err, timeout)
        })?;

        let request_id = header_request_id(&headers);
        let snippet = snip_body(&bytes);
        tracing::debug!(
            req_id=%req_id,
            %status,
            duration_ms=t0.elapsed().as_millis() as u64,
            body_len=bytes.len(),
            x_request_id=%request_id,
            "http.response"
        );
        if raw_enabled() {
            let end = bytes.len().min(RAW_MAX_BODY);
            tracing::info!(
                target: "http.raw",
                %req_id,
                %status,
                headers=?redact_headers(&headers),
                body=%String::from_utf8_lossy(&bytes[..end]),
                truncated=bytes.len() > RAW_MAX_BODY
            );
        }

        if !status.is_success() {
            let message = extract_error_message(&bytes);
            tracing::warn!(req_id=%req_id, %status, message=%message, x_request_id=%request_id, body_snippet=%snippet, "http.error");
            return Err(HttpError::Api {
                status,
                message,
                request_id,
            });
        }

        serde_json::from_slice::<T>(&bytes).map_err(|e| {
            tracing::warn!(req_id=%req_id, serde_err=%e, body_snippet=%snippet, "http.response.decode_error");
            HttpError::Decode(e.to_string(), snippet)
        })
    }
}

/// Request headers for a JSON POST; the bearer lands in `Authorization`.
fn json_headers(bearer: Option<&str>) -> Result<HeaderMap, HttpError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(token) = bearer {
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}

async fn read_response(
    rb: reqwest::RequestBuilder,
) -> Result<(StatusCode, HeaderMap, Vec<u8>), reqwest::Error> {
    let resp = rb.send().await?;
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = resp.bytes().await?;
    Ok((status, headers, bytes.to_vec()))
}

// ==============================
// Helpers
// ==============================

fn new_request_id() -> String {
    format!("r{}", uuid::Uuid::new_v4().simple())
}

fn transport_error(err: reqwest::Error, timeout: Duration) -> HttpError {
    if err.is_timeout() {
        HttpError::Timeout(timeout)
    } else {
        HttpError::Network(err.to_string())
    }
}

fn header_request_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .or_else(|| headers.get("x-correlation-id"))
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string()
}

fn extract_error_message(body: &[u8]) -> String {
    // OpenAI style: {"error":{"message":"..."}}
    #[derive(Deserialize)]
    struct OpenAiEnv {
        error: OpenAiDetail,
    }
    #[derive(Deserialize)]
    struct OpenAiDetail {
        message: String,
    }

    // Generic: {"message":"..."} or {"detail":"..."} or {"error":"..."}
    #[derive(Deserialize)]
    struct Msg {
        #[serde(default)]
        message: String,
        #[serde(default)]
        detail: String,
        #[serde(default)]
        error: String,
    }

    if let Ok(env) = serde_json::from_slice::<OpenAiEnv>(body) {
        return env.error.message;
    }
    if let Ok(m) = serde_json::from_slice::<Msg>(body) {
        for candidate in [m.message, m.detail, m.error] {
            if !candidate.is_empty() {
                return candidate;
            }
        }
    }
    snip_body(body)
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > 500 {
        snip.truncate(floor_char_boundary(&snip, 500));
        snip.push_str("...");
    }
    snip
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    if idx >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn sanitize_api_key(raw: &str) -> Result<String, HttpError> {
    // 1) Trim outer spaces/quotes
    let mut s = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();

    // 2) Remove *all* ASCII whitespace (spaces, tabs, newlines, carriage returns)
    s.retain(|ch| !ch.is_ascii_whitespace());

    // 3) Ensure ASCII and no control chars
    if !s.is_ascii() {
        return Err(HttpError::Build("API key contains non-ASCII bytes".into()));
    }
    if s.bytes().any(|b| b < 0x20 || b == 0x7F) {
        return Err(HttpError::Build(
            "API key contains control characters".into(),
        ));
    }

    // 4) Validate header value upfront for clear errors
    HeaderValue::from_str(&format!("Bearer {}", s))
        .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
    Ok(s)
}
