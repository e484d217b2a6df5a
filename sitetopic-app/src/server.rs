//! HTTP surface: `POST /classify` and `GET /healthz`.

use std::sync::Arc;

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use sitetopic_common::SiteTopicError;
use sitetopic_runtime::SiteTopicHandle;
use sitetopic_web::Classifier;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use url::Url;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<Classifier>,
    pub use_ai: bool,
}

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    #[serde(default)]
    pub url: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/classify", post(classify).fallback(use_post))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(bind: &str, state: AppState, handle: SiteTopicHandle) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    tracing::info!(bind, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(handle.shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

/// Validate a caller-supplied URL: it must parse as absolute and name a host.
pub fn parse_target_url(raw: &str) -> Result<Url, SiteTopicError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(SiteTopicError::InvalidUrl("url is required".into()));
    }
    match Url::parse(raw) {
        Ok(url) if url.host_str().is_some_and(|h| !h.is_empty()) => Ok(url),
        _ => Err(SiteTopicError::InvalidUrl("invalid url".into())),
    }
}

// The body is decoded whatever Content-Type the caller sent.
async fn classify(State(state): State<AppState>, body: Bytes) -> Response {
    let Ok(req) = serde_json::from_slice::<ClassifyRequest>(&body) else {
        return (StatusCode::BAD_REQUEST, "bad JSON").into_response();
    };
    let url = match parse_target_url(&req.url) {
        Ok(url) => url,
        Err(SiteTopicError::InvalidUrl(msg)) => {
            return (StatusCode::BAD_REQUEST, msg).into_response();
        }
        Err(other) => return (StatusCode::BAD_REQUEST, other.to_string()).into_response(),
    };

    let req_id = Uuid::new_v4();
    let span = tracing::info_span!("classify", %req_id, host = url.host_str().unwrap_or("-"));

    match state
        .classifier
        .classify(&url, state.use_ai)
        .instrument(span)
        .await
    {
        Ok(result) => Json(result).into_response(),
        Err(e) => {
            tracing::warn!(%req_id, error = %e, "classify.fetch_failed");
            (
                StatusCode::BAD_GATEWAY,
                format!("fetch failed: {}", fetch_failure_reason(&e)),
            )
                .into_response()
        }
    }
}

fn fetch_failure_reason(err: &SiteTopicError) -> String {
    match err {
        SiteTopicError::Fetch(reason) => reason.clone(),
        SiteTopicError::Timeout => "timeout".to_string(),
        other => other.to_string(),
    }
}

async fn healthz() -> &'static str {
    "ok"
}

async fn use_post() -> (StatusCode, &'static str) {
    (StatusCode::METHOD_NOT_ALLOWED, "use POST")
}
