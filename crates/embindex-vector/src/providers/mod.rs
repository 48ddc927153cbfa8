//! HTTP embedding provider adapters.
//!
//! Each adapter is built from a typed [`EmbedderConfig`] at startup; nothing
//! is looked up by string at call time. [`build_embedder`] wraps the adapter
//! in a [`RetryingEmbedder`] when retries are enabled.
//!
//! | Embedder | Endpoint | Auth |
//! |----------|----------|------|
//! | Gemini | `POST {base}/v1beta/models/{model}:embedContent` | `x-goog-api-key` |
//! | Ollama | `POST {base}/api/embed` | none |
//! | OpenAI | `POST {base}/v1/embeddings` | bearer token |

mod gemini;
mod ollama;
mod openai;

pub use gemini::GeminiEmbedder;
pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;

use std::sync::Arc;
use std::time::Duration;

use embindex_core::{EmbedErrorKind, Error, Result};
use serde::{Deserialize, Serialize};

use crate::embedding::{Embedder, MockEmbedder};
use crate::retry::RetryingEmbedder;
use crate::types::EmbedderId;

/// Default Gemini endpoint.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
/// Default Ollama endpoint.
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";
/// Default OpenAI endpoint.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Retry settings applied to transient failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Retries after the first attempt (0 disables retrying).
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub initial_delay_ms: u64,
    /// Upper bound on any delay, in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 500,
            max_delay_ms: 10_000,
        }
    }
}

/// Fully resolved settings for one embedder adapter.
///
/// Credentials are already resolved here; reading them from the environment
/// is the configuration layer's job.
#[derive(Debug, Clone)]
pub struct EmbedderConfig {
    /// Which adapter to build.
    pub id: EmbedderId,
    /// Model name sent to the provider.
    pub model: String,
    /// Declared output dimension.
    pub dimension: usize,
    /// Endpoint override; `None` uses the provider default.
    pub base_url: Option<String>,
    /// API key, required for Gemini and OpenAI.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retry policy for transient failures.
    pub retry: RetrySettings,
}

impl EmbedderConfig {
    /// Create a config with provider defaults for everything but the model
    /// and dimension.
    pub fn new(id: EmbedderId, model: impl Into<String>, dimension: usize) -> Self {
        Self {
            id,
            model: model.into(),
            dimension,
            base_url: None,
            api_key: None,
            timeout: Duration::from_secs(30),
            retry: RetrySettings::default(),
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the endpoint.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetrySettings) -> Self {
        self.retry = retry;
        self
    }

    fn require_api_key(&self) -> Result<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::config(format!("embedder '{}' requires an API key", self.id)))
    }

    fn base_url_or(&self, default: &str) -> String {
        self.base_url
            .as_deref()
            .unwrap_or(default)
            .trim_end_matches('/')
            .to_string()
    }

    fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))
    }
}

/// Build the adapter described by `config`.
///
/// Fails fast on missing credentials or a zero dimension.
pub fn build_embedder(config: &EmbedderConfig) -> Result<Arc<dyn Embedder>> {
    if config.dimension == 0 {
        return Err(Error::config(format!(
            "embedder '{}' must declare a non-zero dimension",
            config.id
        )));
    }

    let embedder: Arc<dyn Embedder> = match config.id {
        EmbedderId::Gemini => Arc::new(GeminiEmbedder::new(
            config.http_client()?,
            config.base_url_or(GEMINI_BASE_URL),
            config.require_api_key()?,
            config.model.clone(),
            config.dimension,
        )),
        EmbedderId::Ollama => Arc::new(OllamaEmbedder::new(
            config.http_client()?,
            config.base_url_or(OLLAMA_BASE_URL),
            config.model.clone(),
            config.dimension,
        )),
        EmbedderId::OpenAi => Arc::new(OpenAiEmbedder::new(
            config.http_client()?,
            config.base_url_or(OPENAI_BASE_URL),
            config.require_api_key()?,
            config.model.clone(),
            config.dimension,
        )),
        EmbedderId::Mock => Arc::new(MockEmbedder::new(config.dimension)),
    };

    if config.retry.max_retries == 0 || config.id == EmbedderId::Mock {
        return Ok(embedder);
    }

    Ok(Arc::new(
        RetryingEmbedder::new(embedder)
            .with_max_retries(config.retry.max_retries)
            .with_initial_delay(Duration::from_millis(config.retry.initial_delay_ms))
            .with_max_delay(Duration::from_millis(config.retry.max_delay_ms)),
    ))
}

// ============================================================================
// Shared HTTP helpers
// ============================================================================

/// Map an HTTP status to an embedder failure kind.
pub(crate) fn classify_status(status: reqwest::StatusCode) -> EmbedErrorKind {
    match status.as_u16() {
        401 | 403 => EmbedErrorKind::Auth,
        429 => EmbedErrorKind::RateLimited,
        400 | 413 | 422 => EmbedErrorKind::InvalidInput,
        408 | 502 | 503 | 504 => EmbedErrorKind::Transient,
        _ => EmbedErrorKind::Provider,
    }
}

/// Map a transport failure; connection and timeout problems are transient.
pub(crate) fn transport_error(provider: &str, e: reqwest::Error) -> Error {
    let kind = if e.is_timeout() || e.is_connect() {
        EmbedErrorKind::Transient
    } else {
        EmbedErrorKind::Provider
    };
    Error::embed(kind, format!("Failed to call {provider} API: {e}"))
}

/// Send a JSON request and decode a JSON response, classifying failures.
pub(crate) async fn post_json<T: serde::de::DeserializeOwned>(
    provider: &str,
    request: reqwest::RequestBuilder,
) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| transport_error(provider, e))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(Error::embed(
            classify_status(status),
            format!("{provider} API error {status}: {error_text}"),
        ));
    }

    response.json::<T>().await.map_err(|e| {
        Error::embed(
            EmbedErrorKind::Provider,
            format!("Failed to parse {provider} response: {e}"),
        )
    })
}
