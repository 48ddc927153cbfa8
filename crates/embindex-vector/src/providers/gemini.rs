//! Google Gemini embedding adapter.

use async_trait::async_trait;
use embindex_core::{EmbedErrorKind, Error, Result};
use serde::Deserialize;

use super::post_json;
use crate::embedding::{Embedder, ensure_text};
use crate::types::EmbedderId;

/// Embedder backed by the Gemini `embedContent` API.
pub struct GeminiEmbedder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    dimension: usize,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

impl GeminiEmbedder {
    /// Creates a new Gemini embedder.
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client
    /// * `base_url` - API root without trailing slash
    /// * `api_key` - Google AI API key
    /// * `model` - Model ID (e.g., "text-embedding-004")
    /// * `dimension` - Requested output dimensionality
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        dimension: usize,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            dimension,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:embedContent",
            self.base_url, self.model
        )
    }

    fn request_body(&self, text: &str) -> serde_json::Value {
        serde_json::json!({
            "model": format!("models/{}", self.model),
            "content": {
                "parts": [{ "text": text }]
            },
            "outputDimensionality": self.dimension,
        })
    }
}

fn into_vector(response: EmbedContentResponse) -> Result<Vec<f32>> {
    if response.embedding.values.is_empty() {
        return Err(Error::embed(
            EmbedErrorKind::Provider,
            "Gemini returned an empty embedding",
        ));
    }
    Ok(response.embedding.values)
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        ensure_text(text)?;

        let request = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(text));

        let response: EmbedContentResponse = post_json("Gemini", request).await?;
        into_vector(response)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn id(&self) -> EmbedderId {
        EmbedderId::Gemini
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn embedder() -> GeminiEmbedder {
        GeminiEmbedder::new(
            reqwest::Client::new(),
            "https://example.test",
            "key",
            "text-embedding-004",
            768,
        )
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(
            embedder().endpoint(),
            "https://example.test/v1beta/models/text-embedding-004:embedContent"
        );
    }

    #[test]
    fn test_request_body() {
        let body = embedder().request_body("camisa do clube");
        assert_eq!(body["model"], "models/text-embedding-004");
        assert_eq!(body["content"]["parts"][0]["text"], "camisa do clube");
        assert_eq!(body["outputDimensionality"], 768);
    }

    #[test]
    fn test_parse_response() {
        let response: EmbedContentResponse =
            serde_json::from_str(r#"{"embedding": {"values": [0.1, -0.2, 0.3]}}"#).unwrap();
        assert_eq!(into_vector(response).unwrap(), vec![0.1, -0.2, 0.3]);
    }

    #[test]
    fn test_parse_empty_response() {
        let response: EmbedContentResponse =
            serde_json::from_str(r#"{"embedding": {"values": []}}"#).unwrap();
        let err = into_vector(response).unwrap_err();
        assert_eq!(err.embed_kind(), Some(EmbedErrorKind::Provider));
    }

    #[tokio::test]
    async fn test_empty_text_never_sent() {
        let err = embedder().embed("").await.unwrap_err();
        assert_eq!(err.embed_kind(), Some(EmbedErrorKind::InvalidInput));
    }

    // Integration test (requires API key, run manually)
    #[tokio::test]
    #[ignore]
    #[allow(clippy::expect_used)]
    async fn test_gemini_integration() {
        let api_key =
            std::env::var("GEMINI_API_KEY").expect("GEMINI_API_KEY must be set for integration tests");
        let embedder = GeminiEmbedder::new(
            reqwest::Client::new(),
            super::super::GEMINI_BASE_URL,
            api_key,
            "text-embedding-004",
            768,
        );

        let vector = embedder.embed("a red running shoe").await.unwrap();
        assert_eq!(vector.len(), 768);
    }
}
