//! OpenAI embedding adapter.

use async_trait::async_trait;
use embindex_core::{EmbedErrorKind, Error, Result};
use serde::Deserialize;

use super::post_json;
use crate::embedding::{Embedder, ensure_text};
use crate::types::EmbedderId;

/// Embedder backed by the OpenAI `/v1/embeddings` API.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    dimension: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    /// Creates a new OpenAI embedder.
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

    fn request_body(&self, texts: &[&str]) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });
        // Only the v3 family accepts a dimensions override.
        if self.model.starts_with("text-embedding-3") {
            body["dimensions"] = serde_json::json!(self.dimension);
        }
        body
    }
}

/// Responses are not guaranteed to be in input order; sort by `index`.
fn into_vectors(response: EmbeddingResponse, expected: usize) -> Result<Vec<Vec<f32>>> {
    let mut data = response.data;
    if data.len() != expected {
        return Err(Error::embed(
            EmbedErrorKind::Provider,
            format!("OpenAI returned {} embeddings for {expected} inputs", data.len()),
        ));
    }
    data.sort_by_key(|d| d.index);
    Ok(data.into_iter().map(|d| d.embedding).collect())
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::embed(EmbedErrorKind::Provider, "No embedding returned"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        for text in texts {
            ensure_text(text)?;
        }

        let request = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request_body(texts));

        let response: EmbeddingResponse = post_json("OpenAI", request).await?;
        into_vectors(response, texts.len())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn id(&self) -> EmbedderId {
        EmbedderId::OpenAi
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn embedder(model: &str) -> OpenAiEmbedder {
        OpenAiEmbedder::new(reqwest::Client::new(), "https://example.test", "sk", model, 512)
    }

    #[test]
    fn test_request_body_v3_sends_dimensions() {
        let body = embedder("text-embedding-3-small").request_body(&["a", "b"]);
        assert_eq!(body["input"][1], "b");
        assert_eq!(body["dimensions"], 512);
    }

    #[test]
    fn test_request_body_legacy_model() {
        let body = embedder("text-embedding-ada-002").request_body(&["a"]);
        assert!(body.get("dimensions").is_none());
    }

    #[test]
    fn test_parse_restores_input_order() {
        let response: EmbeddingResponse = serde_json::from_str(
            r#"{"data": [
                {"index": 1, "embedding": [0.2]},
                {"index": 0, "embedding": [0.1]}
            ]}"#,
        )
        .unwrap();
        let vectors = into_vectors(response, 2).unwrap();
        assert_eq!(vectors, vec![vec![0.1], vec![0.2]]);
    }

    #[test]
    fn test_parse_count_mismatch() {
        let response: EmbeddingResponse = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert!(into_vectors(response, 1).is_err());
    }

    // Integration test (requires API key, run manually)
    #[tokio::test]
    #[ignore]
    #[allow(clippy::expect_used)]
    async fn test_openai_integration() {
        let api_key =
            std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY must be set for integration tests");
        let embedder = OpenAiEmbedder::new(
            reqwest::Client::new(),
            super::super::OPENAI_BASE_URL,
            api_key,
            "text-embedding-3-small",
            1536,
        );
        let vector = embedder.embed("wireless headphones").await.unwrap();
        assert_eq!(vector.len(), 1536);
    }
}
