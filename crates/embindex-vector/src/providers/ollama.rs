//! Ollama embedding adapter.
//!
//! Talks to a local Ollama server's `/api/embed` endpoint, which accepts a
//! batch of inputs in one call.

use async_trait::async_trait;
use embindex_core::{EmbedErrorKind, Error, Result};
use serde::Deserialize;

use super::post_json;
use crate::embedding::{Embedder, ensure_text};
use crate::types::EmbedderId;

/// Embedder backed by an Ollama server.
pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimension: usize,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    /// Creates a new Ollama embedder.
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        model: impl Into<String>,
        dimension: usize,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
            dimension,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/embed", self.base_url)
    }
}

fn into_vectors(response: EmbedResponse, expected: usize) -> Result<Vec<Vec<f32>>> {
    if response.embeddings.len() != expected {
        return Err(Error::embed(
            EmbedErrorKind::Provider,
            format!(
                "Ollama returned {} embeddings for {expected} inputs",
                response.embeddings.len()
            ),
        ));
    }
    Ok(response.embeddings)
}

#[async_trait]
impl Embedder for OllamaEmbedder {
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

        let request = self.client.post(self.endpoint()).json(&serde_json::json!({
            "model": self.model,
            "input": texts,
        }));

        let response: EmbedResponse = post_json("Ollama", request).await?;
        into_vectors(response, texts.len())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn id(&self) -> EmbedderId {
        EmbedderId::Ollama
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let embedder = OllamaEmbedder::new(
            reqwest::Client::new(),
            "http://localhost:11434",
            "mxbai-embed-large",
            1024,
        );
        assert_eq!(embedder.endpoint(), "http://localhost:11434/api/embed");
        assert_eq!(embedder.model(), "mxbai-embed-large");
    }

    #[test]
    fn test_parse_batch_response() {
        let response: EmbedResponse =
            serde_json::from_str(r#"{"model": "m", "embeddings": [[0.1, 0.2], [0.3, 0.4]]}"#)
                .unwrap();
        let vectors = into_vectors(response, 2).unwrap();
        assert_eq!(vectors[1], vec![0.3, 0.4]);
    }

    #[test]
    fn test_parse_count_mismatch() {
        let response: EmbedResponse =
            serde_json::from_str(r#"{"embeddings": [[0.1, 0.2]]}"#).unwrap();
        assert!(into_vectors(response, 2).is_err());
    }

    #[tokio::test]
    async fn test_empty_batch_short_circuits() {
        let embedder = OllamaEmbedder::new(reqwest::Client::new(), "http://unused", "m", 4);
        assert!(embedder.embed_batch(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_input_rejected() {
        let embedder = OllamaEmbedder::new(reqwest::Client::new(), "http://unused", "m", 4);
        let err = embedder.embed_batch(&["ok", " "]).await.unwrap_err();
        assert_eq!(err.embed_kind(), Some(EmbedErrorKind::InvalidInput));
    }

    // Integration test (requires a running Ollama server, run manually)
    #[tokio::test]
    #[ignore]
    async fn test_ollama_integration() {
        let embedder = OllamaEmbedder::new(
            reqwest::Client::new(),
            super::super::OLLAMA_BASE_URL,
            "mxbai-embed-large",
            1024,
        );
        let vector = embedder.embed("Clube fundado em 1910").await.unwrap();
        assert_eq!(vector.len(), 1024);
    }
}
