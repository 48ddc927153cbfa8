//! Embedder trait and mock implementation.
//!
//! This module defines the `Embedder` trait that abstracts over the
//! embedding providers (Gemini, Ollama, OpenAI).
//!
//! # Providers
//!
//! - `MockEmbedder`: Deterministic fixed-dimension vectors for testing
//! - `GeminiEmbedder`, `OllamaEmbedder`, `OpenAiEmbedder`: HTTP adapters in
//!   [`crate::providers`]

use async_trait::async_trait;
use embindex_core::{EmbedErrorKind, Error, Result};

use crate::types::EmbedderId;

/// Trait for generating text embeddings.
///
/// Implementations wrap a specific provider API and return vectors of a
/// fixed dimension for a given (provider, model) pair. The trait requires
/// `Send + Sync` so one instance can serve concurrent seed tasks.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single, non-empty text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for a batch of texts.
    ///
    /// Default implementation calls `embed` for each text sequentially.
    /// Backends that support native batching should override this.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// The embedding dimension.
    fn dimension(&self) -> usize;

    /// Which embedder this is.
    fn id(&self) -> EmbedderId;

    /// The model name for diagnostics.
    fn model(&self) -> &str;
}

/// Reject empty input before it reaches a provider.
pub(crate) fn ensure_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(Error::embed(
            EmbedErrorKind::InvalidInput,
            "cannot embed empty text",
        ));
    }
    Ok(())
}

/// A mock embedder for testing.
///
/// Generates deterministic vectors based on the input text bytes,
/// producing identical embeddings for identical input.
pub struct MockEmbedder {
    dimension: usize,
}

impl MockEmbedder {
    /// Create a new mock embedder with the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    /// Generate a deterministic unit vector from text.
    fn deterministic_embedding(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimension];
        let bytes = text.as_bytes();

        for (i, val) in embedding.iter_mut().enumerate() {
            let byte_val = bytes.get(i % bytes.len().max(1)).copied().unwrap_or(0);
            *val = ((byte_val as f32 + i as f32) % 256.0) / 256.0;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in &mut embedding {
                *val /= norm;
            }
        }

        embedding
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        ensure_text(text)?;
        Ok(self.deterministic_embedding(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn id(&self) -> EmbedderId {
        EmbedderId::Mock
    }

    fn model(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Tests
// ============================================================================
