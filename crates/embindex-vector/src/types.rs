//! Common types for the embedding index.
//!
//! These types are shared by embedders, vector stores, record sources and
//! the index manager, and are always available regardless of feature flags.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use embindex_core::{Error, Result};

/// Display attributes carried alongside a record and returned with results.
///
/// Ordered so that serialized output is stable.
pub type Attributes = BTreeMap<String, serde_json::Value>;

// ============================================================================
// Embedder identity
// ============================================================================

/// The supported embedders.
///
/// Each variant maps to one adapter and, in a vector store, to one embedding
/// column per index. Vectors from different embedders are never compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderId {
    /// Google Gemini (`text-embedding-004`, 768 dimensions).
    Gemini,
    /// Local Ollama server.
    Ollama,
    /// OpenAI embeddings API.
    OpenAi,
    /// Deterministic in-process embedder.
    Mock,
}

impl EmbedderId {
    /// All supported embedders.
    pub const ALL: [EmbedderId; 4] = [
        EmbedderId::Gemini,
        EmbedderId::Ollama,
        EmbedderId::OpenAi,
        EmbedderId::Mock,
    ];

    /// Stable lowercase name, used in config files and column defaults.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Ollama => "ollama",
            Self::OpenAi => "openai",
            Self::Mock => "mock",
        }
    }
}

impl fmt::Display for EmbedderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmbedderId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        EmbedderId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                Error::config(format!(
                    "Unknown embedder: '{s}'. Supported: gemini, ollama, openai, mock"
                ))
            })
    }
}

// ============================================================================
// Records
// ============================================================================

/// A source entity to be indexed.
///
/// Owned by the originating store; the index manager only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddableRecord {
    /// Stable identifier assigned by the originating store.
    pub id: String,

    /// Text the embedding is derived from.
    pub text: Option<String>,

    /// Display attributes, not embedded.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
}

impl EmbeddableRecord {
    /// Create a record with the given id and text.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: Some(text.into()),
            attributes: Attributes::new(),
        }
    }

    /// Create a record that has no source text.
    pub fn without_text(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: None,
            attributes: Attributes::new(),
        }
    }

    /// Add a display attribute.
    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// The source text, if present and not blank.
    pub fn embeddable_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// A vector derived from an [`EmbeddableRecord`] by one embedder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// Weak reference to the source record.
    pub record_id: String,

    /// The embedding.
    pub vector: Vec<f32>,

    /// The embedder that produced `vector`.
    pub embedder: EmbedderId,
}

impl EmbeddingRecord {
    /// The embedding dimension.
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// One row written to a vector store: the embedding plus the display
/// attributes returned with search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// The embedding to store.
    pub embedding: EmbeddingRecord,

    /// Display attributes snapshot.
    #[serde(default)]
    pub attributes: Attributes,
}

impl IndexEntry {
    /// Create a new entry.
    pub fn new(embedding: EmbeddingRecord, attributes: Attributes) -> Self {
        Self {
            embedding,
            attributes,
        }
    }

    /// The record id this entry belongs to.
    pub fn record_id(&self) -> &str {
        &self.embedding.record_id
    }
}

// ============================================================================
// Store results
// ============================================================================

/// A row returned by a nearest-neighbour query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Record identifier.
    pub record_id: String,

    /// Cosine distance from the query vector.
    pub distance: f32,

    /// Display attributes stored with the embedding.
    #[serde(default)]
    pub attributes: Attributes,
}

/// A record that a bulk write could not persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteFailure {
    /// Record identifier.
    pub record_id: String,
    /// Store message.
    pub reason: String,
}

/// Outcome of a non-transactional bulk write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkWriteReport {
    /// Rows written.
    pub written: usize,

    /// Rows rejected by the store.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<WriteFailure>,
}

// ============================================================================
// Pipeline results
// ============================================================================

/// A ranked search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Record identifier.
    pub record_id: String,

    /// Cosine distance, lower is more similar.
    pub distance: f32,

    /// Display attributes.
    #[serde(default)]
    pub attributes: Attributes,
}

impl From<Neighbor> for SearchResult {
    fn from(n: Neighbor) -> Self {
        Self {
            record_id: n.record_id,
            distance: n.distance,
            attributes: n.attributes,
        }
    }
}

/// Outcome of a query.
///
/// An empty index is a valid answer, not an error, so it gets its own
/// variant rather than an empty vector that callers might mistake for
/// a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// At least one record matched, ordered by ascending distance.
    Matches {
        /// Ranked results.
        results: Vec<SearchResult>,
    },
    /// The index holds nothing comparable to the query.
    NoMatches {
        /// Human-readable explanation.
        message: String,
    },
}

impl SearchOutcome {
    /// Build an outcome from ranked results.
    pub fn from_results(index: &str, results: Vec<SearchResult>) -> Self {
        if results.is_empty() {
            Self::NoMatches {
                message: format!("No records in index '{index}' match this query"),
            }
        } else {
            Self::Matches { results }
        }
    }

    /// The ranked results (empty for `NoMatches`).
    pub fn results(&self) -> &[SearchResult] {
        match self {
            Self::Matches { results } => results,
            Self::NoMatches { .. } => &[],
        }
    }

    /// Whether no record matched.
    pub fn is_no_matches(&self) -> bool {
        matches!(self, Self::NoMatches { .. })
    }
}

/// A record the seed pipeline could not index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedFailure {
    /// Record identifier.
    pub record_id: String,
    /// Why the record was skipped.
    pub reason: String,
}

impl SeedFailure {
    /// Create a new failure entry.
    pub fn new(record_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            reason: reason.into(),
        }
    }
}

/// Summary of a seed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedSummary {
    /// Index that was seeded.
    pub index: String,

    /// Embedder used.
    pub embedder: EmbedderId,

    /// Source records considered.
    pub attempted: usize,

    /// Embeddings written.
    pub succeeded: usize,

    /// Records skipped, with the reason.
    #[serde(default)]
    pub failed: Vec<SeedFailure>,

    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Description of a registered index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDescription {
    /// Index name.
    pub name: String,
    /// Embedder used by the index.
    pub embedder: EmbedderId,
    /// Model served by the embedder.
    pub model: String,
    /// Embedding dimension.
    pub dimension: usize,
    /// Stored embeddings for this embedder.
    pub stored: usize,
    /// Effective default result limit.
    pub default_limit: usize,
    /// Effective text budget in characters.
    pub max_text_chars: usize,
    /// Record source name.
    pub source: String,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // ------------------------------------------------------------------------
    // EmbedderId tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_embedder_id_round_trips_names() {
        for id in EmbedderId::ALL {
            assert_eq!(id.as_str().parse::<EmbedderId>().unwrap(), id);
        }
        assert_eq!("OpenAI".parse::<EmbedderId>().unwrap(), EmbedderId::OpenAi);
    }

    #[test]
    fn test_embedder_id_unknown() {
        let err = "GeminiEmbedding".parse::<EmbedderId>().unwrap_err();
        assert!(err.to_string().contains("Unknown embedder"));
    }

    #[test]
    fn test_embedder_id_serde_lowercase() {
        let json = serde_json::to_string(&EmbedderId::OpenAi).unwrap();
        assert_eq!(json, "\"openai\"");
        let id: EmbedderId = serde_json::from_str("\"ollama\"").unwrap();
        assert_eq!(id, EmbedderId::Ollama);
    }

    // ------------------------------------------------------------------------
    // EmbeddableRecord tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_record_builder() {
        let record = EmbeddableRecord::new("p-1", "A fast laptop")
            .with_attribute("name", "Laptop")
            .with_attribute("price", 1299.5);

        assert_eq!(record.id, "p-1");
        assert_eq!(record.embeddable_text(), Some("A fast laptop"));
        assert_eq!(record.attributes["name"], "Laptop");
        assert_eq!(record.attributes["price"], 1299.5);
    }

    #[test]
    fn test_blank_text_is_not_embeddable() {
        assert!(EmbeddableRecord::new("a", "   ").embeddable_text().is_none());
        assert!(EmbeddableRecord::without_text("b").embeddable_text().is_none());
    }

    #[test]
    fn test_record_deserializes_null_text() {
        let record: EmbeddableRecord =
            serde_json::from_str(r#"{"id": "c-1", "text": null}"#).unwrap();
        assert!(record.text.is_none());
        assert!(record.attributes.is_empty());
    }

    // ------------------------------------------------------------------------
    // SearchOutcome tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_outcome_from_empty_results() {
        let outcome = SearchOutcome::from_results("clubs", vec![]);
        assert!(outcome.is_no_matches());
        assert!(outcome.results().is_empty());

        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"status\":\"no_matches\""));
        assert!(json.contains("clubs"));
    }

    #[test]
    fn test_outcome_with_results() {
        let outcome = SearchOutcome::from_results(
            "products",
            vec![SearchResult {
                record_id: "p-1".to_string(),
                distance: 0.12,
                attributes: Attributes::new(),
            }],
        );
        assert!(!outcome.is_no_matches());
        assert_eq!(outcome.results().len(), 1);

        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"status\":\"matches\""));
    }

    // ------------------------------------------------------------------------
    // Summary serialization
    // ------------------------------------------------------------------------

    #[test]
    fn test_seed_summary_serialization() {
        let summary = SeedSummary {
            index: "products".to_string(),
            embedder: EmbedderId::Gemini,
            attempted: 5,
            succeeded: 4,
            failed: vec![SeedFailure::new("3", "empty source text")],
            duration_ms: 42,
        };

        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"attempted\":5"));
        assert!(json.contains("\"succeeded\":4"));
        assert!(json.contains("empty source text"));
        assert!(json.contains("\"gemini\""));
    }

    #[test]
    fn test_bulk_report_skips_empty_failures() {
        let report = BulkWriteReport {
            written: 3,
            failed: vec![],
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(!json.contains("failed"));
    }
}
