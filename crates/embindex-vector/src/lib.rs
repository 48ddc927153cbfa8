//! Embedding indexing and retrieval for embindex.
//!
//! This crate computes vector embeddings for records, stores them next to
//! the records' display attributes, and retrieves the nearest records for a
//! query by cosine distance. Embedding providers and vector backends are
//! pluggable; the [`IndexManager`] drives both pipelines.
//!
//! # Features
//!
//! - `store-postgres`: Enable the PostgreSQL + pgvector store and record source
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     embindex-vector                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Embedder trait                                             │
//! │  ├── MockEmbedder (always available)                        │
//! │  ├── GeminiEmbedder / OllamaEmbedder / OpenAiEmbedder       │
//! │  └── RetryingEmbedder (backoff on transient failures)       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  VectorStore trait                                          │
//! │  ├── MemoryVectorStore (in-process, JSON snapshot)          │
//! │  └── PgVectorStore (feature: store-postgres)                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  RecordSource trait                                         │
//! │  ├── MemorySource / JsonFileSource                          │
//! │  └── PgRecordSource (feature: store-postgres)               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  IndexManager (seed + query pipelines, cancellation)        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use embindex_vector::{
//!     EmbedderId, IndexManager, IndexSpec, MemorySource, MemoryVectorStore, MockEmbedder,
//! };
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! let manager = IndexManager::builder()
//!     .embedder(Arc::new(MockEmbedder::new(384)))
//!     .store(Arc::new(MemoryVectorStore::new()))
//!     .index(IndexSpec::new("products", EmbedderId::Mock), Arc::new(MemorySource::new(records)))
//!     .build()?;
//!
//! manager.init_schema().await?;
//! let summary = manager.seed("products", &CancellationToken::new()).await?;
//! let outcome = manager
//!     .search("products", "red running shoe", Some(3), &CancellationToken::new())
//!     .await?;
//! for result in outcome.results() {
//!     println!("{}: {:.3}", result.record_id, result.distance);
//! }
//! ```

// Core modules (always available)
pub mod distance;
pub mod embedding;
pub mod manager;
pub mod providers;
pub mod retry;
pub mod source;
pub mod store;
pub mod types;

// Feature-gated backend modules
#[cfg(feature = "store-postgres")]
pub mod postgres;

// Re-exports: core types
pub use types::{
    Attributes, BulkWriteReport, EmbeddableRecord, EmbedderId, EmbeddingRecord,
    IndexDescription, IndexEntry, Neighbor, SearchOutcome, SearchResult, SeedFailure,
    SeedSummary, WriteFailure,
};

// Re-exports: embedders
pub use embedding::{Embedder, MockEmbedder};
pub use providers::{
    EmbedderConfig, GeminiEmbedder, OllamaEmbedder, OpenAiEmbedder, RetrySettings,
    build_embedder,
};
pub use retry::RetryingEmbedder;

// Re-exports: storage and sources
pub use source::{JsonFileSource, MemorySource, RecordMapping, RecordSource, record_from_json};
pub use store::{MemoryVectorStore, VectorStore};

// Re-exports: pipelines
pub use distance::{cosine_distance, cosine_similarity};
pub use manager::{
    EMPTY_SOURCE_TEXT, IndexManager, IndexManagerBuilder, IndexSpec, ManagerSettings,
    truncate_chars,
};

#[cfg(feature = "store-postgres")]
pub use postgres::{PgRecordSource, PgVectorStore};

// Re-export so callers need not depend on tokio-util directly.
pub use tokio_util::sync::CancellationToken;
