//! Vector store trait and in-memory implementation.
//!
//! A store holds one table per index. Each row is keyed by record id and
//! carries the record's display attributes plus one embedding column per
//! embedder. Vectors are only ever compared within a single column.
//!
//! - [`MemoryVectorStore`]: insertion-ordered, in-process, with an optional
//!   JSON snapshot file
//! - `PgVectorStore`: PostgreSQL + pgvector (feature: `store-postgres`)

use async_trait::async_trait;
use embindex_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tokio::sync::RwLock;

use crate::distance::{cosine_distance, validate_vector};
use crate::types::{Attributes, BulkWriteReport, EmbedderId, IndexEntry, Neighbor, WriteFailure};

/// Persistent storage for embeddings with ordered nearest-neighbour lookup.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Backend name for diagnostics.
    fn name(&self) -> &str;

    /// Create the index table and the embedder's column if missing.
    ///
    /// Fails with a validation error when the column already exists with a
    /// different dimension.
    async fn ensure_index(&self, index: &str, embedder: EmbedderId, dimension: usize)
    -> Result<()>;

    /// Declared dimension of the embedder's column, or `None` when the
    /// index or column does not exist.
    async fn dimension(&self, index: &str, embedder: EmbedderId) -> Result<Option<usize>>;

    /// Number of rows holding a vector for `embedder`.
    async fn count(&self, index: &str, embedder: EmbedderId) -> Result<usize>;

    /// Insert or replace one embedding, keyed by `(record_id, embedder)`.
    async fn upsert(&self, index: &str, entry: &IndexEntry) -> Result<()>;

    /// Write a batch of embeddings.
    ///
    /// Not transactional: rows the store rejects are reported in the
    /// returned [`BulkWriteReport`], the rest are persisted. Losing the
    /// backend mid-batch is an `Err`.
    async fn bulk_upsert(&self, index: &str, entries: &[IndexEntry]) -> Result<BulkWriteReport>;

    /// The `limit` rows nearest to `query` in the embedder's column,
    /// ascending by cosine distance, ties broken by insertion order.
    async fn nearest(
        &self,
        index: &str,
        query: &[f32],
        embedder: EmbedderId,
        limit: usize,
    ) -> Result<Vec<Neighbor>>;
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MemoryRow {
    record_id: String,
    #[serde(default)]
    attributes: Attributes,
    #[serde(default)]
    vectors: BTreeMap<EmbedderId, Vec<f32>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MemoryIndex {
    /// Declared dimension per embedder column.
    columns: BTreeMap<EmbedderId, usize>,
    /// Rows in first-insertion order.
    rows: Vec<MemoryRow>,
    #[serde(skip)]
    positions: HashMap<String, usize>,
}

impl MemoryIndex {
    fn reindex(&mut self) {
        self.positions = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| (row.record_id.clone(), i))
            .collect();
    }

    fn write(&mut self, entry: &IndexEntry) -> Result<()> {
        let embedder = entry.embedding.embedder;
        let expected = self.columns.get(&embedder).copied().ok_or_else(|| {
            Error::store(format!("no embedding column for embedder '{embedder}'"))
        })?;
        validate_vector(&entry.embedding.vector, expected)
            .map_err(|e| Error::store(e.to_string()))?;

        let record_id = entry.record_id();
        match self.positions.get(record_id) {
            Some(&pos) => {
                let row = &mut self.rows[pos];
                row.attributes = entry.attributes.clone();
                row.vectors
                    .insert(embedder, entry.embedding.vector.clone());
            }
            None => {
                let mut vectors = BTreeMap::new();
                vectors.insert(embedder, entry.embedding.vector.clone());
                self.positions
                    .insert(record_id.to_string(), self.rows.len());
                self.rows.push(MemoryRow {
                    record_id: record_id.to_string(),
                    attributes: entry.attributes.clone(),
                    vectors,
                });
            }
        }
        Ok(())
    }
}

/// An in-memory vector store.
///
/// Performs exact cosine search over every row, which is fine for demos,
/// tests and small catalogues. State can be saved to and restored from a
/// JSON snapshot so the CLI can persist across runs without a database.
#[derive(Default)]
pub struct MemoryVectorStore {
    indexes: RwLock<HashMap<String, MemoryIndex>>,
}

impl MemoryVectorStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an index column up front (builder style, for tests).
    pub fn with_index(mut self, index: &str, embedder: EmbedderId, dimension: usize) -> Self {
        self.indexes
            .get_mut()
            .entry(index.to_string())
            .or_default()
            .columns
            .insert(embedder, dimension);
        self
    }

    /// Load a store from a JSON snapshot.
    ///
    /// A missing file yields an empty store.
    pub fn load_snapshot(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No snapshot at {}, starting empty", path.display());
            return Ok(Self::new());
        }

        let json = std::fs::read_to_string(path)?;
        let mut indexes: HashMap<String, MemoryIndex> = serde_json::from_str(&json)?;
        for index in indexes.values_mut() {
            index.reindex();
        }

        log::debug!(
            "Loaded snapshot {} with {} indexes",
            path.display(),
            indexes.len()
        );
        Ok(Self {
            indexes: RwLock::new(indexes),
        })
    }

    /// Write the current state to a JSON snapshot.
    pub async fn save_snapshot(&self, path: &Path) -> Result<()> {
        let json = {
            let indexes = self.indexes.read().await;
            serde_json::to_string_pretty(&*indexes)?
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn ensure_index(
        &self,
        index: &str,
        embedder: EmbedderId,
        dimension: usize,
    ) -> Result<()> {
        let mut indexes = self.indexes.write().await;
        let table = indexes.entry(index.to_string()).or_default();
        match table.columns.get(&embedder) {
            Some(&existing) if existing != dimension => Err(Error::validation(format!(
                "index '{index}' stores {existing}-dimensional vectors for '{embedder}', \
                 but {dimension} were declared"
            ))),
            Some(_) => Ok(()),
            None => {
                table.columns.insert(embedder, dimension);
                Ok(())
            }
        }
    }

    async fn dimension(&self, index: &str, embedder: EmbedderId) -> Result<Option<usize>> {
        let indexes = self.indexes.read().await;
        Ok(indexes
            .get(index)
            .and_then(|t| t.columns.get(&embedder).copied()))
    }

    async fn count(&self, index: &str, embedder: EmbedderId) -> Result<usize> {
        let indexes = self.indexes.read().await;
        Ok(indexes.get(index).map_or(0, |t| {
            t.rows
                .iter()
                .filter(|r| r.vectors.contains_key(&embedder))
                .count()
        }))
    }

    async fn upsert(&self, index: &str, entry: &IndexEntry) -> Result<()> {
        let mut indexes = self.indexes.write().await;
        let table = indexes
            .get_mut(index)
            .ok_or_else(|| Error::store(format!("index '{index}' does not exist")))?;
        table.write(entry)
    }

    async fn bulk_upsert(&self, index: &str, entries: &[IndexEntry]) -> Result<BulkWriteReport> {
        let mut indexes = self.indexes.write().await;
        let table = indexes
            .get_mut(index)
            .ok_or_else(|| Error::store(format!("index '{index}' does not exist")))?;

        let mut report = BulkWriteReport::default();
        for entry in entries {
            match table.write(entry) {
                Ok(()) => report.written += 1,
                Err(e) => report.failed.push(WriteFailure {
                    record_id: entry.record_id().to_string(),
                    reason: e.to_string(),
                }),
            }
        }
        Ok(report)
    }

    async fn nearest(
        &self,
        index: &str,
        query: &[f32],
        embedder: EmbedderId,
        limit: usize,
    ) -> Result<Vec<Neighbor>> {
        let indexes = self.indexes.read().await;
        let Some(table) = indexes.get(index) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<Neighbor> = table
            .rows
            .iter()
            .filter_map(|row| {
                row.vectors.get(&embedder).map(|v| Neighbor {
                    record_id: row.record_id.clone(),
                    distance: cosine_distance(query, v),
                    attributes: row.attributes.clone(),
                })
            })
            .collect();

        // Stable sort keeps insertion order among equal distances.
        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        scored.truncate(limit);
        Ok(scored)
    }
}

// ============================================================================
// Tests
// ============================================================================
