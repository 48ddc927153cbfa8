//! Index manager: the seed and query pipelines.
//!
//! The manager owns the mapping from index name to (embedder, record
//! source), enforces dimension consistency between embedders and store
//! columns, and is the only writer of embeddings.
//!
//! # Seed
//!
//! ```text
//! source.fetch_all() ─► skip blank text ─► truncate ─► embed (bounded
//! concurrency, per write batch) ─► validate vectors ─► store.bulk_upsert
//! ```
//!
//! # Query
//!
//! ```text
//! validate k / query ─► truncate ─► embed once ─► store.nearest(k)
//! ```

use futures::FutureExt;
use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use embindex_core::{Error, Result};

use crate::distance::validate_vector;
use crate::embedding::Embedder;
use crate::source::RecordSource;
use crate::store::VectorStore;
use crate::types::{
    EmbeddableRecord, EmbedderId, EmbeddingRecord, IndexDescription, IndexEntry, SearchOutcome,
    SearchResult, SeedFailure, SeedSummary,
};

/// Failure reason recorded for records with no usable text.
pub const EMPTY_SOURCE_TEXT: &str = "empty source text";

/// Deployment-wide pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerSettings {
    /// Results returned when a query does not specify `k`.
    pub default_limit: usize,
    /// Character budget applied to text before embedding.
    pub max_text_chars: usize,
    /// Embedder calls in flight during a seed.
    pub seed_concurrency: usize,
    /// Records per `bulk_upsert` call.
    pub write_batch_size: usize,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            default_limit: 5,
            max_text_chars: 12_000,
            seed_concurrency: 4,
            write_batch_size: 64,
        }
    }
}

impl ManagerSettings {
    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("default_limit", self.default_limit),
            ("max_text_chars", self.max_text_chars),
            ("seed_concurrency", self.seed_concurrency),
            ("write_batch_size", self.write_batch_size),
        ] {
            if value == 0 {
                return Err(Error::config(format!("{name} must be at least 1")));
            }
        }
        Ok(())
    }
}

/// Declaration of one index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    /// Index name (also the store table name).
    pub name: String,
    /// Embedder whose column this index is seeded and queried through.
    pub embedder: EmbedderId,
    /// Override of [`ManagerSettings::default_limit`].
    pub default_limit: Option<usize>,
    /// Override of [`ManagerSettings::max_text_chars`].
    pub max_text_chars: Option<usize>,
}

impl IndexSpec {
    /// Declare an index using the deployment defaults.
    pub fn new(name: impl Into<String>, embedder: EmbedderId) -> Self {
        Self {
            name: name.into(),
            embedder,
            default_limit: None,
            max_text_chars: None,
        }
    }

    /// Override the default result limit.
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = Some(limit);
        self
    }

    /// Override the text budget.
    pub fn with_max_text_chars(mut self, chars: usize) -> Self {
        self.max_text_chars = Some(chars);
        self
    }
}

struct RegisteredIndex {
    spec: IndexSpec,
    source: Arc<dyn RecordSource>,
}

fn dimension_mismatch(index: &str, stored: usize, embedder: &Arc<dyn Embedder>) -> Error {
    Error::validation(format!(
        "index '{index}' stores {stored}-dimensional vectors but embedder '{}' produces {}",
        embedder.id(),
        embedder.dimension()
    ))
}

/// Cut `text` to at most `max_chars` characters, on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`IndexManager`].
#[derive(Default)]
pub struct IndexManagerBuilder {
    settings: ManagerSettings,
    embedders: HashMap<EmbedderId, Arc<dyn Embedder>>,
    store: Option<Arc<dyn VectorStore>>,
    indexes: Vec<(IndexSpec, Arc<dyn RecordSource>)>,
}

impl IndexManagerBuilder {
    /// Set the deployment settings.
    pub fn settings(mut self, settings: ManagerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Register an embedder under its own [`Embedder::id`].
    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedders.insert(embedder.id(), embedder);
        self
    }

    /// Set the vector store.
    pub fn store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Register an index and the source its records come from.
    pub fn index(mut self, spec: IndexSpec, source: Arc<dyn RecordSource>) -> Self {
        self.indexes.push((spec, source));
        self
    }

    /// Validate and build the manager.
    pub fn build(self) -> Result<IndexManager> {
        self.settings.validate()?;
        let store = self
            .store
            .ok_or_else(|| Error::config("index manager requires a vector store"))?;

        let mut indexes = BTreeMap::new();
        for (spec, source) in self.indexes {
            if spec.name.trim().is_empty() {
                return Err(Error::config("index name must not be empty"));
            }
            if !self.embedders.contains_key(&spec.embedder) {
                return Err(Error::config(format!(
                    "index '{}' uses embedder '{}', which is not configured",
                    spec.name, spec.embedder
                )));
            }
            if spec.default_limit == Some(0) || spec.max_text_chars == Some(0) {
                return Err(Error::config(format!(
                    "index '{}' overrides must be at least 1",
                    spec.name
                )));
            }
            if indexes.contains_key(&spec.name) {
                return Err(Error::config(format!(
                    "index '{}' is declared twice",
                    spec.name
                )));
            }
            indexes.insert(spec.name.clone(), RegisteredIndex { spec, source });
        }

        Ok(IndexManager {
            settings: self.settings,
            embedders: self.embedders,
            store,
            indexes,
        })
    }
}

// ============================================================================
// Manager
// ============================================================================

/// Runs the seed and query pipelines over a set of named indexes.
pub struct IndexManager {
    settings: ManagerSettings,
    embedders: HashMap<EmbedderId, Arc<dyn Embedder>>,
    store: Arc<dyn VectorStore>,
    indexes: BTreeMap<String, RegisteredIndex>,
}

impl IndexManager {
    /// Start building a manager.
    pub fn builder() -> IndexManagerBuilder {
        IndexManagerBuilder::default()
    }

    /// The deployment settings.
    pub fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    /// Registered index names, sorted.
    pub fn index_names(&self) -> Vec<&str> {
        self.indexes.keys().map(String::as_str).collect()
    }

    /// The vector store.
    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    fn lookup(&self, index: &str) -> Result<(&RegisteredIndex, &Arc<dyn Embedder>)> {
        let registered = self
            .indexes
            .get(index)
            .ok_or_else(|| Error::validation(format!("unknown index '{index}'")))?;
        let embedder = self.embedders.get(&registered.spec.embedder).ok_or_else(|| {
            Error::config(format!(
                "embedder '{}' is not configured",
                registered.spec.embedder
            ))
        })?;
        Ok((registered, embedder))
    }

    fn default_limit(&self, spec: &IndexSpec) -> usize {
        spec.default_limit.unwrap_or(self.settings.default_limit)
    }

    fn max_text_chars(&self, spec: &IndexSpec) -> usize {
        spec.max_text_chars.unwrap_or(self.settings.max_text_chars)
    }

    /// Create every index's table and embedder column if missing.
    pub async fn init_schema(&self) -> Result<()> {
        for (name, registered) in &self.indexes {
            let (_, embedder) = self.lookup(name)?;
            self.store
                .ensure_index(name, registered.spec.embedder, embedder.dimension())
                .await?;
        }
        Ok(())
    }

    /// Check that the store column for `index` matches its embedder.
    async fn check_dimensions(&self, index: &str, embedder: &Arc<dyn Embedder>) -> Result<()> {
        match self.store.dimension(index, embedder.id()).await? {
            None => Err(Error::validation(format!(
                "index '{index}' has no vector column for embedder '{}'; initialize the schema first",
                embedder.id()
            ))),
            Some(stored) if stored != embedder.dimension() => {
                Err(dimension_mismatch(index, stored, embedder))
            }
            Some(_) => Ok(()),
        }
    }

    // ------------------------------------------------------------------------
    // Seed
    // ------------------------------------------------------------------------

    /// Embed every record of `index` and write the vectors to the store.
    ///
    /// Per-record problems (blank text, embedder failures, bad vectors,
    /// rejected rows) are collected into the summary. Validation, source and
    /// store-connectivity failures abort the run. Cancellation stops before
    /// the next write batch; batches already written stay written.
    pub async fn seed(&self, index: &str, cancel: &CancellationToken) -> Result<SeedSummary> {
        let started = Instant::now();
        let (registered, embedder) = self.lookup(index)?;
        self.check_dimensions(index, embedder).await?;

        let records = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::cancelled(format!("seed of '{index}' cancelled"))),
            records = registered.source.fetch_all() => records?,
        };

        let attempted = records.len();
        let max_chars = self.max_text_chars(&registered.spec);
        log::info!(
            "Seeding '{index}' from {} with {} ({} records)",
            registered.source.name(),
            embedder.id(),
            attempted
        );

        let mut failed = Vec::new();
        let mut pending: Vec<(EmbeddableRecord, String)> = Vec::with_capacity(attempted);
        for record in records {
            match record.embeddable_text() {
                Some(text) => {
                    let text = truncate_chars(text, max_chars).to_string();
                    pending.push((record, text));
                }
                None => failed.push(SeedFailure::new(&record.id, EMPTY_SOURCE_TEXT)),
            }
        }

        let mut succeeded = 0;
        let batch_size = self.settings.write_batch_size;
        for batch in pending.chunks(batch_size) {
            if cancel.is_cancelled() {
                log::warn!("Seed of '{index}' cancelled after {succeeded} records written");
                return Err(Error::cancelled(format!(
                    "seed of '{index}' cancelled after {succeeded} of {attempted} records written"
                )));
            }

            let embedded = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    log::warn!("Seed of '{index}' cancelled after {succeeded} records written");
                    return Err(Error::cancelled(format!(
                        "seed of '{index}' cancelled after {succeeded} of {attempted} records written"
                    )));
                }
                embedded = self.embed_batch(embedder, batch) => embedded,
            };

            let mut entries = Vec::with_capacity(embedded.len());
            for (record, result) in embedded {
                let vector = result.and_then(|v| {
                    validate_vector(&v, embedder.dimension())?;
                    Ok(v)
                });
                match vector {
                    Ok(vector) => entries.push(IndexEntry::new(
                        EmbeddingRecord {
                            record_id: record.id.clone(),
                            vector,
                            embedder: embedder.id(),
                        },
                        record.attributes.clone(),
                    )),
                    Err(e) => {
                        log::debug!("Record '{}' not embedded: {e}", record.id);
                        failed.push(SeedFailure::new(&record.id, e.to_string()));
                    }
                }
            }

            if entries.is_empty() {
                continue;
            }
            // A started write is allowed to finish so batches are never torn.
            let report = self.store.bulk_upsert(index, &entries).await?;
            succeeded += report.written;
            failed.extend(
                report
                    .failed
                    .into_iter()
                    .map(|f| SeedFailure::new(f.record_id, f.reason)),
            );
            log::debug!("'{index}': {succeeded}/{attempted} written");
        }

        let summary = SeedSummary {
            index: index.to_string(),
            embedder: embedder.id(),
            attempted,
            succeeded,
            failed,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        log::info!(
            "Seeded '{index}': {} attempted, {} succeeded, {} failed in {}ms",
            summary.attempted,
            summary.succeeded,
            summary.failed.len(),
            summary.duration_ms
        );
        Ok(summary)
    }

    fn embed_batch<'a>(
        &'a self,
        embedder: &'a Arc<dyn Embedder>,
        batch: &'a [(EmbeddableRecord, String)],
    ) -> BoxFuture<'a, Vec<(&'a EmbeddableRecord, Result<Vec<f32>>)>> {
        stream::iter(batch)
            .map(move |(record, text)| async move { (record, embedder.embed(text).await) })
            .buffer_unordered(self.settings.seed_concurrency)
            .collect()
            .boxed()
    }

    // ------------------------------------------------------------------------
    // Single record
    // ------------------------------------------------------------------------

    /// Embed one record and upsert it immediately.
    ///
    /// Unlike [`seed`](Self::seed), any failure is returned as an error.
    pub async fn index_record(&self, index: &str, record: &EmbeddableRecord) -> Result<()> {
        let (registered, embedder) = self.lookup(index)?;
        self.check_dimensions(index, embedder).await?;

        let text = record.embeddable_text().ok_or_else(|| {
            Error::validation(format!("record '{}': {EMPTY_SOURCE_TEXT}", record.id))
        })?;
        let text = truncate_chars(text, self.max_text_chars(&registered.spec));

        let vector = embedder.embed(text).await?;
        validate_vector(&vector, embedder.dimension())?;

        let entry = IndexEntry::new(
            EmbeddingRecord {
                record_id: record.id.clone(),
                vector,
                embedder: embedder.id(),
            },
            record.attributes.clone(),
        );
        self.store.upsert(index, &entry).await?;
        log::info!("Indexed record '{}' into '{index}'", record.id);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Query
    // ------------------------------------------------------------------------

    /// Find the `k` records of `index` nearest to `query`.
    ///
    /// `k` defaults to the index's default limit. An index with nothing
    /// comparable yields [`SearchOutcome::NoMatches`], not an error.
    pub async fn search(
        &self,
        index: &str,
        query: &str,
        k: Option<usize>,
        cancel: &CancellationToken,
    ) -> Result<SearchOutcome> {
        if k == Some(0) {
            return Err(Error::validation("k must be at least 1"));
        }
        let (registered, embedder) = self.lookup(index)?;
        if query.trim().is_empty() {
            return Err(Error::validation("query must not be empty"));
        }
        if cancel.is_cancelled() {
            return Err(Error::cancelled(format!("search of '{index}' cancelled")));
        }

        // No column yet means nothing was ever seeded for this embedder.
        match self.store.dimension(index, embedder.id()).await? {
            None => return Ok(SearchOutcome::from_results(index, Vec::new())),
            Some(stored) if stored != embedder.dimension() => {
                return Err(dimension_mismatch(index, stored, embedder));
            }
            Some(_) => {}
        }

        let limit = k.unwrap_or_else(|| self.default_limit(&registered.spec));
        let text = truncate_chars(query, self.max_text_chars(&registered.spec));

        let vector = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::cancelled(format!("search of '{index}' cancelled"))),
            vector = embedder.embed(text) => vector?,
        };
        validate_vector(&vector, embedder.dimension())?;

        let neighbors = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::cancelled(format!("search of '{index}' cancelled"))),
            neighbors = self.store.nearest(index, &vector, embedder.id(), limit) => neighbors?,
        };

        log::debug!("'{index}': {} results for k={limit}", neighbors.len());
        let results: Vec<SearchResult> = neighbors.into_iter().map(Into::into).collect();
        Ok(SearchOutcome::from_results(index, results))
    }

    // ------------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------------

    /// Describe every registered index.
    pub async fn describe(&self) -> Result<Vec<IndexDescription>> {
        let mut descriptions = Vec::with_capacity(self.indexes.len());
        for (name, registered) in &self.indexes {
            let (_, embedder) = self.lookup(name)?;
            descriptions.push(IndexDescription {
                name: name.clone(),
                embedder: embedder.id(),
                model: embedder.model().to_string(),
                dimension: embedder.dimension(),
                stored: self.store.count(name, embedder.id()).await?,
                default_limit: self.default_limit(&registered.spec),
                max_text_chars: self.max_text_chars(&registered.spec),
                source: registered.source.name(),
            });
        }
        Ok(descriptions)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::embedding::MockEmbedder;
    use crate::source::MemorySource;
    use crate::store::MemoryVectorStore;

    fn manager_with(records: Vec<EmbeddableRecord>, settings: ManagerSettings) -> IndexManager {
        IndexManager::builder()
            .settings(settings)
            .embedder(Arc::new(MockEmbedder::new(8)))
            .store(Arc::new(MemoryVectorStore::new().with_index(
                "clubs",
                EmbedderId::Mock,
                8,
            )))
            .index(
                IndexSpec::new("clubs", EmbedderId::Mock),
                Arc::new(MemorySource::new(records)),
            )
            .build()
            .unwrap()
    }

    // ------------------------------------------------------------------------
    // truncate_chars tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 5), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("São Paulo", 2), "Sã");
        assert_eq!(truncate_chars("⚽⚽⚽", 1), "⚽");
    }

    // ------------------------------------------------------------------------
    // Builder tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_builder_requires_store() {
        let err = IndexManager::builder().build().err().unwrap();
        assert!(err.to_string().contains("vector store"));
    }

    #[test]
    fn test_builder_rejects_unconfigured_embedder() {
        let err = IndexManager::builder()
            .store(Arc::new(MemoryVectorStore::new()))
            .index(
                IndexSpec::new("docs", EmbedderId::Gemini),
                Arc::new(MemorySource::default()),
            )
            .build()
            .err()
            .unwrap();
        assert!(err.to_string().contains("gemini"));
    }

    #[test]
    fn test_builder_rejects_duplicates_and_zero_settings() {
        let duplicate = IndexManager::builder()
            .embedder(Arc::new(MockEmbedder::new(4)))
            .store(Arc::new(MemoryVectorStore::new()))
            .index(IndexSpec::new("a", EmbedderId::Mock), Arc::new(MemorySource::default()))
            .index(IndexSpec::new("a", EmbedderId::Mock), Arc::new(MemorySource::default()))
            .build();
        assert!(duplicate.is_err());

        let zero = IndexManager::builder()
            .settings(ManagerSettings {
                seed_concurrency: 0,
                ..ManagerSettings::default()
            })
            .store(Arc::new(MemoryVectorStore::new()))
            .build();
        assert!(zero.is_err());
    }

    // ------------------------------------------------------------------------
    // Pipeline tests
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_seed_batches_cover_every_record() {
        let records = (0..7)
            .map(|i| EmbeddableRecord::new(format!("c{i}"), format!("club number {i}")))
            .collect();
        let manager = manager_with(
            records,
            ManagerSettings {
                write_batch_size: 3,
                seed_concurrency: 2,
                ..ManagerSettings::default()
            },
        );

        let summary = manager.seed("clubs", &CancellationToken::new()).await.unwrap();
        assert_eq!(summary.attempted, 7);
        assert_eq!(summary.succeeded, 7);
        assert!(summary.failed.is_empty());
    }

    #[tokio::test]
    async fn test_seed_requires_schema() {
        let manager = IndexManager::builder()
            .embedder(Arc::new(MockEmbedder::new(8)))
            .store(Arc::new(MemoryVectorStore::new()))
            .index(
                IndexSpec::new("clubs", EmbedderId::Mock),
                Arc::new(MemorySource::new(vec![EmbeddableRecord::new("c1", "x")])),
            )
            .build()
            .unwrap();

        let err = manager.seed("clubs", &CancellationToken::new()).await.unwrap_err();
        assert!(err.is_validation());

        manager.init_schema().await.unwrap();
        let summary = manager.seed("clubs", &CancellationToken::new()).await.unwrap();
        assert_eq!(summary.succeeded, 1);
    }

    #[tokio::test]
    async fn test_seed_rejects_dimension_mismatch() {
        let manager = IndexManager::builder()
            .embedder(Arc::new(MockEmbedder::new(8)))
            .store(Arc::new(MemoryVectorStore::new().with_index(
                "clubs",
                EmbedderId::Mock,
                16,
            )))
            .index(
                IndexSpec::new("clubs", EmbedderId::Mock),
                Arc::new(MemorySource::new(vec![EmbeddableRecord::new("c1", "x")])),
            )
            .build()
            .unwrap();

        let err = manager.seed("clubs", &CancellationToken::new()).await.unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("16"));
        assert_eq!(manager.store().count("clubs", EmbedderId::Mock).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_seed_unknown_index() {
        let manager = manager_with(vec![], ManagerSettings::default());
        let err = manager.seed("nope", &CancellationToken::new()).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_seed_pre_cancelled() {
        let manager = manager_with(
            vec![EmbeddableRecord::new("c1", "x")],
            ManagerSettings::default(),
        );
        let token = CancellationToken::new();
        token.cancel();

        let err = manager.seed("clubs", &token).await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(manager.store().count("clubs", EmbedderId::Mock).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_index_record() {
        let manager = manager_with(vec![], ManagerSettings::default());
        let record = EmbeddableRecord::new("c9", "Clube Atlético").with_attribute("name", "CA");

        manager.index_record("clubs", &record).await.unwrap();
        let outcome = manager
            .search("clubs", "Clube Atlético", Some(1), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.results()[0].record_id, "c9");
        assert_eq!(outcome.results()[0].attributes["name"], "CA");

        let err = manager
            .index_record("clubs", &EmbeddableRecord::without_text("c10"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains(EMPTY_SOURCE_TEXT));
    }

    #[tokio::test]
    async fn test_search_validation() {
        let manager = manager_with(vec![], ManagerSettings::default());
        let token = CancellationToken::new();

        assert!(manager.search("clubs", "x", Some(0), &token).await.unwrap_err().is_validation());
        assert!(manager.search("nope", "x", None, &token).await.unwrap_err().is_validation());
        assert!(manager.search("clubs", "  ", None, &token).await.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_search_uses_index_default_limit() {
        let records = (0..6)
            .map(|i| EmbeddableRecord::new(format!("c{i}"), format!("club {i}")))
            .collect();
        let manager = IndexManager::builder()
            .embedder(Arc::new(MockEmbedder::new(8)))
            .store(Arc::new(MemoryVectorStore::new().with_index(
                "clubs",
                EmbedderId::Mock,
                8,
            )))
            .index(
                IndexSpec::new("clubs", EmbedderId::Mock).with_default_limit(2),
                Arc::new(MemorySource::new(records)),
            )
            .build()
            .unwrap();
        let token = CancellationToken::new();

        manager.seed("clubs", &token).await.unwrap();
        let outcome = manager.search("clubs", "club", None, &token).await.unwrap();
        assert_eq!(outcome.results().len(), 2);
    }

    #[tokio::test]
    async fn test_describe() {
        let manager = manager_with(
            vec![EmbeddableRecord::new("c1", "x"), EmbeddableRecord::new("c2", "y")],
            ManagerSettings::default(),
        );
        manager.seed("clubs", &CancellationToken::new()).await.unwrap();

        let described = manager.describe().await.unwrap();
        assert_eq!(described.len(), 1);
        assert_eq!(described[0].name, "clubs");
        assert_eq!(described[0].dimension, 8);
        assert_eq!(described[0].stored, 2);
        assert_eq!(described[0].default_limit, 5);
        assert_eq!(described[0].max_text_chars, 12_000);
        assert_eq!(manager.index_names(), vec!["clubs"]);
    }
}
