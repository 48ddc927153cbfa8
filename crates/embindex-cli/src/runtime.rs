//! Wiring from a validated [`EmbindexConfig`] to a ready [`IndexManager`].

use crate::config::{EmbindexConfig, SourceConfig, StoreBackend};
use embindex_core::{Error, Result};
use embindex_vector::{
    IndexManager, IndexSpec, JsonFileSource, MemoryVectorStore, RecordSource, VectorStore,
    build_embedder,
};
use std::path::PathBuf;
use std::sync::Arc;

#[cfg(feature = "postgres")]
use embindex_vector::{PgRecordSource, PgVectorStore, postgres};

/// A built index manager plus what is needed to persist its store.
pub struct Runtime {
    manager: IndexManager,
    memory: Option<(Arc<MemoryVectorStore>, Option<PathBuf>)>,
}

impl Runtime {
    /// Build every embedder, the store, and each index's source.
    ///
    /// The config is validated first, so a missing credential or unknown
    /// embedder fails here before any record is touched.
    pub async fn build(config: &EmbindexConfig) -> Result<Self> {
        config.validate()?;

        #[cfg(feature = "postgres")]
        let pool = if config.needs_database() {
            let url = config.database_url()?;
            Some(postgres::connect(&url, config.database.max_connections).await?)
        } else {
            None
        };
        if cfg!(not(feature = "postgres")) && config.needs_database() {
            return Err(Error::config(
                "PostgreSQL support is not compiled in; rebuild with the `postgres` feature",
            ));
        }

        let mut builder = IndexManager::builder().settings(config.manager_settings());
        for id in config.embedders.keys() {
            builder = builder.embedder(build_embedder(&config.embedder_config(*id)?)?);
        }

        let mut memory = None;
        let store: Arc<dyn VectorStore> = match config.store.backend {
            StoreBackend::Memory => {
                let path = config.snapshot_path();
                let store = match &path {
                    Some(p) => MemoryVectorStore::load_snapshot(p)?,
                    None => MemoryVectorStore::new(),
                };
                let store = Arc::new(store);
                memory = Some((Arc::clone(&store), path));
                store
            }
            StoreBackend::Postgres => {
                #[cfg(feature = "postgres")]
                {
                    let pool = pool
                        .clone()
                        .ok_or_else(|| Error::config("database pool unavailable"))?;
                    let mut store = PgVectorStore::new(pool);
                    for index in &config.indexes {
                        if let Some(column) = &index.column {
                            store = store.with_column(&index.name, index.embedder, column);
                        }
                    }
                    Arc::new(store)
                }
                #[cfg(not(feature = "postgres"))]
                {
                    return Err(Error::config("PostgreSQL support is not compiled in"));
                }
            }
        };
        builder = builder.store(store);

        for index in &config.indexes {
            let mut spec = IndexSpec::new(&index.name, index.embedder);
            if let Some(limit) = index.default_limit {
                spec = spec.with_default_limit(limit);
            }
            if let Some(chars) = index.max_text_chars {
                spec = spec.with_max_text_chars(chars);
            }

            let source: Arc<dyn RecordSource> = match &index.source {
                SourceConfig::Json { path, mapping } => {
                    Arc::new(JsonFileSource::new(path, mapping.clone()))
                }
                #[cfg(feature = "postgres")]
                SourceConfig::Postgres { table, mapping } => {
                    let pool = pool
                        .clone()
                        .ok_or_else(|| Error::config("database pool unavailable"))?;
                    Arc::new(PgRecordSource::new(pool, table, mapping.clone()))
                }
                #[cfg(not(feature = "postgres"))]
                SourceConfig::Postgres { .. } => {
                    return Err(Error::config("PostgreSQL support is not compiled in"));
                }
            };
            builder = builder.index(spec, source);
        }

        let manager = builder.build()?;

        // The in-process store has no separate migration step.
        if memory.is_some() {
            manager.init_schema().await?;
        }

        log::debug!(
            "Runtime ready: {} indexes on {} store",
            manager.index_names().len(),
            manager.store().name()
        );
        Ok(Self { manager, memory })
    }

    /// The index manager.
    pub fn manager(&self) -> &IndexManager {
        &self.manager
    }

    /// Write the memory store's snapshot, if there is one.
    pub async fn persist(&self) -> Result<()> {
        if let Some((store, Some(path))) = &self.memory {
            store.save_snapshot(path).await?;
            log::debug!("Saved snapshot to {}", path.display());
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
