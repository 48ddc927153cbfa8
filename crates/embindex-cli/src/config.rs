//! Configuration for the embindex CLI.
//!
//! Provides the [`EmbindexConfig`] struct that loads from TOML files,
//! environment variables, and defaults using the `confyg` crate. The loaded
//! config is immutable and validated once, before any pipeline runs.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `EMBINDEX_CONFIG` environment variable
//! 3. XDG default: `~/.config/embindex/config.toml`
//! 4. Built-in defaults
//!
//! # Example
//!
//! ```toml
//! [store]
//! backend = "postgres"
//!
//! [database]
//! url_env = "DATABASE_URL"
//!
//! [embedders.gemini]
//! model = "text-embedding-004"
//! dimension = 768
//! api_key_env = "GEMINI_API_KEY"
//!
//! [[indexes]]
//! name = "products"
//! embedder = "gemini"
//! column = "Embedding"
//! default_limit = 3
//!
//! [indexes.source]
//! kind = "postgres"
//! table = "Products"
//! id_field = "Id"
//! text_field = "Description"
//! attribute_fields = ["Name", "Category", "Price"]
//! ```

use confyg::{Confygery, env};
use embindex_core::{Error, Result};
use embindex_vector::{EmbedderConfig, EmbedderId, ManagerSettings, RecordMapping, RetrySettings};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// Configuration structs
// ============================================================================

/// Main configuration for the embindex CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbindexConfig {
    /// Vector store selection.
    pub store: StoreConfig,

    /// PostgreSQL connection settings.
    pub database: DatabaseConfig,

    /// Deployment-wide pipeline policy.
    pub search: SearchConfig,

    /// Embedders, keyed by id.
    pub embedders: BTreeMap<EmbedderId, EmbedderSettings>,

    /// Declared indexes.
    pub indexes: Vec<IndexConfig>,
}

/// Which vector store backs the indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process store persisted to a JSON snapshot.
    #[default]
    Memory,
    /// PostgreSQL with pgvector.
    Postgres,
}

/// Vector store configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend to use.
    pub backend: StoreBackend,

    /// Snapshot file for the memory backend. Defaults to the XDG data dir.
    pub snapshot_path: Option<String>,
}

/// PostgreSQL configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL. Prefer `url_env` so credentials stay out of files.
    pub url: Option<String>,

    /// Environment variable holding the connection URL.
    pub url_env: String,

    /// Pool size.
    pub max_connections: u32,
}

/// Pipeline policy shared by every index unless overridden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Results returned when a query gives no `k`.
    pub default_limit: usize,

    /// Character budget applied before embedding.
    pub max_text_chars: usize,

    /// Concurrent embedder calls during a seed.
    pub seed_concurrency: usize,

    /// Records per bulk write.
    pub write_batch_size: usize,
}

/// Settings for one embedder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedderSettings {
    /// Model name sent to the provider.
    pub model: String,

    /// Output dimension.
    pub dimension: usize,

    /// Environment variable holding the API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Endpoint override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry policy for transient failures.
    #[serde(default)]
    pub retry: RetrySettings,
}

fn default_timeout_secs() -> u64 {
    30
}

/// One declared index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Index name, also the store table.
    pub name: String,

    /// Embedder used to seed and query the index.
    pub embedder: EmbedderId,

    /// Store column for this embedder (PostgreSQL only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,

    /// Override of `search.default_limit`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_limit: Option<usize>,

    /// Override of `search.max_text_chars`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_text_chars: Option<usize>,

    /// Where the index's records come from.
    pub source: SourceConfig,
}

/// Record source of an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    /// A JSON array of objects on disk.
    Json {
        /// File path.
        path: String,
        /// Field mapping.
        #[serde(flatten)]
        mapping: RecordMapping,
    },
    /// A PostgreSQL table or view.
    Postgres {
        /// Table name.
        table: String,
        /// Field mapping.
        #[serde(flatten)]
        mapping: RecordMapping,
    },
}

// ============================================================================
// Default implementations
// ============================================================================

impl Default for EmbindexConfig {
    fn default() -> Self {
        let mut embedders = BTreeMap::new();
        embedders.insert(
            EmbedderId::Mock,
            EmbedderSettings {
                model: "mock".to_string(),
                dimension: 384,
                api_key_env: None,
                base_url: None,
                timeout_secs: default_timeout_secs(),
                retry: RetrySettings::default(),
            },
        );
        Self {
            store: StoreConfig::default(),
            database: DatabaseConfig::default(),
            search: SearchConfig::default(),
            embedders,
            indexes: Vec::new(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            url_env: "DATABASE_URL".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        let settings = ManagerSettings::default();
        Self {
            default_limit: settings.default_limit,
            max_text_chars: settings.max_text_chars,
            seed_concurrency: settings.seed_concurrency,
            write_batch_size: settings.write_batch_size,
        }
    }
}

// ============================================================================
// Config loading
// ============================================================================

impl EmbindexConfig {
    /// Load configuration from file, environment, and defaults.
    ///
    /// Loading priority:
    /// 1. Explicit `config_path` (from `--config` flag)
    /// 2. `EMBINDEX_CONFIG` env var
    /// 3. XDG default: `~/.config/embindex/config.toml`
    /// 4. Built-in defaults
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path) {
            if path.exists() {
                builder
                    .add_file(&path.to_string_lossy())
                    .map_err(|e| Error::config(format!("config file: {e}")))?;
            }
        }

        let mut env_opts = env::Options::with_top_level("EMBINDEX");
        env_opts.add_section("store");
        env_opts.add_section("database");
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        let config: Self = builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))?;

        Ok(config)
    }

    /// Resolve the config file path from explicit flag, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var("EMBINDEX_CONFIG") {
            return Some(PathBuf::from(path));
        }

        Self::default_config_path()
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("embindex").join("config.toml"))
    }

    /// Where the memory backend keeps its snapshot.
    pub fn snapshot_path(&self) -> Option<PathBuf> {
        match &self.store.snapshot_path {
            Some(p) => Some(PathBuf::from(p)),
            None => dirs::data_dir().map(|d| d.join("embindex").join("store.json")),
        }
    }

    /// Serialize this config to a pretty-printed TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Pipeline settings for the index manager.
    pub fn manager_settings(&self) -> ManagerSettings {
        ManagerSettings {
            default_limit: self.search.default_limit,
            max_text_chars: self.search.max_text_chars,
            seed_concurrency: self.search.seed_concurrency,
            write_batch_size: self.search.write_batch_size,
        }
    }

    /// Whether a database connection is needed at all.
    pub fn needs_database(&self) -> bool {
        self.store.backend == StoreBackend::Postgres
            || self
                .indexes
                .iter()
                .any(|i| matches!(i.source, SourceConfig::Postgres { .. }))
    }

    /// The database URL, from `database.url` or the `url_env` variable.
    pub fn database_url(&self) -> Result<String> {
        if let Some(url) = self.database.url.as_deref().filter(|u| !u.trim().is_empty()) {
            return Ok(url.to_string());
        }
        read_env(&self.database.url_env).ok_or_else(|| {
            Error::config(format!(
                "database URL not configured: set database.url or ${}",
                self.database.url_env
            ))
        })
    }

    /// Resolve an embedder's settings into an adapter config, reading its
    /// API key from the environment.
    pub fn embedder_config(&self, id: EmbedderId) -> Result<EmbedderConfig> {
        let settings = self
            .embedders
            .get(&id)
            .ok_or_else(|| Error::config(format!("embedder '{id}' is not configured")))?;

        let mut config = EmbedderConfig::new(id, settings.model.clone(), settings.dimension)
            .with_retry(settings.retry.clone());
        config.timeout = Duration::from_secs(settings.timeout_secs);
        if let Some(url) = &settings.base_url {
            config = config.with_base_url(url.clone());
        }

        if let Some(var) = &settings.api_key_env {
            match read_env(var) {
                Some(key) => config = config.with_api_key(key),
                None => {
                    return Err(Error::config(format!(
                        "environment variable {var} is not set (API key for embedder '{id}')"
                    )));
                }
            }
        } else if matches!(id, EmbedderId::Gemini | EmbedderId::OpenAi) {
            return Err(Error::config(format!(
                "embedder '{id}' needs api_key_env naming the variable that holds its key"
            )));
        }

        Ok(config)
    }

    /// Check the whole configuration before any work starts.
    ///
    /// Fails on the first problem: bad pipeline settings, embedders without
    /// credentials, indexes naming unknown embedders, or a missing database.
    pub fn validate(&self) -> Result<()> {
        self.manager_settings_check()?;

        for (id, settings) in &self.embedders {
            if settings.model.trim().is_empty() {
                return Err(Error::config(format!("embedder '{id}' has no model")));
            }
            if settings.dimension == 0 {
                return Err(Error::config(format!(
                    "embedder '{id}' must declare a non-zero dimension"
                )));
            }
            self.embedder_config(*id)?;
        }

        let mut seen = BTreeSet::new();
        for index in &self.indexes {
            if !is_identifier(&index.name) {
                return Err(Error::config(format!(
                    "index name '{}' must be a plain identifier",
                    index.name
                )));
            }
            if !seen.insert(index.name.as_str()) {
                return Err(Error::config(format!(
                    "index '{}' is declared twice",
                    index.name
                )));
            }
            if !self.embedders.contains_key(&index.embedder) {
                return Err(Error::config(format!(
                    "index '{}' uses embedder '{}', which is not configured",
                    index.name, index.embedder
                )));
            }
            if index.default_limit == Some(0) || index.max_text_chars == Some(0) {
                return Err(Error::config(format!(
                    "index '{}' overrides must be at least 1",
                    index.name
                )));
            }
            if let Some(column) = &index.column {
                if !is_identifier(column) {
                    return Err(Error::config(format!(
                        "column '{column}' of index '{}' must be a plain identifier",
                        index.name
                    )));
                }
            }
            match &index.source {
                SourceConfig::Json { path, .. } if path.trim().is_empty() => {
                    return Err(Error::config(format!(
                        "index '{}' has an empty source path",
                        index.name
                    )));
                }
                SourceConfig::Postgres { table, .. } if !is_identifier(table) => {
                    return Err(Error::config(format!(
                        "source table '{table}' of index '{}' must be a plain identifier",
                        index.name
                    )));
                }
                _ => {}
            }
        }

        if self.needs_database() {
            self.database_url()?;
        }
        Ok(())
    }

    fn manager_settings_check(&self) -> Result<()> {
        let s = &self.search;
        for (name, value) in [
            ("search.default_limit", s.default_limit),
            ("search.max_text_chars", s.max_text_chars),
            ("search.seed_concurrency", s.seed_concurrency),
            ("search.write_batch_size", s.write_batch_size),
        ] {
            if value == 0 {
                return Err(Error::config(format!("{name} must be at least 1")));
            }
        }
        Ok(())
    }
}

fn read_env(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ============================================================================
// Tests
// ============================================================================
