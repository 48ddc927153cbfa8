//! PostgreSQL + pgvector backend.
//!
//! Each index is one table:
//!
//! ```sql
//! CREATE TABLE "<index>" (
//!     record_id  TEXT PRIMARY KEY,
//!     seq        BIGSERIAL,
//!     attributes JSONB NOT NULL DEFAULT '{}'::jsonb,
//!     "<column>" vector(D)      -- one per embedder
//! );
//! ```
//!
//! Distances come from pgvector's `<=>` cosine operator. Vectors travel as
//! their text form (`'[0.1,0.2]'`) and are cast with `::vector`, so no
//! client-side pgvector type is needed.
//!
//! This module is only available with the `store-postgres` feature.

use async_trait::async_trait;
use embindex_core::{Error, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::Row;
use std::collections::HashMap;

use crate::source::{RecordMapping, RecordSource, record_from_json};
use crate::store::VectorStore;
use crate::types::{
    Attributes, BulkWriteReport, EmbeddableRecord, EmbedderId, IndexEntry, Neighbor, WriteFailure,
};

/// SQLSTATE for "relation does not exist".
const UNDEFINED_TABLE: &str = "42P01";

/// Open a connection pool.
pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await
        .map_err(|e| Error::store(format!("Failed to connect to PostgreSQL: {e}")))
}

/// Quote an identifier after checking it is a plain SQL name.
pub(crate) fn quote_ident(name: &str) -> Result<String> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') || name.len() > 63 {
        return Err(Error::validation(format!(
            "'{name}' is not a valid table or column name"
        )));
    }
    Ok(format!("\"{name}\""))
}

/// pgvector text form of a vector.
pub(crate) fn vector_literal(vector: &[f32]) -> String {
    let parts: Vec<String> = vector.iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(","))
}

/// `LIMIT` value for a result count; counts beyond `i64::MAX` saturate.
pub(crate) fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn store_error(context: &str, e: sqlx::Error) -> Error {
    Error::store(format!("{context}: {e}"))
}

/// Errors raised by the database for one row (constraint, bad value),
/// as opposed to losing the connection.
fn is_row_error(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(_))
}

fn is_undefined_table(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|d| d.code())
        .is_some_and(|code| code == UNDEFINED_TABLE)
}

// ============================================================================
// PgVectorStore
// ============================================================================

/// Vector store backed by PostgreSQL with the pgvector extension.
///
/// Every operation acquires its own pooled connection, which is returned to
/// the pool when the operation finishes or fails.
pub struct PgVectorStore {
    pool: PgPool,
    columns: HashMap<(String, EmbedderId), String>,
}

impl PgVectorStore {
    /// Create a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            columns: HashMap::new(),
        }
    }

    /// Use `column` for `embedder`'s vectors in `index` instead of the
    /// default `embedding_<embedder>`.
    pub fn with_column(
        mut self,
        index: impl Into<String>,
        embedder: EmbedderId,
        column: impl Into<String>,
    ) -> Self {
        self.columns
            .insert((index.into(), embedder), column.into());
        self
    }

    /// The underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Column name holding `embedder`'s vectors in `index`.
    pub fn column_name(&self, index: &str, embedder: EmbedderId) -> String {
        self.columns
            .get(&(index.to_string(), embedder))
            .cloned()
            .unwrap_or_else(|| format!("embedding_{}", embedder.as_str()))
    }

    fn idents(&self, index: &str, embedder: EmbedderId) -> Result<(String, String)> {
        Ok((
            quote_ident(index)?,
            quote_ident(&self.column_name(index, embedder))?,
        ))
    }

    fn upsert_sql(table: &str, column: &str) -> String {
        format!(
            "INSERT INTO {table} (record_id, attributes, {column}) \
             VALUES ($1, $2, $3::vector) \
             ON CONFLICT (record_id) DO UPDATE \
             SET attributes = EXCLUDED.attributes, {column} = EXCLUDED.{column}"
        )
    }

    fn nearest_sql(table: &str, column: &str) -> String {
        format!(
            "SELECT record_id, attributes, ({column} <=> $1::vector)::float8 AS distance \
             FROM {table} \
             WHERE {column} IS NOT NULL \
             ORDER BY distance, seq \
             LIMIT $2"
        )
    }
}

#[async_trait]
impl VectorStore for PgVectorStore {
    fn name(&self) -> &str {
        "postgres"
    }

    async fn ensure_index(
        &self,
        index: &str,
        embedder: EmbedderId,
        dimension: usize,
    ) -> Result<()> {
        let (table, column) = self.idents(index, embedder)?;
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| store_error("Failed to acquire connection", e))?;

        let statements = [
            "CREATE EXTENSION IF NOT EXISTS vector".to_string(),
            format!(
                "CREATE TABLE IF NOT EXISTS {table} (\
                 record_id TEXT PRIMARY KEY, \
                 seq BIGSERIAL, \
                 attributes JSONB NOT NULL DEFAULT '{{}}'::jsonb)"
            ),
            format!("ALTER TABLE {table} ADD COLUMN IF NOT EXISTS {column} vector({dimension})"),
        ];
        for sql in &statements {
            sqlx::query(sql)
                .execute(&mut *conn)
                .await
                .map_err(|e| store_error("Failed to create schema", e))?;
        }
        drop(conn);

        match self.dimension(index, embedder).await? {
            Some(existing) if existing != dimension => Err(Error::validation(format!(
                "column {column} of {table} is vector({existing}), but {dimension} was declared"
            ))),
            _ => {
                log::info!("Schema ready: {table}.{column} vector({dimension})");
                Ok(())
            }
        }
    }

    async fn dimension(&self, index: &str, embedder: EmbedderId) -> Result<Option<usize>> {
        let (table, _) = self.idents(index, embedder)?;
        let column = self.column_name(index, embedder);
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| store_error("Failed to acquire connection", e))?;

        // pgvector stores the declared dimension as the type modifier.
        let typmod: Option<i32> = sqlx::query_scalar(
            "SELECT a.atttypmod FROM pg_attribute a \
             WHERE a.attrelid = to_regclass($1) AND a.attname = $2 AND NOT a.attisdropped",
        )
        .bind(&table)
        .bind(&column)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| store_error("Failed to read column dimension", e))?;

        Ok(typmod.filter(|t| *t > 0).map(|t| t as usize))
    }

    async fn count(&self, index: &str, embedder: EmbedderId) -> Result<usize> {
        let (table, column) = self.idents(index, embedder)?;
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| store_error("Failed to acquire connection", e))?;

        let result: std::result::Result<i64, sqlx::Error> = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {table} WHERE {column} IS NOT NULL"
        ))
        .fetch_one(&mut *conn)
        .await;

        match result {
            Ok(n) => Ok(n.max(0) as usize),
            Err(e) if is_undefined_table(&e) => Ok(0),
            Err(e) => Err(store_error("Failed to count embeddings", e)),
        }
    }

    async fn upsert(&self, index: &str, entry: &IndexEntry) -> Result<()> {
        let (table, column) = self.idents(index, entry.embedding.embedder)?;
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| store_error("Failed to acquire connection", e))?;

        sqlx::query(&Self::upsert_sql(&table, &column))
            .bind(entry.record_id())
            .bind(Json(&entry.attributes))
            .bind(vector_literal(&entry.embedding.vector))
            .execute(&mut *conn)
            .await
            .map_err(|e| store_error(&format!("Failed to upsert '{}'", entry.record_id()), e))?;
        Ok(())
    }

    async fn bulk_upsert(&self, index: &str, entries: &[IndexEntry]) -> Result<BulkWriteReport> {
        let mut report = BulkWriteReport::default();
        if entries.is_empty() {
            return Ok(report);
        }

        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| store_error("Failed to acquire connection", e))?;

        for entry in entries {
            let (table, column) = self.idents(index, entry.embedding.embedder)?;
            let result = sqlx::query(&Self::upsert_sql(&table, &column))
                .bind(entry.record_id())
                .bind(Json(&entry.attributes))
                .bind(vector_literal(&entry.embedding.vector))
                .execute(&mut *conn)
                .await;

            match result {
                Ok(_) => report.written += 1,
                Err(e) if is_row_error(&e) => {
                    log::warn!("Rejected row '{}' in {table}: {e}", entry.record_id());
                    report.failed.push(WriteFailure {
                        record_id: entry.record_id().to_string(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(store_error("Bulk write aborted", e)),
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
        let (table, column) = self.idents(index, embedder)?;
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| store_error("Failed to acquire connection", e))?;

        let result = sqlx::query(&Self::nearest_sql(&table, &column))
            .bind(vector_literal(query))
            .bind(sql_limit(limit))
            .fetch_all(&mut *conn)
            .await;

        let rows = match result {
            Ok(rows) => rows,
            Err(e) if is_undefined_table(&e) => return Ok(Vec::new()),
            Err(e) => return Err(store_error("Nearest-neighbour query failed", e)),
        };

        rows.iter()
            .map(|row| {
                let record_id: String = row
                    .try_get("record_id")
                    .map_err(|e| store_error("Bad record_id", e))?;
                let attributes: Json<Attributes> = row
                    .try_get("attributes")
                    .map_err(|e| store_error("Bad attributes", e))?;
                let distance: f64 = row
                    .try_get("distance")
                    .map_err(|e| store_error("Bad distance", e))?;
                Ok(Neighbor {
                    record_id,
                    distance: distance as f32,
                    attributes: attributes.0,
                })
            })
            .collect()
    }
}

// ============================================================================
// PgRecordSource
// ============================================================================

/// Reads index records from a PostgreSQL table or view.
///
/// Rows are converted with `to_jsonb`, then mapped like any JSON record.
pub struct PgRecordSource {
    pool: PgPool,
    table: String,
    mapping: RecordMapping,
}

impl PgRecordSource {
    /// Create a source over `table`.
    pub fn new(pool: PgPool, table: impl Into<String>, mapping: RecordMapping) -> Self {
        Self {
            pool,
            table: table.into(),
            mapping,
        }
    }
}

#[async_trait]
impl RecordSource for PgRecordSource {
    async fn fetch_all(&self) -> Result<Vec<EmbeddableRecord>> {
        let table = quote_ident(&self.table)?;
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| Error::source_error(format!("Failed to acquire connection: {e}")))?;

        let rows: Vec<serde_json::Value> =
            sqlx::query_scalar(&format!("SELECT to_jsonb(t) FROM {table} t"))
                .fetch_all(&mut *conn)
                .await
                .map_err(|e| Error::source_error(format!("Failed to read {table}: {e}")))?;

        rows.iter()
            .map(|row| record_from_json(row, &self.mapping))
            .collect()
    }

    fn name(&self) -> String {
        format!("postgres:{}", self.table)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("products").unwrap(), "\"products\"");
        assert_eq!(quote_ident("EmbeddingLLM").unwrap(), "\"EmbeddingLLM\"");
        assert_eq!(quote_ident("_t1").unwrap(), "\"_t1\"");

        for bad in ["", "1abc", "a-b", "x\"; DROP TABLE y; --", "spaced name"] {
            assert!(quote_ident(bad).unwrap_err().is_validation(), "{bad}");
        }
        assert!(quote_ident(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_vector_literal() {
        assert_eq!(vector_literal(&[0.5, -1.0, 2.25]), "[0.5,-1,2.25]");
        assert_eq!(vector_literal(&[]), "[]");
    }

    #[test]
    fn test_sql_limit_saturates() {
        assert_eq!(sql_limit(1), 1);
        assert_eq!(sql_limit(100), 100);
        assert_eq!(sql_limit(i64::MAX as usize), i64::MAX);
        assert_eq!(sql_limit(usize::MAX), i64::MAX);
        assert!(sql_limit(usize::MAX) > 0);
    }

    #[test]
    fn test_sql_shapes() {
        let upsert = PgVectorStore::upsert_sql("\"products\"", "\"embedding_gemini\"");
        assert!(upsert.contains("ON CONFLICT (record_id) DO UPDATE"));
        assert!(upsert.contains("\"embedding_gemini\" = EXCLUDED.\"embedding_gemini\""));

        let nearest = PgVectorStore::nearest_sql("\"products\"", "\"embedding_gemini\"");
        assert!(nearest.contains("<=> $1::vector"));
        assert!(nearest.contains("ORDER BY distance, seq"));
    }

    // Integration tests (require a PostgreSQL server with pgvector, run manually)

    #[tokio::test]
    #[ignore]
    #[allow(clippy::expect_used)]
    async fn test_pg_round_trip() {
        use crate::types::EmbeddingRecord;

        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = connect(&url, 2).await.unwrap();
        let store = PgVectorStore::new(pool).with_column("embindex_it", EmbedderId::Mock, "Embedding");

        store
            .ensure_index("embindex_it", EmbedderId::Mock, 2)
            .await
            .unwrap();
        assert_eq!(
            store.dimension("embindex_it", EmbedderId::Mock).await.unwrap(),
            Some(2)
        );

        let entry = IndexEntry::new(
            EmbeddingRecord {
                record_id: "p1".to_string(),
                vector: vec![0.6, 0.8],
                embedder: EmbedderId::Mock,
            },
            Attributes::new(),
        );
        store.upsert("embindex_it", &entry).await.unwrap();

        let hits = store
            .nearest("embindex_it", &[0.6, 0.8], EmbedderId::Mock, 1)
            .await
            .unwrap();
        assert_eq!(hits[0].record_id, "p1");
        assert!(hits[0].distance.abs() < 1e-5);
    }
}
