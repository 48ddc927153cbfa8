//! Record sources for the seed pipeline.
//!
//! A [`RecordSource`] yields a snapshot of every [`EmbeddableRecord`] that
//! belongs to an index. Sources are read-only to the manager.
//!
//! - [`MemorySource`]: a fixed list, for tests and single-record calls
//! - [`JsonFileSource`]: a JSON array of objects on disk
//! - `PgRecordSource`: rows of a PostgreSQL table (feature: `store-postgres`)

use async_trait::async_trait;
use embindex_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::types::{Attributes, EmbeddableRecord};

/// Something that can produce the records of an index.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Read all records.
    async fn fetch_all(&self) -> Result<Vec<EmbeddableRecord>>;

    /// Short name for diagnostics.
    fn name(&self) -> String;
}

/// How JSON objects map onto records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordMapping {
    /// Field holding the record id.
    pub id_field: String,

    /// Field holding the text to embed.
    pub text_field: String,

    /// Fields copied into the result attributes. When `None`, every field
    /// except the id and text is kept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_fields: Option<Vec<String>>,
}

impl Default for RecordMapping {
    fn default() -> Self {
        Self {
            id_field: "id".to_string(),
            text_field: "text".to_string(),
            attribute_fields: None,
        }
    }
}

impl RecordMapping {
    /// Create a mapping with explicit id and text fields.
    pub fn new(id_field: impl Into<String>, text_field: impl Into<String>) -> Self {
        Self {
            id_field: id_field.into(),
            text_field: text_field.into(),
            attribute_fields: None,
        }
    }

    /// Restrict the copied attributes.
    pub fn with_attributes<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attribute_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }
}

/// Convert one JSON object into a record.
///
/// Numeric ids are stringified. A missing or non-string text field yields a
/// record without text, which the seed pipeline reports as a failure.
pub fn record_from_json(value: &serde_json::Value, mapping: &RecordMapping) -> Result<EmbeddableRecord> {
    let object = value
        .as_object()
        .ok_or_else(|| Error::source_error("expected a JSON object per record"))?;

    let id = match object.get(&mapping.id_field) {
        Some(serde_json::Value::String(s)) if !s.is_empty() => s.clone(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => {
            return Err(Error::source_error(format!(
                "record is missing id field '{}'",
                mapping.id_field
            )));
        }
    };

    let text = object
        .get(&mapping.text_field)
        .and_then(|v| v.as_str())
        .map(str::to_string);

    let attributes: Attributes = match &mapping.attribute_fields {
        Some(fields) => fields
            .iter()
            .filter_map(|f| object.get(f).map(|v| (f.clone(), v.clone())))
            .collect(),
        None => object
            .iter()
            .filter(|(k, _)| **k != mapping.id_field && **k != mapping.text_field)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    };

    Ok(EmbeddableRecord {
        id,
        text,
        attributes,
    })
}

// ============================================================================
// MemorySource
// ============================================================================

/// A source backed by a fixed list of records.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: Vec<EmbeddableRecord>,
}

impl MemorySource {
    /// Create a source over `records`.
    pub fn new(records: Vec<EmbeddableRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    async fn fetch_all(&self) -> Result<Vec<EmbeddableRecord>> {
        Ok(self.records.clone())
    }

    fn name(&self) -> String {
        format!("memory({} records)", self.records.len())
    }
}

// ============================================================================
// JsonFileSource
// ============================================================================

/// A source reading a JSON array of objects from a file.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
    mapping: RecordMapping,
}

impl JsonFileSource {
    /// Create a source for `path` with the given field mapping.
    pub fn new(path: impl Into<PathBuf>, mapping: RecordMapping) -> Self {
        Self {
            path: path.into(),
            mapping,
        }
    }

    /// The file this source reads.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecordSource for JsonFileSource {
    async fn fetch_all(&self) -> Result<Vec<EmbeddableRecord>> {
        let json = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            Error::source_error(format!("failed to read {}: {e}", self.path.display()))
        })?;
        let values: Vec<serde_json::Value> = serde_json::from_str(&json).map_err(|e| {
            Error::source_error(format!("{} is not a JSON array: {e}", self.path.display()))
        })?;

        let records = values
            .iter()
            .map(|v| record_from_json(v, &self.mapping))
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "Read {} records from {}",
            records.len(),
            self.path.display()
        );
        Ok(records)
    }

    fn name(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    // ------------------------------------------------------------------------
    // record_from_json tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_record_from_json_defaults() {
        let value = json!({"id": "p1", "text": "red shoe", "price": 19.9, "name": "Shoe"});
        let record = record_from_json(&value, &RecordMapping::default()).unwrap();

        assert_eq!(record.id, "p1");
        assert_eq!(record.text.as_deref(), Some("red shoe"));
        assert_eq!(record.attributes.len(), 2);
        assert_eq!(record.attributes["name"], "Shoe");
    }

    #[test]
    fn test_record_from_json_numeric_id_and_selected_attributes() {
        let mapping = RecordMapping::new("ProductId", "Description").with_attributes(["Name"]);
        let value = json!({"ProductId": 42, "Description": "x", "Name": "N", "Secret": 1});
        let record = record_from_json(&value, &mapping).unwrap();

        assert_eq!(record.id, "42");
        assert_eq!(record.attributes.keys().collect::<Vec<_>>(), vec!["Name"]);
    }

    #[test]
    fn test_record_from_json_null_text() {
        let value = json!({"id": "c1", "text": null});
        let record = record_from_json(&value, &RecordMapping::default()).unwrap();
        assert!(record.text.is_none());
        assert!(record.embeddable_text().is_none());
    }

    #[test]
    fn test_record_from_json_missing_id() {
        let err = record_from_json(&json!({"text": "x"}), &RecordMapping::default()).unwrap_err();
        assert!(matches!(err, Error::Source(_)));

        let err = record_from_json(&json!(["not", "an", "object"]), &RecordMapping::default())
            .unwrap_err();
        assert!(matches!(err, Error::Source(_)));
    }

    // ------------------------------------------------------------------------
    // Source tests
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_memory_source() {
        let source = MemorySource::new(vec![EmbeddableRecord::new("a", "alpha")]);
        assert_eq!(source.fetch_all().await.unwrap().len(), 1);
        assert_eq!(source.name(), "memory(1 records)");
    }

    #[tokio::test]
    async fn test_json_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clubs.json");
        std::fs::write(
            &path,
            r#"[
                {"id": "1", "text": "Founded in 1910", "name": "Corinthians"},
                {"id": "2", "text": "", "name": "Empty"}
            ]"#,
        )
        .unwrap();

        let source = JsonFileSource::new(&path, RecordMapping::default());
        let records = source.fetch_all().await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].attributes["name"], "Corinthians");
        assert!(records[1].embeddable_text().is_none());
        assert!(source.name().starts_with("file:"));
    }

    #[tokio::test]
    async fn test_json_file_source_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = JsonFileSource::new(dir.path().join("missing.json"), RecordMapping::default());
        assert!(matches!(missing.fetch_all().await.unwrap_err(), Error::Source(_)));

        let path = dir.path().join("object.json");
        std::fs::write(&path, r#"{"id": "1"}"#).unwrap();
        let not_array = JsonFileSource::new(&path, RecordMapping::default());
        assert!(matches!(not_array.fetch_all().await.unwrap_err(), Error::Source(_)));
    }
}
