//! Named operations over an [`IndexManager`].
//!
//! The registry is built once at startup from a fixed table. Each entry has
//! a name, a description, a JSON schema for its arguments, and a handler
//! that decodes the arguments and drives the manager.

use embindex_core::{Error, Result};
use embindex_vector::{CancellationToken, EmbeddableRecord, IndexManager};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

/// Future returned by an operation handler.
pub type OperationFuture<'a> = Pin<Box<dyn Future<Output = Result<Value>> + Send + 'a>>;

/// Operation handler: manager, JSON arguments, cancellation token.
pub type OperationHandler =
    for<'a> fn(&'a IndexManager, Value, &'a CancellationToken) -> OperationFuture<'a>;

/// One registered operation.
#[derive(Clone)]
pub struct Operation {
    /// Unique name used by `call`.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// JSON schema of the arguments.
    pub schema: Value,
    handler: OperationHandler,
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Listing entry for an operation.
#[derive(Debug, Clone, Serialize)]
pub struct OperationInfo {
    /// Operation name.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// JSON schema of the arguments.
    pub schema: Value,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_operation(
    name: &'static str,
    description: &'static str,
    schema: Value,
    handler: OperationHandler,
) -> Operation {
    Operation {
        name,
        description,
        schema,
        handler,
    }
}

fn parse_args<T: for<'de> Deserialize<'de>>(operation: &str, args: Value) -> Result<T> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args)
        .map_err(|e| Error::validation(format!("invalid arguments for '{operation}': {e}")))
}

// ---------------------------------------------------------------------------
// Argument types
// ---------------------------------------------------------------------------

/// Arguments for `seed_index`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedIndexArgs {
    /// Index to seed.
    pub index: String,
}

/// Arguments for `search_index`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchIndexArgs {
    /// Index to search.
    pub index: String,
    /// Query text.
    pub query: String,
    /// Number of results.
    #[serde(default)]
    pub k: Option<usize>,
}

/// Arguments for `index_record`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexRecordArgs {
    /// Target index.
    pub index: String,
    /// Record to embed and store.
    pub record: EmbeddableRecord,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn seed_index<'a>(
    manager: &'a IndexManager,
    args: Value,
    cancel: &'a CancellationToken,
) -> OperationFuture<'a> {
    Box::pin(async move {
        let args: SeedIndexArgs = parse_args("seed_index", args)?;
        let summary = manager.seed(&args.index, cancel).await?;
        Ok(serde_json::to_value(summary)?)
    })
}

fn search_index<'a>(
    manager: &'a IndexManager,
    args: Value,
    cancel: &'a CancellationToken,
) -> OperationFuture<'a> {
    Box::pin(async move {
        let args: SearchIndexArgs = parse_args("search_index", args)?;
        let outcome = manager
            .search(&args.index, &args.query, args.k, cancel)
            .await?;
        Ok(serde_json::to_value(outcome)?)
    })
}

fn index_record<'a>(
    manager: &'a IndexManager,
    args: Value,
    cancel: &'a CancellationToken,
) -> OperationFuture<'a> {
    Box::pin(async move {
        let args: IndexRecordArgs = parse_args("index_record", args)?;
        tokio::select! {
            _ = cancel.cancelled() => Err(Error::cancelled("index_record cancelled")),
            result = manager.index_record(&args.index, &args.record) => {
                result?;
                Ok(json!({ "index": args.index, "record_id": args.record.id }))
            }
        }
    })
}

fn list_indexes<'a>(
    manager: &'a IndexManager,
    args: Value,
    _cancel: &'a CancellationToken,
) -> OperationFuture<'a> {
    Box::pin(async move {
        let _: BTreeMap<String, Value> = parse_args("list_indexes", args)?;
        let descriptions = manager.describe().await?;
        Ok(serde_json::to_value(descriptions)?)
    })
}

// ---------------------------------------------------------------------------
// OperationRegistry
// ---------------------------------------------------------------------------

/// Fixed table of named operations.
#[derive(Debug, Clone)]
pub struct OperationRegistry {
    operations: BTreeMap<&'static str, Operation>,
}

impl Default for OperationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationRegistry {
    /// Build the registry with every built-in operation.
    pub fn new() -> Self {
        let operations = [
            make_operation(
                "seed_index",
                "Embed every source record of an index and bulk-write the vectors",
                json!({
                    "type": "object",
                    "properties": {
                        "index": { "type": "string", "description": "Index to seed" }
                    },
                    "required": ["index"]
                }),
                seed_index,
            ),
            make_operation(
                "search_index",
                "Return the records nearest to a query by cosine distance",
                json!({
                    "type": "object",
                    "properties": {
                        "index": { "type": "string", "description": "Index to search" },
                        "query": { "type": "string", "description": "Query text" },
                        "k": { "type": "integer", "minimum": 1, "description": "Number of results" }
                    },
                    "required": ["index", "query"]
                }),
                search_index,
            ),
            make_operation(
                "index_record",
                "Embed one record and upsert it into an index",
                json!({
                    "type": "object",
                    "properties": {
                        "index": { "type": "string" },
                        "record": {
                            "type": "object",
                            "properties": {
                                "id": { "type": "string" },
                                "text": { "type": "string" },
                                "attributes": { "type": "object" }
                            },
                            "required": ["id"]
                        }
                    },
                    "required": ["index", "record"]
                }),
                index_record,
            ),
            make_operation(
                "list_indexes",
                "Describe every configured index",
                json!({ "type": "object", "properties": {} }),
                list_indexes,
            ),
        ];

        Self {
            operations: operations.into_iter().map(|op| (op.name, op)).collect(),
        }
    }

    /// Number of registered operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    /// Operations in name order.
    pub fn list(&self) -> Vec<OperationInfo> {
        self.operations
            .values()
            .map(|op| OperationInfo {
                name: op.name,
                description: op.description,
                schema: op.schema.clone(),
            })
            .collect()
    }

    /// Invoke an operation by name.
    pub async fn call(
        &self,
        name: &str,
        manager: &IndexManager,
        args: Value,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        let operation = self
            .operations
            .get(name)
            .ok_or_else(|| Error::validation(format!("unknown operation '{name}'")))?;
        log::debug!("calling operation {name}");
        (operation.handler)(manager, args, cancel).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use embindex_vector::{EmbedderId, IndexSpec, MemorySource, MemoryVectorStore, MockEmbedder};
    use std::sync::Arc;

    fn manager() -> IndexManager {
        let records = vec![
            EmbeddableRecord::new("1", "red running shoe").with_attribute("name", "Racer"),
            EmbeddableRecord::new("2", "blue denim jacket").with_attribute("name", "Denim"),
            EmbeddableRecord::new("3", "green wool scarf").with_attribute("name", "Scarf"),
        ];
        IndexManager::builder()
            .embedder(Arc::new(MockEmbedder::new(16)))
            .store(Arc::new(MemoryVectorStore::new()))
            .index(
                IndexSpec::new("products", EmbedderId::Mock),
                Arc::new(MemorySource::new(records)),
            )
            .build()
            .unwrap()
    }

    // ------------------------------------------------------------------------
    // Registry shape
    // ------------------------------------------------------------------------

    #[test]
    fn test_registry_lists_builtin_operations() {
        let registry = OperationRegistry::new();
        assert_eq!(registry.len(), 4);
        assert!(!registry.is_empty());

        let names: Vec<_> = registry.list().iter().map(|op| op.name).collect();
        assert_eq!(
            names,
            vec!["index_record", "list_indexes", "search_index", "seed_index"]
        );
        for op in registry.list() {
            assert_eq!(op.schema["type"], "object");
            assert!(!op.description.is_empty());
        }
    }

    // ------------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_call_unknown_operation() {
        let registry = OperationRegistry::new();
        let manager = manager();
        let err = registry
            .call("drop_index", &manager, json!({}), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("drop_index"));
    }

    #[tokio::test]
    async fn test_call_bad_arguments() {
        let registry = OperationRegistry::new();
        let manager = manager();
        let err = registry
            .call(
                "search_index",
                &manager,
                json!({ "index": "products" }),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_seed_then_search() {
        let registry = OperationRegistry::new();
        let manager = manager();
        let cancel = CancellationToken::new();
        manager.init_schema().await.unwrap();

        let summary = registry
            .call("seed_index", &manager, json!({ "index": "products" }), &cancel)
            .await
            .unwrap();
        assert_eq!(summary["attempted"], 3);
        assert_eq!(summary["succeeded"], 3);

        let outcome = registry
            .call(
                "search_index",
                &manager,
                json!({ "index": "products", "query": "red running shoe", "k": 1 }),
                &cancel,
            )
            .await
            .unwrap();
        assert_eq!(outcome["status"], "matches");
        assert_eq!(outcome["results"][0]["record_id"], "1");
    }

    #[tokio::test]
    async fn test_index_record_then_list() {
        let registry = OperationRegistry::new();
        let manager = manager();
        let cancel = CancellationToken::new();
        manager.init_schema().await.unwrap();

        let added = registry
            .call(
                "index_record",
                &manager,
                json!({
                    "index": "products",
                    "record": { "id": "9", "text": "yellow rain coat" }
                }),
                &cancel,
            )
            .await
            .unwrap();
        assert_eq!(added["record_id"], "9");

        let listed = registry
            .call("list_indexes", &manager, Value::Null, &cancel)
            .await
            .unwrap();
        assert_eq!(listed[0]["name"], "products");
        assert_eq!(listed[0]["stored"], 1);
    }

    #[tokio::test]
    async fn test_search_cancelled() {
        let registry = OperationRegistry::new();
        let manager = manager();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = registry
            .call(
                "search_index",
                &manager,
                json!({ "index": "products", "query": "shoe" }),
                &cancel,
            )
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
