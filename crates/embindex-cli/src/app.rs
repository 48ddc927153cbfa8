//! EmbindexCli application.
//!
//! Loads configuration, builds the runtime on demand, and dispatches each
//! command to the index manager or the operation registry.

use crate::cli::{CliArgs, Command, parse_attr};
use crate::config::EmbindexConfig;
use crate::config_handlers;
use crate::registry::{OperationInfo, OperationRegistry};
use crate::runtime::Runtime;
use embindex_core::{Error, Result};
use embindex_vector::{
    CancellationToken, EmbeddableRecord, IndexDescription, SearchOutcome, SeedSummary,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// ============================================================================
// EmbindexCli
// ============================================================================

/// The embindex command-line application.
pub struct EmbindexCli {
    name: String,
    config: Arc<EmbindexConfig>,
    version: String,
    registry: OperationRegistry,
}

impl EmbindexCli {
    /// Create from CLI args, loading config from file/env.
    pub fn from_args(name: impl Into<String>, args: &CliArgs) -> Result<Self> {
        let config = EmbindexConfig::load(args.config.as_deref())?;
        Ok(Self::new(name, config))
    }

    /// Create a new CLI application.
    pub fn new(name: impl Into<String>, config: EmbindexConfig) -> Self {
        Self {
            name: name.into(),
            config: Arc::new(config),
            version: env!("CARGO_PKG_VERSION").to_string(),
            registry: OperationRegistry::new(),
        }
    }

    /// Override the version string.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// The loaded configuration.
    pub fn config(&self) -> &EmbindexConfig {
        &self.config
    }

    /// Initialise tracing-based logging.
    ///
    /// Uses `RUST_LOG` env var if set, otherwise defaults based on verbosity flags.
    pub fn init_logging(&self, verbose: bool, quiet: bool) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if quiet {
            EnvFilter::new("warn")
        } else if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        };

        // Ignore error if a subscriber is already set (e.g. in tests).
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// Run the CLI with the given arguments.
    pub async fn run(&self, args: CliArgs) -> Result<()> {
        self.init_logging(args.verbose, args.quiet);
        let json = args.json;

        match args.command {
            Some(Command::Version) => {
                println!("{} {}", self.name, self.version);
                Ok(())
            }
            Some(Command::Config(config_cmd)) => {
                config_handlers::handle_config_command(args.config.as_deref(), config_cmd.command)
            }
            Some(Command::Ops) => {
                print_ops(&self.registry.list(), json);
                Ok(())
            }
            Some(command) => self.run_with_runtime(command, json).await,
            None => {
                println!("{} {}: use --help for usage", self.name, self.version);
                Ok(())
            }
        }
    }

    /// Commands that need embedders, a store, and sources.
    async fn run_with_runtime(&self, command: Command, json: bool) -> Result<()> {
        let runtime = Runtime::build(&self.config).await?;
        let mutates = !matches!(command, Command::Search { .. } | Command::Indexes);
        tracing::debug!(?command, "dispatching");
        let cancel = CancellationToken::new();
        let watcher = spawn_ctrl_c_watcher(cancel.clone());

        let result = self.dispatch(&runtime, command, json, &cancel).await;
        watcher.abort();

        // Batches written before a failure or cancellation stay written.
        if mutates {
            runtime.persist().await?;
        }
        result
    }

    async fn dispatch(
        &self,
        runtime: &Runtime,
        command: Command,
        json: bool,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let manager = runtime.manager();
        match command {
            Command::Seed { index } => {
                let targets: Vec<String> = match index {
                    Some(name) => vec![name],
                    None => manager.index_names().into_iter().map(String::from).collect(),
                };
                if targets.is_empty() {
                    return Err(Error::config("no indexes are configured"));
                }
                for target in targets {
                    let summary = manager.seed(&target, cancel).await?;
                    print_summary(&summary, json)?;
                }
                Ok(())
            }
            Command::Search {
                index,
                query,
                limit,
            } => {
                let outcome = manager.search(&index, &query, limit, cancel).await?;
                print_outcome(&outcome, json)
            }
            Command::Add {
                index,
                id,
                text,
                file,
                attrs,
            } => {
                let text = match (text, file) {
                    (Some(text), _) => text,
                    (None, Some(path)) => tokio::fs::read_to_string(&path).await?,
                    (None, None) => {
                        return Err(Error::validation("either --text or --file is required"));
                    }
                };
                let record = build_record(id, text, &attrs)?;
                tokio::select! {
                    _ = cancel.cancelled() => return Err(Error::cancelled("add cancelled")),
                    result = manager.index_record(&index, &record) => result?,
                }
                if json {
                    print_json(&serde_json::json!({ "index": index, "record_id": record.id }))?;
                } else {
                    println!("Indexed '{}' into '{index}'", record.id);
                }
                Ok(())
            }
            Command::Indexes => {
                let descriptions = manager.describe().await?;
                print_indexes(&descriptions, json)
            }
            Command::InitSchema => {
                manager.init_schema().await?;
                if !json {
                    println!(
                        "Schema ready for {} indexes on the {} store",
                        manager.index_names().len(),
                        manager.store().name()
                    );
                }
                Ok(())
            }
            Command::Call { operation, args } => {
                let args: Value = serde_json::from_str(&args)
                    .map_err(|e| Error::validation(format!("--args is not valid JSON: {e}")))?;
                let value = self.registry.call(&operation, manager, args, cancel).await?;
                print_json(&value)
            }
            Command::Version | Command::Config(_) | Command::Ops => Ok(()),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn spawn_ctrl_c_watcher(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupt received, cancelling");
            cancel.cancel();
        }
    })
}

/// Build a record from `--attr key=value` arguments. Values that parse as
/// JSON keep their type; anything else is stored as a string.
fn build_record(id: String, text: String, attrs: &[String]) -> Result<EmbeddableRecord> {
    let mut record = EmbeddableRecord::new(id, text);
    for raw in attrs {
        let (key, value) = parse_attr(raw)
            .ok_or_else(|| Error::validation(format!("attribute '{raw}' is not key=value")))?;
        let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
        record = record.with_attribute(key, value);
    }
    Ok(record)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_summary(summary: &SeedSummary, json: bool) -> Result<()> {
    if json {
        return print_json(summary);
    }
    println!(
        "{}: {} attempted, {} succeeded, {} failed ({} ms, embedder {})",
        summary.index,
        summary.attempted,
        summary.succeeded,
        summary.failed.len(),
        summary.duration_ms,
        summary.embedder
    );
    for failure in &summary.failed {
        println!("  {}: {}", failure.record_id, failure.reason);
    }
    Ok(())
}

fn print_outcome(outcome: &SearchOutcome, json: bool) -> Result<()> {
    if json {
        return print_json(outcome);
    }
    match outcome {
        SearchOutcome::NoMatches { message } => println!("{message}"),
        SearchOutcome::Matches { results } => {
            for (rank, result) in results.iter().enumerate() {
                let attrs = serde_json::to_string(&result.attributes)?;
                println!(
                    "{:>3}. {:<16} {:.4}  {attrs}",
                    rank + 1,
                    result.record_id,
                    result.distance
                );
            }
        }
    }
    Ok(())
}

fn print_indexes(descriptions: &[IndexDescription], json: bool) -> Result<()> {
    if json {
        return print_json(descriptions);
    }
    if descriptions.is_empty() {
        println!("No indexes configured");
        return Ok(());
    }
    for d in descriptions {
        println!(
            "{}  embedder={} model={} dim={} stored={} k={} source={}",
            d.name, d.embedder, d.model, d.dimension, d.stored, d.default_limit, d.source
        );
    }
    Ok(())
}

fn print_ops(ops: &[OperationInfo], json: bool) {
    if json {
        if let Ok(text) = serde_json::to_string_pretty(ops) {
            println!("{text}");
        }
        return;
    }
    for op in ops {
        println!("{:<14} {}", op.name, op.description);
    }
}

// ============================================================================
// Tests
// ============================================================================
