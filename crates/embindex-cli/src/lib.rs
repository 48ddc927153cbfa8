//! Command-line front end for embindex.
//!
//! Loads an immutable, validated [`EmbindexConfig`], builds the embedders,
//! vector store, and record sources it names, and exposes the seed and query
//! pipelines as subcommands and as named operations.
//!
//! # Key Abstractions
//!
//! - [`EmbindexCli`]: the application, dispatching parsed [`CliArgs`]
//! - [`OperationRegistry`]: fixed table of named operations for `call`
//! - [`Runtime`]: a ready index manager plus snapshot persistence

pub mod app;
pub mod cli;
pub mod config;
pub mod config_handlers;
pub mod registry;
pub mod runtime;

pub use app::EmbindexCli;
pub use cli::{CliArgs, Command, ConfigAction, ConfigCommand};
pub use config::{
    DatabaseConfig, EmbedderSettings, EmbindexConfig, IndexConfig, SearchConfig, SourceConfig,
    StoreBackend, StoreConfig,
};
pub use registry::{Operation, OperationInfo, OperationRegistry};
pub use runtime::Runtime;
