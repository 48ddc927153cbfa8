//! CLI argument parsing and command definitions.
//!
//! Global flags cover configuration, verbosity, and output format; each
//! subcommand maps onto one index operation or a config helper.

use clap::{Parser, Subcommand};

// ============================================================================
// CLI argument types
// ============================================================================

/// Top-level CLI arguments for embindex.
#[derive(Parser, Debug)]
#[command(name = "embindex", author, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file.
    #[arg(short, long, env = "EMBINDEX_CONFIG", global = true)]
    pub config: Option<String>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Commands understood by embindex.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Embed every source record of an index and write the vectors.
    Seed {
        /// Index to seed. Seeds every configured index when omitted.
        index: Option<String>,
    },

    /// Find the records nearest to a query.
    Search {
        /// Index to search.
        index: String,

        /// Query text.
        query: String,

        /// Number of results (defaults to the index's configured limit).
        #[arg(short = 'k', long = "limit")]
        limit: Option<usize>,
    },

    /// Embed and store a single record.
    Add {
        /// Target index.
        index: String,

        /// Record id.
        #[arg(long)]
        id: String,

        /// Text to embed.
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,

        /// Read the text to embed from a file.
        #[arg(long)]
        file: Option<String>,

        /// Attribute stored with the record, as `key=value`. Repeatable.
        #[arg(long = "attr", value_name = "KEY=VALUE")]
        attrs: Vec<String>,
    },

    /// List configured indexes with their embedder and stored count.
    Indexes,

    /// Create the tables and columns every configured index needs.
    InitSchema,

    /// List the operations available to `call`.
    Ops,

    /// Invoke a named operation with JSON arguments.
    Call {
        /// Operation name (see `ops`).
        operation: String,

        /// Arguments as a JSON object.
        #[arg(long, default_value = "{}")]
        args: String,
    },

    /// Print version information.
    Version,

    /// Configuration operations.
    Config(ConfigCommand),
}

/// Config-specific subcommands.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    /// Config subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigAction,
}

/// Available config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path.
    Path,

    /// Print the effective configuration as TOML.
    Show,

    /// Check the configuration without running anything.
    Validate,

    /// Create a default configuration file.
    Init {
        /// Output file path (defaults to XDG config path).
        #[arg(short, long)]
        file: Option<String>,

        /// Overwrite existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Split a `key=value` attribute argument.
pub fn parse_attr(raw: &str) -> Option<(&str, &str)> {
    let (key, value) = raw.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value))
}

// ============================================================================
// Tests
// ============================================================================
