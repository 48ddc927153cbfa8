//! Handler functions for config CLI commands.
//!
//! Implements `embindex config {path,show,validate,init}`.

use crate::cli::ConfigAction;
use crate::config::{EmbindexConfig, IndexConfig, SourceConfig};
use embindex_core::{Error, Result};
use embindex_vector::{EmbedderId, RecordMapping};
use std::path::{Path, PathBuf};

// ============================================================================
// Command dispatch
// ============================================================================

/// Handle a config subcommand.
///
/// Receives the raw `--config` path (not a loaded config) because some
/// commands (path, init) work before a config file exists.
pub fn handle_config_command(config_path: Option<&str>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => cmd_config_path(config_path),
        ConfigAction::Show => {
            let config = EmbindexConfig::load(config_path)?;
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
        ConfigAction::Validate => {
            let config = EmbindexConfig::load(config_path)?;
            config.validate()?;
            println!(
                "Configuration OK: {} embedders, {} indexes",
                config.embedders.len(),
                config.indexes.len()
            );
            Ok(())
        }
        ConfigAction::Init { file, force } => {
            let path = cmd_config_init(file.as_deref(), force)?;
            println!("Config file created at {}", path.display());
            Ok(())
        }
    }
}

// ============================================================================
// Command handlers
// ============================================================================

/// Show the resolved config file path.
fn cmd_config_path(config_path: Option<&str>) -> Result<()> {
    match EmbindexConfig::resolve_config_path(config_path) {
        Some(path) => {
            println!("{}", path.display());
            if !path.exists() {
                eprintln!("(file does not exist; run `embindex config init` to create it)");
            }
            Ok(())
        }
        None => Err(Error::config(
            "Could not determine config directory for this platform",
        )),
    }
}

/// Create a starter configuration file and return where it was written.
pub fn cmd_config_init(file: Option<&str>, force: bool) -> Result<PathBuf> {
    let path = match file {
        Some(p) => PathBuf::from(p),
        None => EmbindexConfig::default_config_path()
            .ok_or_else(|| Error::config("Could not determine config directory"))?,
    };

    if path.exists() && !force {
        return Err(Error::config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    std::fs::write(&path, starter_config(&path)?)?;
    Ok(path)
}

/// Default config with one example index reading `records.json` next to it.
fn starter_config(path: &Path) -> Result<String> {
    let data = path
        .parent()
        .map(|p| p.join("records.json"))
        .unwrap_or_else(|| PathBuf::from("records.json"));

    let mut config = EmbindexConfig::default();
    config.indexes.push(IndexConfig {
        name: "records".to_string(),
        embedder: EmbedderId::Mock,
        column: None,
        default_limit: None,
        max_text_chars: None,
        source: SourceConfig::Json {
            path: data.to_string_lossy().into_owned(),
            mapping: RecordMapping::default(),
        },
    });
    config.to_toml_string()
}

// ============================================================================
// Tests
// ============================================================================
