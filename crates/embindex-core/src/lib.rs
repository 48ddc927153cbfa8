//! embindex Core: shared error types.
//!
//! This crate provides the foundational types used across all embindex
//! crates. It has no internal embindex dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error taxonomy and Result alias

pub mod error;

// Re-export key types at crate root for convenience
pub use error::{EmbedErrorKind, Error, Result};
