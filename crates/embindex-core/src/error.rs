//! Error types for embindex operations.
//!
//! This module provides the common `Error` type and `Result<T>` alias used
//! across all embindex crates. The taxonomy mirrors how failures propagate:
//!
//! - [`Error::Embed`]: an embedder call failed. Recorded per record during a
//!   seed run, terminal during a query.
//! - [`Error::Store`]: vector store connectivity or constraint failure.
//! - [`Error::Validation`]: malformed request, rejected before any work.
//! - [`Error::Cancelled`]: the caller's cancellation signal fired.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of an embedder failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedErrorKind {
    /// Connection reset, timeout, or a gateway error. Safe to retry.
    Transient,
    /// Missing or rejected credentials.
    Auth,
    /// Provider quota exceeded.
    RateLimited,
    /// The provider rejected the input (e.g. empty text).
    InvalidInput,
    /// Any other provider-side failure, including malformed responses.
    Provider,
}

impl std::fmt::Display for EmbedErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Transient => "transient",
            Self::Auth => "auth",
            Self::RateLimited => "rate limited",
            Self::InvalidInput => "invalid input",
            Self::Provider => "provider",
        };
        f.write_str(s)
    }
}

/// Errors that can occur in embindex operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Embedder call failed.
    #[error("Embedding error ({kind}): {message}")]
    Embed {
        /// Failure classification.
        kind: EmbedErrorKind,
        /// Provider or transport message.
        message: String,
    },

    /// Vector store connectivity or constraint failure.
    #[error("Store error: {0}")]
    Store(String),

    /// Reading source records failed.
    #[error("Source error: {0}")]
    Source(String),

    /// Malformed request: bad `k`, unknown index, dimension mismatch.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The operation was cancelled by the caller.
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an embedder error of the given kind.
    pub fn embed(kind: EmbedErrorKind, msg: impl Into<String>) -> Self {
        Self::Embed {
            kind,
            message: msg.into(),
        }
    }

    /// Create a store error.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a record-source error.
    pub fn source_error(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a cancellation error.
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether retrying the same call may succeed.
    ///
    /// Only transient embedder failures qualify; everything else is
    /// deterministic at this layer.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Embed {
                kind: EmbedErrorKind::Transient,
                ..
            }
        )
    }

    /// Whether this is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Whether this is a cancellation error.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// The embedder failure kind, if this is an embedder error.
    pub fn embed_kind(&self) -> Option<EmbedErrorKind> {
        match self {
            Self::Embed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Result type alias using embindex's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_embed_errors_retry() {
        assert!(Error::embed(EmbedErrorKind::Transient, "reset").is_retryable());
        assert!(!Error::embed(EmbedErrorKind::RateLimited, "429").is_retryable());
        assert!(!Error::embed(EmbedErrorKind::Auth, "401").is_retryable());
        assert!(!Error::store("gone").is_retryable());
        assert!(!Error::validation("k").is_retryable());
    }

    #[test]
    fn test_display_includes_kind() {
        let err = Error::embed(EmbedErrorKind::InvalidInput, "empty text");
        assert_eq!(
            err.to_string(),
            "Embedding error (invalid input): empty text"
        );
    }

    #[test]
    fn test_inspectors() {
        assert!(Error::validation("bad").is_validation());
        assert!(Error::cancelled("stop").is_cancelled());
        assert_eq!(
            Error::embed(EmbedErrorKind::Auth, "x").embed_kind(),
            Some(EmbedErrorKind::Auth)
        );
        assert_eq!(Error::config("x").embed_kind(), None);
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&EmbedErrorKind::RateLimited).unwrap();
        assert_eq!(json, "\"rate_limited\"");
    }

    #[test]
    fn test_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
