//! Error types for value decoding and traversal.

use crate::value::Kind;
use thiserror::Error;

/// Errors raised while decoding JSON into values or events.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed json: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("expected a JSON object at the event root, found {0}")]
    NotAnObject(Kind),
}

/// Errors raised while parsing or traversing a path into nested values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("path not found: {path}")]
    NotFound { path: String },
    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: Kind,
    },
    #[error("invalid path {path:?}: {reason}")]
    Invalid { path: String, reason: &'static str },
}

impl PathError {
    pub(crate) fn invalid(path: &str, reason: &'static str) -> Self {
        Self::Invalid {
            path: path.to_owned(),
            reason,
        }
    }
}
