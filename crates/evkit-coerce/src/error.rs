//! Error types for coercion and for parsing coercion configuration.

use crate::options::TargetType;
use evkit_value::{Kind, PathError};
use thiserror::Error;

/// A value could not be converted to the requested type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoercionError {
    #[error("invalid {target} literal: {input:?}")]
    InvalidFormat { target: TargetType, input: String },
    #[error("unparseable timestamp {input:?}: {reason}")]
    UnparseableTimestamp { input: String, reason: &'static str },
    #[error("cannot coerce {found} to {target}")]
    TypeMismatch { found: Kind, target: TargetType },
}

/// The category of a [`CoercionError`], for callers that route on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoercionErrorKind {
    InvalidFormat,
    UnparseableTimestamp,
    TypeMismatch,
}

impl CoercionError {
    pub fn kind(&self) -> CoercionErrorKind {
        match self {
            CoercionError::InvalidFormat { .. } => CoercionErrorKind::InvalidFormat,
            CoercionError::UnparseableTimestamp { .. } => CoercionErrorKind::UnparseableTimestamp,
            CoercionError::TypeMismatch { .. } => CoercionErrorKind::TypeMismatch,
        }
    }

    pub(crate) fn unparseable(input: impl Into<String>, reason: &'static str) -> Self {
        CoercionError::UnparseableTimestamp {
            input: input.into(),
            reason,
        }
    }
}

/// A hinted field failed to coerce.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("field {path}: {source}")]
pub struct FieldCoercionError {
    pub path: String,
    #[source]
    pub source: CoercionError,
}

/// Textual coercion configuration (hints, zones, units) could not be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown type hint {0:?}")]
    UnknownType(String),
    #[error("a format is only valid for timestamp hints, got {0:?}")]
    UnexpectedFormat(String),
    #[error("empty timestamp format")]
    EmptyFormat,
    #[error("unknown time zone {0:?}")]
    UnknownTimeZone(String),
    #[error("unknown epoch unit {0:?}")]
    UnknownEpochUnit(String),
    #[error("invalid hint {0:?}: expected PATH=TYPE")]
    MalformedHint(String),
    #[error("invalid hint path: {0}")]
    Path(#[from] PathError),
}
