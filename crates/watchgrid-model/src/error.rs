//! Error types for the watcher configuration model.

use thiserror::Error;

/// Result type alias for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while decoding, encoding or validating watcher configuration.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("malformed operational range: {0}")]
    Format(String),

    #[error("unrecognized predicate type: {0}")]
    UnrecognizedVariant(String),

    #[error("unrecognized scriptlet language: {0}")]
    UnrecognizedLanguage(String),

    #[error("unknown comparison operator: {0}")]
    UnknownOperator(String),

    #[error("{0} scriptlet has no structured payload")]
    MissingStructuredPayload(String),

    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    #[error("invalid watcher: {0}")]
    Invalid(String),

    #[error("malformed JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}
