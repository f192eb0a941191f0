//! Edit session error types.

use thiserror::Error;

use watchgrid_model::ModelError;

/// Errors that can occur while editing and persisting watchers.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no watcher is being edited")]
    NoActiveSession,

    #[error("watcher {0} is already being edited")]
    SessionInProgress(String),

    #[error("watcher not found: {0}")]
    NotFound(String),

    #[error("policy {0} is not a metric-based policy")]
    NotMetricPolicy(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("configuration endpoint error: {0}")]
    Endpoint(#[from] anyhow::Error),
}

pub type SessionResult<T> = Result<T, SessionError>;
