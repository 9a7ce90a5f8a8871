//! Application error taxonomy.
//!
//! Validation fails fast at the form or decode boundary, before any store
//! is touched. `BackendUnavailable` is internal: the failover layer catches
//! it and retries against the fallback cache, so callers only ever see
//! `PersistenceFailure` when both stores are down.

use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid amount, category, or date at the form or decode boundary.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("authentication required")]
    Unauthorized,

    #[error("admin role required")]
    Forbidden,

    /// The primary store could not be reached or returned a server error.
    /// Masked by the failover layer; never surfaced on its own.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Both the primary store and the fallback cache failed.
    #[error("persistence failure: primary: {primary}; fallback: {fallback}")]
    PersistenceFailure { primary: String, fallback: String },
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        AppError::BackendUnavailable(message.into())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::BackendUnavailable(err.to_string())
    }
}
