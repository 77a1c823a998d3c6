//! Diagnostic error types for the task manager.
//!
//! Store failures are defined here because both the assistant and every
//! backend produce them. Configuration and path errors live beside their
//! modules and are wrapped by [`TodoError`] so the binary can render any of
//! them through miette with codes and help text intact.

use miette::Diagnostic;
use thiserror::Error;

use crate::config::ConfigError;
use crate::paths::PathError;

/// Top-level error type.
#[derive(Debug, Error, Diagnostic)]
pub enum TodoError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Path(#[from] PathError),
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("task store request failed: {message}")]
    #[diagnostic(
        code(todo::store::request),
        help(
            "The task backend could not be reached. Check that it is running \
             and that `api_url` in the config (or TODO_API_URL) points at it."
        )
    )]
    Request { message: String },

    #[error("task store returned HTTP {status}: {message}")]
    #[diagnostic(
        code(todo::store::status),
        help("The backend rejected the request. Its response body is shown above.")
    )]
    Status { status: u16, message: String },

    #[error("unexpected response from task store: {message}")]
    #[diagnostic(
        code(todo::store::response),
        help("The backend answered with a payload this client does not understand. Version mismatch?")
    )]
    Response { message: String },

    #[error("task not found: {id}")]
    #[diagnostic(
        code(todo::store::not_found),
        help("The task may have been deleted already. Run `todo say show` to refresh the board.")
    )]
    NotFound { id: String },
}

impl StoreError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Request { .. })
    }
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Convenience alias for the top-level error.
pub type TodoResult<T> = std::result::Result<T, TodoError>;
