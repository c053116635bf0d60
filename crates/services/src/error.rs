//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::QuestionError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by a `QuestionProvider`.
///
/// Every variant ends a run in the `Failed` state.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    #[error("question generation is not configured")]
    Disabled,
    #[error("invalid question provider base url: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
    #[error("question provider request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("question provider returned malformed payload: {0}")]
    Malformed(String),
    #[error("question provider returned no questions")]
    Empty,
    #[error(transparent)]
    InvalidQuestion(#[from] QuestionError),
}

/// Errors emitted by the quiz session state machine and its lifecycle.
///
/// A call that returns one of these leaves the session untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("option index {0} is out of range")]
    InvalidOption(u8),
    #[error("session is not active")]
    NotActive,
    #[error("back navigation is only available in solo mode")]
    BackNavigationUnavailable,
    #[error("only a failed run can be retried")]
    RetryUnavailable,
    #[error("session has not finished")]
    NotFinished,
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}
