//! Store error types

use thiserror::Error;

use crate::task::TaskId;

/// Errors from task storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Task not found: {0}")]
    NotFound(TaskId),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid persisted task data: {0}")]
    InvalidData(String),
}

/// Result of a storage operation
pub type StoreResult<T> = Result<T, StoreError>;
