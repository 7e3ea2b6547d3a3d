//! Task manager messages
//!
//! Commands and responses for the actor pattern.

use taskstore::{StoreError, Task, TaskId, TaskQuery};
use thiserror::Error;
use tokio::sync::oneshot;

/// Errors from task state operations
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Task not found: {0}")]
    NotFound(TaskId),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Channel error")]
    ChannelError,
}

impl From<StoreError> for StateError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => Self::NotFound(id),
            other => Self::StoreError(other.to_string()),
        }
    }
}

/// Response from task state operations
pub type StateResponse<T> = Result<T, StateError>;

/// Commands sent to the TaskManager actor
#[derive(Debug)]
pub enum StateCommand {
    Query {
        query: TaskQuery,
        reply: oneshot::Sender<StateResponse<Vec<Task>>>,
    },
    Get {
        id: TaskId,
        reply: oneshot::Sender<StateResponse<Option<Task>>>,
    },
    Insert {
        task: Task,
        reply: oneshot::Sender<StateResponse<TaskId>>,
    },
    Update {
        task: Task,
        reply: oneshot::Sender<StateResponse<()>>,
    },
    Delete {
        id: TaskId,
        reply: oneshot::Sender<StateResponse<bool>>,
    },
    DeleteCompleted {
        reply: oneshot::Sender<StateResponse<usize>>,
    },

    // Shutdown
    Shutdown,
}
