//! Storage contract shared by every backend

use crate::error::StoreResult;
use crate::query::TaskQuery;
use crate::task::{Task, TaskId};

/// Synchronous task storage
///
/// Implementations own their data exclusively; callers that need shared or
/// async access wrap a repository in an actor.
pub trait TaskRepository: Send {
    /// Tasks matching `query`, in query order
    fn query(&self, query: &TaskQuery) -> StoreResult<Vec<Task>>;

    /// Look up one task
    fn get(&self, id: TaskId) -> StoreResult<Option<Task>>;

    /// Insert or replace a task
    ///
    /// An unsaved task (id 0) gets a fresh id that is never handed out again.
    /// A task with an existing id replaces the stored record.
    fn insert(&mut self, task: &Task) -> StoreResult<TaskId>;

    /// Replace the full record for `task.id`
    ///
    /// Returns [`crate::StoreError::NotFound`] when no such task exists.
    fn update(&mut self, task: &Task) -> StoreResult<()>;

    /// Remove a task; returns false when it was already absent
    fn delete(&mut self, id: TaskId) -> StoreResult<bool>;

    /// Remove every completed task, returning how many were removed
    fn delete_completed(&mut self) -> StoreResult<usize>;
}
