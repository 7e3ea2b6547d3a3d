//! In-memory task storage

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::query::TaskQuery;
use crate::repository::TaskRepository;
use crate::seed::seed_tasks;
use crate::task::{Task, TaskId};

/// Process-local store with the same semantics as [`crate::SqliteStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    tasks: BTreeMap<TaskId, Task>,
    last_id: TaskId,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the example tasks
    pub fn seeded() -> Self {
        let mut store = Self::new();
        for task in seed_tasks() {
            store.assign_and_insert(task);
        }
        debug!(count = store.tasks.len(), "MemoryStore::seeded: inserted example tasks");
        store
    }

    /// Number of stored tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the store holds no tasks
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn assign_and_insert(&mut self, mut task: Task) -> TaskId {
        if task.is_unsaved() {
            self.last_id += 1;
            task.id = self.last_id;
        } else {
            self.last_id = self.last_id.max(task.id);
        }
        let id = task.id;
        self.tasks.insert(id, task);
        id
    }
}

impl TaskRepository for MemoryStore {
    fn query(&self, query: &TaskQuery) -> StoreResult<Vec<Task>> {
        Ok(query.apply(self.tasks.values()))
    }

    fn get(&self, id: TaskId) -> StoreResult<Option<Task>> {
        Ok(self.tasks.get(&id).cloned())
    }

    fn insert(&mut self, task: &Task) -> StoreResult<TaskId> {
        let id = self.assign_and_insert(task.clone());
        debug!(id, "MemoryStore::insert: stored");
        Ok(id)
    }

    fn update(&mut self, task: &Task) -> StoreResult<()> {
        match self.tasks.get_mut(&task.id) {
            Some(stored) => {
                *stored = task.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(task.id)),
        }
    }

    fn delete(&mut self, id: TaskId) -> StoreResult<bool> {
        Ok(self.tasks.remove(&id).is_some())
    }

    fn delete_completed(&mut self) -> StoreResult<usize> {
        let before = self.tasks.len();
        self.tasks.retain(|_, task| !task.completed);
        Ok(before - self.tasks.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SortOrder;

    #[test]
    fn test_insert_assigns_increasing_ids() {
        let mut store = MemoryStore::new();
        let a = store.insert(&Task::new("a")).unwrap();
        let b = store.insert(&Task::new("b")).unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 2);
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let mut store = MemoryStore::new();
        let a = store.insert(&Task::new("a")).unwrap();
        assert!(store.delete(a).unwrap());
        let b = store.insert(&Task::new("b")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_insert_same_id_twice_keeps_latest() {
        let mut store = MemoryStore::new();
        let mut task = Task::new("first");
        task.id = 7;
        store.insert(&task).unwrap();
        task.name = "second".to_string();
        store.insert(&task).unwrap();
        store.insert(&task).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(7).unwrap().unwrap().name, "second");
        // explicit ids advance the counter
        assert_eq!(store.insert(&Task::new("next")).unwrap(), 8);
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let mut store = MemoryStore::new();
        let mut task = Task::new("ghost");
        task.id = 42;
        assert!(matches!(store.update(&task), Err(StoreError::NotFound(42))));
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let mut store = MemoryStore::new();
        assert!(!store.delete(99).unwrap());
    }

    #[test]
    fn test_delete_completed() {
        let mut store = MemoryStore::seeded();
        let removed = store.delete_completed().unwrap();
        assert_eq!(removed, 2);
        let all = store.query(&TaskQuery::default()).unwrap();
        assert!(all.iter().all(|t| !t.completed));
    }

    #[test]
    fn test_seeded_query_order() {
        let store = MemoryStore::seeded();
        let tasks = store.query(&TaskQuery::new("", SortOrder::ByDate, false)).unwrap();
        assert_eq!(tasks.len(), 8);
        assert_eq!(tasks[0].name, "Buy groceries");
        assert_eq!(tasks[1].name, "Wash the dishes");
    }
}
