//! Add/edit task screen logic

use taskstore::Task;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::state::{StateError, TaskManager};

/// Outcome reported back to the task list after a save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddEditResult {
    Added,
    Edited,
}

impl AddEditResult {
    /// Text for the saved-confirmation message
    pub fn confirmation_message(self) -> &'static str {
        match self {
            Self::Added => "Task added",
            Self::Edited => "Task updated",
        }
    }
}

/// One-shot events for the add/edit screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddEditTaskEvent {
    ShowInvalidInputMessage(String),
    NavigateBackWithResult(AddEditResult),
}

/// Input rejected before the store is touched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Name cannot be empty")]
    EmptyName,
}

#[derive(Debug, Error)]
pub enum EditError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    State(#[from] StateError),
}

/// Editable state for a new or existing task
pub struct AddEditTaskController {
    manager: TaskManager,
    task: Option<Task>,
    name: String,
    important: bool,
    events_tx: mpsc::Sender<AddEditTaskEvent>,
    events_rx: Option<mpsc::Receiver<AddEditTaskEvent>>,
}

impl AddEditTaskController {
    /// Editor for `task`, or for a new task when None
    pub fn new(manager: TaskManager, task: Option<Task>, event_capacity: usize) -> Self {
        debug!(task_id = task.as_ref().map(|t| t.id), "AddEditTaskController::new: called");
        let (events_tx, events_rx) = mpsc::channel(event_capacity.max(1));
        let name = task.as_ref().map(|t| t.name.clone()).unwrap_or_default();
        let important = task.as_ref().is_some_and(|t| t.important);
        Self {
            manager,
            task,
            name,
            important,
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    /// Task being edited, None for a new one
    pub fn task(&self) -> Option<&Task> {
        self.task.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn important(&self) -> bool {
        self.important
    }

    pub fn set_important(&mut self, important: bool) {
        self.important = important;
    }

    /// Receiver for one-shot events; only the first call gets it
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<AddEditTaskEvent>> {
        self.events_rx.take()
    }

    /// Validate and save
    ///
    /// An existing task keeps its id, creation time and completed flag.
    pub async fn on_save_click(&self) -> Result<AddEditResult, EditError> {
        debug!(name = %self.name, important = self.important, "on_save_click: called");
        if self.name.trim().is_empty() {
            let err = ValidationError::EmptyName;
            self.emit(AddEditTaskEvent::ShowInvalidInputMessage(err.to_string()));
            return Err(err.into());
        }

        let result = match &self.task {
            Some(task) => {
                let updated = Task {
                    name: self.name.clone(),
                    important: self.important,
                    ..task.clone()
                };
                self.manager.update(updated).await?;
                info!(task_id = task.id, "Task updated");
                AddEditResult::Edited
            }
            None => {
                let task = Task::new(self.name.clone()).with_important(self.important);
                let id = self.manager.insert(task).await?;
                info!(task_id = id, "Task added");
                AddEditResult::Added
            }
        };

        self.emit(AddEditTaskEvent::NavigateBackWithResult(result));
        Ok(result)
    }

    fn emit(&self, event: AddEditTaskEvent) {
        debug!(?event, "emit: called");
        if let Err(e) = self.events_tx.try_send(event) {
            warn!(error = %e, "Dropped add/edit event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskstore::{MemoryStore, TaskQuery};

    #[tokio::test]
    async fn test_blank_name_is_rejected_without_mutation() {
        let manager = TaskManager::spawn(MemoryStore::new());
        let mut editor = AddEditTaskController::new(manager.clone(), None, 4);
        let mut events = editor.take_events().unwrap();
        editor.set_name("   ");

        let err = editor.on_save_click().await.unwrap_err();
        assert!(matches!(err, EditError::Validation(ValidationError::EmptyName)));
        assert_eq!(
            events.try_recv().unwrap(),
            AddEditTaskEvent::ShowInvalidInputMessage("Name cannot be empty".to_string())
        );
        assert!(manager.query(TaskQuery::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_new_task_is_inserted() {
        let manager = TaskManager::spawn(MemoryStore::new());
        let mut editor = AddEditTaskController::new(manager.clone(), None, 4);
        let mut events = editor.take_events().unwrap();
        editor.set_name("Renew passport");
        editor.set_important(true);

        assert_eq!(editor.on_save_click().await.unwrap(), AddEditResult::Added);
        assert_eq!(
            events.try_recv().unwrap(),
            AddEditTaskEvent::NavigateBackWithResult(AddEditResult::Added)
        );

        let tasks = manager.query(TaskQuery::default()).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, "Renew passport");
        assert!(tasks[0].important);
        assert!(!tasks[0].completed);
    }

    #[tokio::test]
    async fn test_edit_keeps_identity_and_completion() {
        let manager = TaskManager::spawn(MemoryStore::new());
        let id = manager
            .insert(Task::new("Old name").with_completed(true))
            .await
            .unwrap();
        let original = manager.get_required(id).await.unwrap();

        let mut editor = AddEditTaskController::new(manager.clone(), Some(original.clone()), 4);
        assert_eq!(editor.name(), "Old name");
        assert!(!editor.important());
        editor.set_name("New name");
        editor.set_important(true);

        assert_eq!(editor.on_save_click().await.unwrap(), AddEditResult::Edited);
        let saved = manager.get_required(id).await.unwrap();
        assert_eq!(saved.name, "New name");
        assert!(saved.important);
        assert!(saved.completed);
        assert_eq!(saved.created, original.created);
    }

    #[tokio::test]
    async fn test_edit_of_deleted_task_is_not_found() {
        let manager = TaskManager::spawn(MemoryStore::new());
        let id = manager.insert(Task::new("gone soon")).await.unwrap();
        let task = manager.get_required(id).await.unwrap();
        manager.delete(id).await.unwrap();

        let editor = AddEditTaskController::new(manager, Some(task), 4);
        assert!(matches!(
            editor.on_save_click().await,
            Err(EditError::State(StateError::NotFound(_)))
        ));
    }

    #[test]
    fn test_confirmation_messages() {
        assert_eq!(AddEditResult::Added.confirmation_message(), "Task added");
        assert_eq!(AddEditResult::Edited.confirmation_message(), "Task updated");
    }
}
