//! Task list screen logic
//!
//! Turns user intents into store and preference calls and reports one-shot
//! UI events (navigation requests, undo and confirmation messages).

use taskstore::{SortOrder, Task, TaskId};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::config::SubscriptionConfig;
use crate::editor::AddEditResult;
use crate::pipeline::FilterPipeline;
use crate::preferences::{PreferenceError, PreferenceStore};
use crate::state::{StateError, TaskManager};

/// One-shot events for the task list screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TasksEvent {
    NavigateToAddTaskScreen,
    NavigateToEditTaskScreen(Task),
    ShowUndoDeleteTaskMessage(Task),
    ShowTaskSavedConfirmationMessage(String),
    NavigateToDeleteAllCompletedScreen,
}

#[derive(Debug, Error)]
pub enum TaskListError {
    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Preferences(#[from] PreferenceError),
}

pub struct TaskListController {
    manager: TaskManager,
    preferences: PreferenceStore,
    search_tx: watch::Sender<String>,
    events_tx: mpsc::Sender<TasksEvent>,
    events_rx: Option<mpsc::Receiver<TasksEvent>>,
    channel_capacity: usize,
}

impl TaskListController {
    /// Controller starting from a previously saved search text
    pub fn new(
        manager: TaskManager,
        preferences: PreferenceStore,
        search: impl Into<String>,
        config: &SubscriptionConfig,
    ) -> Self {
        let search = search.into();
        debug!(%search, "TaskListController::new: called");
        let (search_tx, _) = watch::channel(search);
        let (events_tx, events_rx) = mpsc::channel(config.ui_event_capacity.max(1));
        Self {
            manager,
            preferences,
            search_tx,
            events_tx,
            events_rx: Some(events_rx),
            channel_capacity: config.channel_capacity,
        }
    }

    /// Current search text, for saving across restarts
    pub fn search_query(&self) -> String {
        self.search_tx.borrow().clone()
    }

    pub fn set_search_query(&self, text: impl Into<String>) {
        let text = text.into();
        debug!(%text, "set_search_query: called");
        self.search_tx.send_if_modified(|current| {
            if *current == text {
                false
            } else {
                *current = text;
                true
            }
        });
    }

    /// Live filtered list following this controller's search text
    pub fn tasks(&self) -> FilterPipeline {
        debug!("tasks: called");
        FilterPipeline::spawn(
            self.manager.clone(),
            self.search_tx.subscribe(),
            self.preferences.subscribe(),
            self.channel_capacity,
        )
    }

    /// Receiver for one-shot events; only the first call gets it
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<TasksEvent>> {
        self.events_rx.take()
    }

    pub async fn on_sort_order_selected(&self, sort_order: SortOrder) -> Result<(), TaskListError> {
        debug!(%sort_order, "on_sort_order_selected: called");
        self.preferences.update_sort_order(sort_order).await?;
        Ok(())
    }

    pub async fn on_hide_completed_click(&self, hide_completed: bool) -> Result<(), TaskListError> {
        debug!(hide_completed, "on_hide_completed_click: called");
        self.preferences.update_hide_completed(hide_completed).await?;
        Ok(())
    }

    pub fn on_task_selected(&self, task: Task) {
        debug!(task_id = task.id, "on_task_selected: called");
        self.emit(TasksEvent::NavigateToEditTaskScreen(task));
    }

    /// Store `task` with its completed flag set to `checked`
    pub async fn on_task_checked_changed(&self, task: Task, checked: bool) -> Result<(), TaskListError> {
        debug!(task_id = task.id, checked, "on_task_checked_changed: called");
        self.manager.update(task.with_completed(checked)).await?;
        Ok(())
    }

    /// Delete now, offering undo through [`TasksEvent::ShowUndoDeleteTaskMessage`]
    ///
    /// Returns false when the task was already gone; no undo event is sent then.
    pub async fn on_task_swiped(&self, task: Task) -> Result<bool, TaskListError> {
        debug!(task_id = task.id, "on_task_swiped: called");
        let deleted = self.manager.delete(task.id).await?;
        if deleted {
            info!(task_id = task.id, "Task deleted");
            self.emit(TasksEvent::ShowUndoDeleteTaskMessage(task));
        } else {
            debug!(task_id = task.id, "on_task_swiped: task already absent");
        }
        Ok(deleted)
    }

    /// Put a deleted task back with its original id and fields
    pub async fn on_undo_delete_click(&self, task: Task) -> Result<TaskId, TaskListError> {
        debug!(task_id = task.id, "on_undo_delete_click: called");
        let id = self.manager.insert(task).await?;
        info!(task_id = id, "Task restored");
        Ok(id)
    }

    pub fn on_add_new_task_click(&self) {
        debug!("on_add_new_task_click: called");
        self.emit(TasksEvent::NavigateToAddTaskScreen);
    }

    pub fn on_add_edit_result(&self, result: AddEditResult) {
        debug!(?result, "on_add_edit_result: called");
        self.emit(TasksEvent::ShowTaskSavedConfirmationMessage(
            result.confirmation_message().to_string(),
        ));
    }

    pub fn on_delete_all_completed_click(&self) {
        debug!("on_delete_all_completed_click: called");
        self.emit(TasksEvent::NavigateToDeleteAllCompletedScreen);
    }

    /// Remove every completed task, returning how many went
    pub async fn on_delete_all_completed_confirmed(&self) -> Result<usize, TaskListError> {
        debug!("on_delete_all_completed_confirmed: called");
        let count = self.manager.delete_completed().await?;
        info!(count, "Completed tasks deleted");
        Ok(count)
    }

    fn emit(&self, event: TasksEvent) {
        debug!(?event, "emit: called");
        if let Err(e) = self.events_tx.try_send(event) {
            warn!(error = %e, "Dropped task list event");
        }
    }
}
