//! tasklist - reactive to-do list engine
//!
//! Keeps one continuously-current, correctly ordered view of the task list
//! from three changing inputs: the search text, the sort order and the
//! hide-completed flag.
//!
//! # Modules
//!
//! - [`state`] - Actor owning the task store, live query subscriptions
//! - [`preferences`] - Persisted, observable filter preferences
//! - [`pipeline`] - Switch-to-latest filter pipeline
//! - [`controller`] - Task list screen logic and one-shot events
//! - [`editor`] - Add/edit screen logic and validation
//! - [`context`] - Application-scoped stores
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface
//! - [`shell`] - Interactive shell

pub mod cli;
pub mod config;
pub mod context;
pub mod controller;
pub mod editor;
pub mod pipeline;
pub mod preferences;
pub mod shell;
pub mod state;

pub use config::Config;
pub use context::AppContext;
pub use controller::{TaskListController, TaskListError, TasksEvent};
pub use editor::{AddEditResult, AddEditTaskController, AddEditTaskEvent, EditError, ValidationError};
pub use pipeline::{FilterPipeline, TaskSource};
pub use preferences::{FilterPreferences, PreferenceError, PreferenceStore};
pub use state::{StateError, StoreEvent, TaskManager, TaskSubscription};
