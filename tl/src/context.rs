//! Application-scoped stores
//!
//! Built once per process and handed to whatever needs a controller.

use eyre::{Context, Result};
use taskstore::{MemoryStore, SqliteStore, Task};
use tracing::{debug, info};

use crate::config::{Config, SubscriptionConfig};
use crate::controller::TaskListController;
use crate::editor::AddEditTaskController;
use crate::preferences::PreferenceStore;
use crate::state::TaskManager;

/// Owns the task actor and the preference store for the process lifetime
#[derive(Clone)]
pub struct AppContext {
    store: TaskManager,
    preferences: PreferenceStore,
    subscriptions: SubscriptionConfig,
}

impl AppContext {
    /// Open the stores described by `config`
    ///
    /// With `storage.in-memory` nothing is read from or written to disk.
    pub fn open(config: &Config) -> Result<Self> {
        debug!(data_dir = %config.storage.data_dir.display(), in_memory = config.storage.in_memory, "AppContext::open: called");
        if config.storage.in_memory {
            return Ok(Self::in_memory_with(&config.subscriptions));
        }

        let data_dir = &config.storage.data_dir;
        let repo = SqliteStore::open(data_dir)
            .with_context(|| format!("Failed to open task store in {}", data_dir.display()))?;
        info!(path = %repo.path().display(), "Task store opened");

        let store = TaskManager::spawn_with_config(repo, &config.subscriptions);
        let preferences = PreferenceStore::open(data_dir);

        Ok(Self {
            store,
            preferences,
            subscriptions: config.subscriptions.clone(),
        })
    }

    /// Seeded in-memory stores with default tuning
    pub fn in_memory() -> Self {
        Self::in_memory_with(&SubscriptionConfig::default())
    }

    fn in_memory_with(subscriptions: &SubscriptionConfig) -> Self {
        info!("Using in-memory stores");
        Self {
            store: TaskManager::spawn_with_config(MemoryStore::seeded(), subscriptions),
            preferences: PreferenceStore::in_memory(),
            subscriptions: subscriptions.clone(),
        }
    }

    pub fn store(&self) -> &TaskManager {
        &self.store
    }

    pub fn preferences(&self) -> &PreferenceStore {
        &self.preferences
    }

    /// Task list controller starting from `search`
    pub fn task_list(&self, search: impl Into<String>) -> TaskListController {
        TaskListController::new(
            self.store.clone(),
            self.preferences.clone(),
            search,
            &self.subscriptions,
        )
    }

    /// Editor for `task`, or for a new task when None
    pub fn editor(&self, task: Option<Task>) -> AddEditTaskController {
        AddEditTaskController::new(self.store.clone(), task, self.subscriptions.ui_event_capacity)
    }

    /// Stop the task actor
    pub async fn shutdown(&self) {
        debug!("AppContext::shutdown: called");
        self.store.shutdown().await;
    }
}
