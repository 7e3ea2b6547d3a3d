//! Observable preference store

use std::path::Path;
use std::sync::Arc;

use taskstore::SortOrder;
use tokio::sync::{Mutex, watch};
use tracing::{debug, error, info};

use super::storage::{MemoryPreferenceStorage, PreferenceStorage, YamlPreferenceStorage};
use super::{FilterPreferences, PreferenceError};

/// Shared handle to the user's filter preferences
///
/// Subscribers see the current value immediately and every later change.
/// Updates are serialised: each one reads the current record, changes a
/// single field, persists it, then publishes.
#[derive(Clone)]
pub struct PreferenceStore {
    inner: Arc<Inner>,
}

struct Inner {
    storage: Arc<dyn PreferenceStorage>,
    tx: watch::Sender<FilterPreferences>,
    write_lock: Mutex<()>,
}

impl PreferenceStore {
    /// Open the YAML-backed store in `dir`
    pub fn open(dir: impl AsRef<Path>) -> Self {
        debug!(dir = %dir.as_ref().display(), "PreferenceStore::open: called");
        Self::with_storage(Arc::new(YamlPreferenceStorage::new(dir)))
    }

    /// Store that never touches disk
    pub fn in_memory() -> Self {
        Self::with_storage(Arc::new(MemoryPreferenceStorage::new()))
    }

    /// Build on an arbitrary backend
    ///
    /// A failed initial read is logged and replaced by the defaults.
    pub fn with_storage(storage: Arc<dyn PreferenceStorage>) -> Self {
        let initial = match storage.read() {
            Ok(prefs) => prefs,
            Err(e) => {
                error!(error = %e, "Error reading preferences, using defaults");
                FilterPreferences::default()
            }
        };
        info!(sort_order = %initial.sort_order, hide_completed = initial.hide_completed, "Preferences loaded");
        let (tx, _) = watch::channel(initial);
        Self {
            inner: Arc::new(Inner {
                storage,
                tx,
                write_lock: Mutex::new(()),
            }),
        }
    }

    /// Latest published value
    pub fn current(&self) -> FilterPreferences {
        *self.inner.tx.borrow()
    }

    /// Live view of the preferences
    pub fn subscribe(&self) -> watch::Receiver<FilterPreferences> {
        self.inner.tx.subscribe()
    }

    pub async fn update_sort_order(&self, sort_order: SortOrder) -> Result<(), PreferenceError> {
        debug!(%sort_order, "update_sort_order: called");
        self.update(|prefs| prefs.sort_order = sort_order).await
    }

    pub async fn update_hide_completed(&self, hide_completed: bool) -> Result<(), PreferenceError> {
        debug!(hide_completed, "update_hide_completed: called");
        self.update(|prefs| prefs.hide_completed = hide_completed).await
    }

    async fn update(&self, change: impl FnOnce(&mut FilterPreferences)) -> Result<(), PreferenceError> {
        let _guard = self.inner.write_lock.lock().await;

        let mut prefs = self.current();
        change(&mut prefs);

        let storage = self.inner.storage.clone();
        tokio::task::spawn_blocking(move || storage.write(&prefs))
            .await
            .map_err(|e| PreferenceError::Task(e.to_string()))??;

        self.inner.tx.send_if_modified(|current| {
            if *current == prefs {
                false
            } else {
                *current = prefs;
                true
            }
        });
        Ok(())
    }
}
