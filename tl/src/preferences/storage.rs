//! Preference storage backends

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fs2::FileExt;
use tracing::{debug, warn};

use super::{FilterPreferences, PreferenceError};

/// Preference file name inside the data directory
pub const PREFERENCES_FILE: &str = "user_preferences.yml";

/// Blocking read/write of the whole preference record
pub trait PreferenceStorage: Send + Sync {
    fn read(&self) -> Result<FilterPreferences, PreferenceError>;
    fn write(&self, prefs: &FilterPreferences) -> Result<(), PreferenceError>;
}

/// YAML file under the application data directory
///
/// Writes go to a temp file that is renamed over the real one while an
/// exclusive lock on a sidecar lock file is held. A missing file reads as
/// defaults.
pub struct YamlPreferenceStorage {
    path: PathBuf,
    lock_path: PathBuf,
}

impl YamlPreferenceStorage {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            path: dir.join(PREFERENCES_FILE),
            lock_path: dir.join(format!("{PREFERENCES_FILE}.lock")),
        }
    }

    /// Path of the preference file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self, exclusive: bool) -> Result<FileLock, PreferenceError> {
        if let Some(parent) = self.lock_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)?;
        if exclusive {
            FileExt::lock_exclusive(&file)?;
        } else {
            FileExt::lock_shared(&file)?;
        }
        Ok(FileLock { file })
    }
}

/// Held lock, released on drop
struct FileLock {
    file: File,
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(error = %e, "Failed to release preference lock");
        }
    }
}

impl PreferenceStorage for YamlPreferenceStorage {
    fn read(&self) -> Result<FilterPreferences, PreferenceError> {
        debug!(path = %self.path.display(), "YamlPreferenceStorage::read: called");
        if !self.path.exists() {
            debug!("YamlPreferenceStorage::read: no file, using defaults");
            return Ok(FilterPreferences::default());
        }
        let _lock = self.lock(false)?;
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(FilterPreferences::default());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    fn write(&self, prefs: &FilterPreferences) -> Result<(), PreferenceError> {
        debug!(?prefs, path = %self.path.display(), "YamlPreferenceStorage::write: called");
        let _lock = self.lock(true)?;
        let content = serde_yaml::to_string(prefs)?;

        let tmp_path = self.path.with_extension("yml.tmp");
        let mut tmp = File::create(&tmp_path)?;
        tmp.write_all(content.as_bytes())?;
        tmp.sync_all()?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

/// Process-local storage, nothing touches disk
#[derive(Default)]
pub struct MemoryPreferenceStorage {
    prefs: Mutex<FilterPreferences>,
}

impl MemoryPreferenceStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preferences(prefs: FilterPreferences) -> Self {
        Self {
            prefs: Mutex::new(prefs),
        }
    }
}

impl PreferenceStorage for MemoryPreferenceStorage {
    fn read(&self) -> Result<FilterPreferences, PreferenceError> {
        let prefs = self
            .prefs
            .lock()
            .map_err(|e| PreferenceError::Task(format!("poisoned preference lock: {e}")))?;
        Ok(*prefs)
    }

    fn write(&self, prefs: &FilterPreferences) -> Result<(), PreferenceError> {
        let mut current = self
            .prefs
            .lock()
            .map_err(|e| PreferenceError::Task(format!("poisoned preference lock: {e}")))?;
        *current = *prefs;
        Ok(())
    }
}
