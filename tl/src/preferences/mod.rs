//! User filter preferences
//!
//! Sort order and hide-completed, persisted across restarts and observable
//! through a `watch` channel.

mod storage;
mod store;

use serde::{Deserialize, Serialize};
use taskstore::SortOrder;
use thiserror::Error;

pub use storage::{MemoryPreferenceStorage, PREFERENCES_FILE, PreferenceStorage, YamlPreferenceStorage};
pub use store::PreferenceStore;

/// Persisted filter settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterPreferences {
    pub sort_order: SortOrder,
    pub hide_completed: bool,
}

/// Errors from preference storage
#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("Preference storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Preference file is malformed: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Preference write task failed: {0}")]
    Task(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let prefs = FilterPreferences::default();
        assert_eq!(prefs.sort_order, SortOrder::ByDate);
        assert!(!prefs.hide_completed);
    }

    #[test]
    fn test_yaml_uses_enum_names() {
        let prefs = FilterPreferences {
            sort_order: SortOrder::ByName,
            hide_completed: true,
        };
        let yaml = serde_yaml::to_string(&prefs).unwrap();
        assert!(yaml.contains("sort_order: BY_NAME"));
        assert!(yaml.contains("hide_completed: true"));
    }

    #[test]
    fn test_missing_keys_fall_back() {
        let prefs: FilterPreferences = serde_yaml::from_str("hide_completed: true\n").unwrap();
        assert_eq!(prefs.sort_order, SortOrder::ByDate);
        assert!(prefs.hide_completed);
    }
}
