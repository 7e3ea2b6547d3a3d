//! Task record

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};

/// Store-assigned task identifier
pub type TaskId = i64;

/// Id carried by a task that has not been stored yet
pub const UNASSIGNED_ID: TaskId = 0;

static LAST_TIMESTAMP: AtomicI64 = AtomicI64::new(0);

/// Current Unix time in milliseconds, strictly increasing within the process
///
/// Two calls never return the same value, so tasks created back to back keep
/// their creation order under `SortOrder::ByDate`.
pub fn now_ms() -> i64 {
    let wall = chrono::Utc::now().timestamp_millis();
    let mut last = LAST_TIMESTAMP.load(Ordering::Relaxed);
    loop {
        let next = wall.max(last + 1);
        match LAST_TIMESTAMP.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(current) => last = current,
        }
    }
}

/// One to-do item
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Task {
    /// Store-assigned id, [`UNASSIGNED_ID`] until inserted
    pub id: TaskId,

    /// Display text, never empty once validated
    pub name: String,

    /// Important tasks sort ahead of the rest
    pub important: bool,

    /// Completed tasks are dropped by hide-completed queries
    pub completed: bool,

    /// Creation timestamp (Unix milliseconds)
    pub created: i64,
}

impl Task {
    /// Create an unsaved task stamped with the current time
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: UNASSIGNED_ID,
            name: name.into(),
            important: false,
            completed: false,
            created: now_ms(),
        }
    }

    /// Set the importance flag
    pub fn with_important(mut self, important: bool) -> Self {
        self.important = important;
        self
    }

    /// Set the completed flag
    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    /// Whether the store still has to assign an id
    pub fn is_unsaved(&self) -> bool {
        self.id == UNASSIGNED_ID
    }

    /// Creation time as a local date-time string
    pub fn created_date_formatted(&self) -> String {
        match Local.timestamp_millis_opt(self.created).single() {
            Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => self.created.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_task_defaults() {
        let task = Task::new("Feed the cat");
        assert_eq!(task.id, UNASSIGNED_ID);
        assert!(task.is_unsaved());
        assert!(!task.important);
        assert!(!task.completed);
        assert!(task.created > 0);
    }

    #[test]
    fn test_builders() {
        let task = Task::new("Pay rent").with_important(true).with_completed(true);
        assert!(task.important);
        assert!(task.completed);
    }

    #[test]
    fn test_now_ms_strictly_increasing() {
        let stamps: Vec<i64> = (0..1000).map(|_| now_ms()).collect();
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_created_date_formatted() {
        let mut task = Task::new("x");
        task.created = 0;
        let formatted = task.created_date_formatted();
        assert_eq!(formatted.len(), "1970-01-01 00:00:00".len());
    }

    #[test]
    fn test_serde_roundtrip_shape() {
        let task = Task::new("Call mom").with_important(true);
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["name"], "Call mom");
        assert_eq!(json["important"], true);
        assert_eq!(json["id"], 0);
    }
}
