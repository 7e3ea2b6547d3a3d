//! Query matching and ordering rules
//!
//! Both backends follow the same rules: a task matches when the search text is
//! empty or is a case-sensitive substring of its name, and hide-completed drops
//! completed tasks. Results are ordered important-first, then:
//!
//! - `ByName`: name ascending (byte-wise), then created, then id
//! - `ByDate`: created ascending, then id

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::task::Task;

/// Secondary ordering inside each importance group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortOrder {
    /// Alphabetical by name
    ByName,
    /// Oldest first
    #[default]
    ByDate,
}

impl SortOrder {
    /// Persisted enum name (`BY_NAME` / `BY_DATE`)
    pub fn name(self) -> &'static str {
        match self {
            Self::ByName => "BY_NAME",
            Self::ByDate => "BY_DATE",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unrecognised sort order text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown sort order '{0}' (expected BY_NAME or BY_DATE)")]
pub struct ParseSortOrderError(pub String);

impl FromStr for SortOrder {
    type Err = ParseSortOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "BY_NAME" | "NAME" => Ok(Self::ByName),
            "BY_DATE" | "DATE" => Ok(Self::ByDate),
            _ => Err(ParseSortOrderError(s.to_string())),
        }
    }
}

/// Parameters of a task list query
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TaskQuery {
    /// Case-sensitive substring of the name; empty matches everything
    pub search: String,
    /// Ordering inside each importance group
    pub sort_order: SortOrder,
    /// Drop completed tasks
    pub hide_completed: bool,
}

impl TaskQuery {
    /// Create a query
    pub fn new(search: impl Into<String>, sort_order: SortOrder, hide_completed: bool) -> Self {
        Self {
            search: search.into(),
            sort_order,
            hide_completed,
        }
    }

    /// Whether a task belongs in the result
    pub fn matches(&self, task: &Task) -> bool {
        if self.hide_completed && task.completed {
            return false;
        }
        self.search.is_empty() || task.name.contains(self.search.as_str())
    }

    /// Total order of two matching tasks
    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        let by_importance = b.important.cmp(&a.important);
        let secondary = match self.sort_order {
            SortOrder::ByName => a
                .name
                .cmp(&b.name)
                .then_with(|| a.created.cmp(&b.created)),
            SortOrder::ByDate => a.created.cmp(&b.created),
        };
        by_importance.then(secondary).then_with(|| a.id.cmp(&b.id))
    }

    /// Filter and order a set of tasks
    pub fn apply<'a>(&self, tasks: impl IntoIterator<Item = &'a Task>) -> Vec<Task> {
        let mut result: Vec<Task> = tasks.into_iter().filter(|t| self.matches(t)).cloned().collect();
        result.sort_by(|a, b| self.compare(a, b));
        result
    }

    /// SQL ORDER BY clause equivalent to [`TaskQuery::compare`]
    pub(crate) fn order_by_sql(&self) -> &'static str {
        match self.sort_order {
            SortOrder::ByName => "important DESC, name ASC, created ASC, id ASC",
            SortOrder::ByDate => "important DESC, created ASC, id ASC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: i64, name: &str, important: bool, completed: bool, created: i64) -> Task {
        Task {
            id,
            name: name.to_string(),
            important,
            completed,
            created,
        }
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("BY_NAME".parse::<SortOrder>().unwrap(), SortOrder::ByName);
        assert_eq!("by-date".parse::<SortOrder>().unwrap(), SortOrder::ByDate);
        assert_eq!("name".parse::<SortOrder>().unwrap(), SortOrder::ByName);
        assert!("priority".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_sort_order_display_matches_persisted_name() {
        assert_eq!(SortOrder::ByName.to_string(), "BY_NAME");
        assert_eq!(SortOrder::default(), SortOrder::ByDate);
    }

    #[test]
    fn test_empty_search_matches_all() {
        let query = TaskQuery::default();
        assert!(query.matches(&task(1, "anything", false, true, 1)));
    }

    #[test]
    fn test_search_is_case_sensitive() {
        let query = TaskQuery::new("call", SortOrder::ByDate, false);
        assert!(!query.matches(&task(1, "Call mom", false, false, 1)));
        assert!(query.matches(&task(2, "Recall", false, false, 1)));
    }

    #[test]
    fn test_hide_completed() {
        let query = TaskQuery::new("", SortOrder::ByDate, true);
        assert!(!query.matches(&task(1, "Done", true, true, 1)));
        assert!(query.matches(&task(2, "Open", true, false, 1)));
    }

    #[test]
    fn test_call_scenario() {
        let tasks = vec![
            task(1, "Buy milk", false, false, 10),
            task(2, "Call mom", true, false, 20),
            task(3, "Call dad", false, false, 30),
        ];
        let result = TaskQuery::new("Call", SortOrder::ByName, false).apply(&tasks);
        let ids: Vec<i64> = result.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_by_date_is_oldest_first_within_importance() {
        let tasks = vec![
            task(1, "c", false, false, 30),
            task(2, "b", true, false, 20),
            task(3, "a", false, false, 10),
            task(4, "d", true, false, 5),
        ];
        let result = TaskQuery::default().apply(&tasks);
        let ids: Vec<i64> = result.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![4, 2, 3, 1]);
    }

    #[test]
    fn test_equal_names_break_ties_by_created_then_id() {
        let tasks = vec![
            task(3, "same", false, false, 10),
            task(2, "same", false, false, 20),
            task(1, "same", false, false, 10),
        ];
        let result = TaskQuery::new("", SortOrder::ByName, false).apply(&tasks);
        let ids: Vec<i64> = result.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
    }
}
