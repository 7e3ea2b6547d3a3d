//! TaskStore - persistence for to-do tasks
//!
//! Provides the [`Task`] record, the [`TaskQuery`] matching and ordering rules,
//! and the [`TaskRepository`] storage contract with two backends:
//!
//! - [`SqliteStore`] - durable storage in a single `tasks.db` file, seeded with
//!   example tasks the first time the file is created
//! - [`MemoryStore`] - process-local storage with identical semantics
//!
//! # Example
//!
//! ```ignore
//! use taskstore::{SortOrder, SqliteStore, Task, TaskQuery, TaskRepository};
//!
//! let mut store = SqliteStore::open("/tmp/tasklist")?;
//! let id = store.insert(&Task::new("Water the plants").with_important(true))?;
//! let tasks = store.query(&TaskQuery::new("plants", SortOrder::ByName, false))?;
//! ```

mod error;
mod memory;
mod query;
mod repository;
mod seed;
mod sqlite;
mod task;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use query::{ParseSortOrderError, SortOrder, TaskQuery};
pub use repository::TaskRepository;
pub use seed::seed_tasks;
pub use sqlite::{DB_FILE, SqliteStore};
pub use task::{Task, TaskId, UNASSIGNED_ID, now_ms};
