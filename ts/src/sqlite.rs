//! SQLite task storage

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::query::TaskQuery;
use crate::repository::TaskRepository;
use crate::seed::seed_tasks;
use crate::task::{Task, TaskId};

/// Database file name inside the store directory
pub const DB_FILE: &str = "tasks.db";

const TASK_SELECT_SQL: &str = "SELECT id, name, important, completed, created FROM task_table";

const CREATE_TABLE_SQL: &str = "CREATE TABLE task_table (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    important INTEGER NOT NULL DEFAULT 0,
    completed INTEGER NOT NULL DEFAULT 0,
    created INTEGER NOT NULL
)";

/// Durable store backed by `tasks.db`
pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteStore {
    /// Open or create the store in `dir`
    ///
    /// A database created by this call is seeded with the example tasks.
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref();
        debug!(dir = %dir.display(), "SqliteStore::open: called");
        fs::create_dir_all(dir)?;
        let path = dir.join(DB_FILE);

        let mut conn = Connection::open(&path)?;
        if create_schema(&mut conn)? {
            let seeded = seed(&mut conn)?;
            info!(path = %path.display(), seeded, "Created task database");
        } else {
            debug!(path = %path.display(), "SqliteStore::open: existing database");
        }

        Ok(Self { conn, path })
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Create the task table if missing; true when it was created
fn create_schema(conn: &mut Connection) -> StoreResult<bool> {
    let tx = conn.transaction()?;
    let exists: bool = tx.query_row(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'task_table')",
        [],
        |row| row.get(0),
    )?;
    if exists {
        return Ok(false);
    }
    tx.execute(CREATE_TABLE_SQL, [])?;
    tx.commit()?;
    Ok(true)
}

fn seed(conn: &mut Connection) -> StoreResult<usize> {
    let tx = conn.transaction()?;
    let tasks = seed_tasks();
    for task in &tasks {
        tx.execute(
            "INSERT INTO task_table (name, important, completed, created) VALUES (?1, ?2, ?3, ?4)",
            params![task.name, task.important, task.completed, task.created],
        )?;
    }
    tx.commit()?;
    Ok(tasks.len())
}

fn parse_task_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        name: row.get("name")?,
        important: row.get("important")?,
        completed: row.get("completed")?,
        created: row.get("created")?,
    })
}

impl TaskRepository for SqliteStore {
    fn query(&self, query: &TaskQuery) -> StoreResult<Vec<Task>> {
        debug!(?query, "SqliteStore::query: called");
        let sql = format!(
            "{TASK_SELECT_SQL}
             WHERE (?1 = '' OR instr(name, ?1) > 0)
               AND (?2 = 0 OR completed = 0)
             ORDER BY {}",
            query.order_by_sql()
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params![query.search, query.hide_completed], parse_task_row)?;
        let tasks = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    fn get(&self, id: TaskId) -> StoreResult<Option<Task>> {
        let mut stmt = self.conn.prepare_cached(&format!("{TASK_SELECT_SQL} WHERE id = ?1"))?;
        let task = stmt.query_row([id], parse_task_row).optional()?;
        Ok(task)
    }

    fn insert(&mut self, task: &Task) -> StoreResult<TaskId> {
        if task.id < 0 {
            return Err(StoreError::InvalidData(format!("negative task id {}", task.id)));
        }
        if task.is_unsaved() {
            self.conn.execute(
                "INSERT INTO task_table (name, important, completed, created) VALUES (?1, ?2, ?3, ?4)",
                params![task.name, task.important, task.completed, task.created],
            )?;
            let id = self.conn.last_insert_rowid();
            debug!(id, "SqliteStore::insert: assigned id");
            return Ok(id);
        }

        self.conn.execute(
            "INSERT OR REPLACE INTO task_table (id, name, important, completed, created)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![task.id, task.name, task.important, task.completed, task.created],
        )?;
        debug!(id = task.id, "SqliteStore::insert: replaced");
        Ok(task.id)
    }

    fn update(&mut self, task: &Task) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE task_table SET name = ?1, important = ?2, completed = ?3, created = ?4 WHERE id = ?5",
            params![task.name, task.important, task.completed, task.created, task.id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(task.id));
        }
        Ok(())
    }

    fn delete(&mut self, id: TaskId) -> StoreResult<bool> {
        let changed = self.conn.execute("DELETE FROM task_table WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }

    fn delete_completed(&mut self) -> StoreResult<usize> {
        let changed = self.conn.execute("DELETE FROM task_table WHERE completed = 1", [])?;
        debug!(changed, "SqliteStore::delete_completed: removed");
        Ok(changed)
    }
}
