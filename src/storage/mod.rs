use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;

// ─── Task ─────────────────────────────────────────────────────────────────────

/// The persisted todo record. Doubles as the REST request/response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: bool,
}

/// Result of `list_all`: the readable tasks plus how many rows were dropped
/// because they could not be decoded. Callers keep the wire contract (tasks
/// only) and log `skipped` instead of failing the whole listing.
#[derive(Debug, Clone)]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub skipped: usize,
}

// ─── StoreError ───────────────────────────────────────────────────────────────

/// Domain errors the REST layer maps to distinct status codes. Everything
/// else (I/O, corruption) falls through as `Database`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("task id {0} already exists")]
    DuplicateId(i64),
    #[error("task {0} not found")]
    NotFound(i64),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

// ─── TaskStore ────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct TaskStore {
    pool: SqlitePool,
}

/// `typeof(status)` and `CAST(status AS TEXT)` are selected alongside the row
/// so coercion can distinguish a numeric cell from a text cell regardless of
/// what a previous writer put in the INTEGER column.
const SELECT_COLUMNS: &str =
    "id, name, description, typeof(status) AS status_type, CAST(status AS TEXT) AS status_text";

impl TaskStore {
    /// Open (or create) the database at `db_path` and ensure the schema
    /// exists. Safe to call on every process start.
    pub async fn open(db_path: &Path) -> anyhow::Result<Self> {
        if let Some(dir) = db_path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(opts).await?;
        let store = Self::new(pool);
        store.init().await?;
        Ok(store)
    }

    /// Wrap an existing pool (tests use this with an in-memory database).
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Idempotent schema creation.
    pub async fn init(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT DEFAULT '',
                status INTEGER DEFAULT 0
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// One greater than the current maximum id, or 1 when the store is empty.
    ///
    /// Advisory only: the value is not reserved, so two concurrent callers
    /// can receive the same number and the second `create` will fail with
    /// `DuplicateId`. Use `create_auto` when the race matters.
    pub async fn next_id(&self) -> Result<i64, StoreError> {
        let id: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(id), 0) + 1 FROM tasks")
            .fetch_one(&self.pool)
            .await?;
        Ok(id)
    }

    /// All tasks ordered by ascending id. Rows that cannot be decoded are
    /// counted into `skipped` rather than failing the listing.
    pub async fn list_all(&self) -> Result<TaskPage, StoreError> {
        let rows =
            sqlx::query(&format!("SELECT {SELECT_COLUMNS} FROM tasks ORDER BY id ASC"))
                .fetch_all(&self.pool)
                .await?;
        let mut tasks = Vec::with_capacity(rows.len());
        let mut skipped = 0usize;
        for row in &rows {
            match decode_row(row) {
                Some(task) => tasks.push(task),
                None => skipped += 1,
            }
        }
        Ok(TaskPage { tasks, skipped })
    }

    /// Single-row lookup. `None` when the id is absent or the row is
    /// undecodable.
    pub async fn get(&self, id: i64) -> Result<Option<Task>, StoreError> {
        let row = sqlx::query(&format!("SELECT {SELECT_COLUMNS} FROM tasks WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().and_then(decode_row))
    }

    /// Insert a task with a caller-supplied id. Fails with `DuplicateId` when
    /// the id is taken; the existing row is left untouched.
    pub async fn create(&self, task: &Task) -> Result<(), StoreError> {
        let result = sqlx::query(
            "INSERT INTO tasks (id, name, description, status) VALUES (?, ?, ?, ?)",
        )
        .bind(task.id)
        .bind(&task.name)
        .bind(&task.description)
        .bind(task.status as i64)
        .execute(&self.pool)
        .await;
        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::DuplicateId(task.id))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Reserve-and-insert in one statement: assigns max(id)+1 (1 on an empty
    /// store) and inserts atomically, closing the `next_id`-then-`create`
    /// race. Returns the assigned id.
    pub async fn create_auto(
        &self,
        name: &str,
        description: &str,
        status: bool,
    ) -> Result<i64, StoreError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO tasks (id, name, description, status)
             SELECT COALESCE(MAX(id), 0) + 1, ?, ?, ? FROM tasks
             RETURNING id",
        )
        .bind(name)
        .bind(description)
        .bind(status as i64)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Overwrite all mutable fields unconditionally. Callers wanting a
    /// partial update must read the current row first and resupply unchanged
    /// fields (the agent's update-info wrapper does exactly that).
    pub async fn update(&self, task: &Task) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE tasks SET name = ?, description = ?, status = ? WHERE id = ?")
            .bind(&task.name)
            .bind(&task.description)
            .bind(task.status as i64)
            .bind(task.id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(task.id));
        }
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}

// ─── Row decoding ─────────────────────────────────────────────────────────────

fn decode_row(row: &SqliteRow) -> Option<Task> {
    let id: i64 = row.try_get("id").ok()?;
    let name: Option<String> = row.try_get("name").ok()?;
    let description: Option<String> = row.try_get("description").ok()?;
    let status_type: String = row.try_get("status_type").ok()?;
    let status_text: Option<String> = row.try_get("status_text").ok()?;
    Some(Task {
        id,
        name: name.unwrap_or_default(),
        description: description.unwrap_or_default(),
        status: coerce_status(&status_type, status_text.as_deref()),
    })
}

/// Tolerant status read: numeric cells are true when non-zero; text cells are
/// true when they match a fixed truthy token set; everything else is false.
fn coerce_status(storage_type: &str, raw: Option<&str>) -> bool {
    let Some(raw) = raw else { return false };
    match storage_type {
        "integer" | "real" => raw.parse::<f64>().map(|n| n != 0.0).unwrap_or(false),
        "text" => matches!(
            raw.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "done" | "completed"
        ),
        _ => false,
    }
}
