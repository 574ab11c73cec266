//! Task CRUD operations.

use super::{Database, now_ms};
use crate::error::TaskError;
use crate::types::{Task, TaskStatus};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, Row, params};

const TASK_COLUMNS: &str =
    "id, title, description, status, task_order, created_at, updated_at";

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let status: String = row.get("status")?;
    let status = TaskStatus::parse(&status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown task status: {}", status).into(),
        )
    })?;

    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status,
        task_order: row.get("task_order")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Internal helper to get a task using an existing connection (avoids deadlock).
pub(crate) fn get_task_internal(conn: &Connection, task_id: i64) -> Result<Option<Task>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS))?;

    match stmt.query_row(params![task_id], parse_task_row) {
        Ok(task) => Ok(Some(task)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn ensure_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(TaskError::missing_field("title").into());
    }
    Ok(())
}

impl Database {
    /// All tasks, ordered by status, then `task_order`, newest first on ties.
    pub fn get_all_tasks(&self) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM tasks ORDER BY status ASC, task_order ASC, created_at DESC, id DESC",
                TASK_COLUMNS
            ))?;
            let tasks = stmt
                .query_map([], parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })
    }

    /// Point lookup by id.
    pub fn get_task(&self, task_id: i64) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, task_id))
    }

    /// Create a new task at the end of its status partition.
    ///
    /// Returns the id assigned by the database.
    pub fn create_task(&self, title: &str, description: &str, status: TaskStatus) -> Result<i64> {
        ensure_title(title)?;

        self.with_conn(|conn| {
            let order: i64 = conn.query_row(
                "SELECT COALESCE(MAX(task_order), -1) + 1 FROM tasks WHERE status = ?1",
                params![status.as_str()],
                |row| row.get(0),
            )?;

            let now = now_ms();
            conn.execute(
                "INSERT INTO tasks (title, description, status, task_order, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![title, description, status.as_str(), order, now],
            )?;

            Ok(conn.last_insert_rowid())
        })
    }

    /// Update title and description, and the status only when one is given.
    ///
    /// Returns false if no row has this id.
    pub fn update_task(
        &self,
        task_id: i64,
        title: &str,
        description: &str,
        status: Option<TaskStatus>,
    ) -> Result<bool> {
        ensure_title(title)?;

        self.with_conn(|conn| {
            let now = now_ms();
            let changed = match status {
                Some(status) => conn.execute(
                    "UPDATE tasks SET title = ?1, description = ?2, status = ?3, updated_at = ?4
                     WHERE id = ?5",
                    params![title, description, status.as_str(), now, task_id],
                )?,
                None => conn.execute(
                    "UPDATE tasks SET title = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
                    params![title, description, now, task_id],
                )?,
            };
            Ok(changed > 0)
        })
    }

    /// Delete a task. Siblings keep their `task_order`, leaving a gap.
    ///
    /// Returns false if no row has this id.
    pub fn delete_task(&self, task_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;
            Ok(deleted > 0)
        })
    }

    /// Unconditionally set a task's order and status.
    pub fn set_task_order(&self, task_id: i64, order: i64, status: TaskStatus) -> Result<()> {
        if order < 0 {
            return Err(anyhow!("task_order must be non-negative, got {}", order));
        }
        self.with_conn(|conn| set_task_order_internal(conn, task_id, order, status))
    }
}

pub(crate) fn set_task_order_internal(
    conn: &Connection,
    task_id: i64,
    order: i64,
    status: TaskStatus,
) -> Result<()> {
    conn.execute(
        "UPDATE tasks SET task_order = ?1, status = ?2, updated_at = ?3 WHERE id = ?4",
        params![order, status.as_str(), now_ms(), task_id],
    )?;
    Ok(())
}
