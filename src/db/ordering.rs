//! Per-status ordering: whole-column reorder and single-task moves.
//!
//! `task_order` is scoped to a status partition. A reorder overwrites the
//! partition's order from a client-supplied id list. A move across columns
//! shifts both partitions so they stay contiguous; a move within one column
//! sets the order directly and leaves siblings alone.
//!
//! None of the multi-statement sequences here run inside a transaction.

use super::tasks::{get_task_internal, set_task_order_internal};
use super::{Database, now_ms};
use crate::types::TaskStatus;
use anyhow::{Result, anyhow};
use rusqlite::params;
use tracing::debug;

impl Database {
    /// Assign `task_order = 0, 1, 2, ...` to `task_ids` in the given sequence.
    ///
    /// Each update is conditioned on both id and status, so ids that are not
    /// currently in `status` are skipped. Unlisted tasks of the same status
    /// keep whatever order they had.
    pub fn reorder_tasks(&self, task_ids: &[i64], status: TaskStatus) -> Result<()> {
        if task_ids.is_empty() {
            return Ok(());
        }

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "UPDATE tasks SET task_order = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
            )?;
            let now = now_ms();
            let mut matched = 0usize;
            for (order, task_id) in task_ids.iter().enumerate() {
                matched += stmt.execute(params![order as i64, now, task_id, status.as_str()])?;
            }
            debug!(
                status = %status,
                requested = task_ids.len(),
                matched,
                "Reordered partition"
            );
            Ok(())
        })
    }

    /// Move a task to `new_order`, optionally into another status.
    ///
    /// Returns false if the task does not exist.
    pub fn move_task(
        &self,
        task_id: i64,
        new_order: i64,
        new_status: Option<TaskStatus>,
    ) -> Result<bool> {
        if new_order < 0 {
            return Err(anyhow!("task_order must be non-negative, got {}", new_order));
        }

        self.with_conn(|conn| {
            let Some(task) = get_task_internal(conn, task_id)? else {
                return Ok(false);
            };

            let current = task.status;
            let target = new_status.unwrap_or(current);

            if target != current {
                let now = now_ms();

                // Close the gap left in the old column.
                conn.execute(
                    "UPDATE tasks SET task_order = task_order - 1, updated_at = ?1
                     WHERE status = ?2 AND task_order > ?3",
                    params![now, current.as_str(), task.task_order],
                )?;

                // Make room in the new column.
                conn.execute(
                    "UPDATE tasks SET task_order = task_order + 1, updated_at = ?1
                     WHERE status = ?2 AND task_order >= ?3",
                    params![now, target.as_str(), new_order],
                )?;
            }

            set_task_order_internal(conn, task_id, new_order, target)?;

            debug!(
                task_id,
                from = %current,
                to = %target,
                order = new_order,
                "Moved task"
            );
            Ok(true)
        })
    }
}
