//! Aggregation queries for statistics.

use super::Database;
use crate::types::TaskStats;
use anyhow::Result;

impl Database {
    /// Count tasks overall and per status.
    pub fn get_stats(&self) -> Result<TaskStats> {
        self.with_conn(|conn| {
            let stats = conn.query_row(
                "SELECT
                    COUNT(*) AS total,
                    COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0) AS completed,
                    COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0) AS pending
                 FROM tasks",
                [],
                |row| {
                    Ok(TaskStats {
                        total: row.get("total")?,
                        completed: row.get("completed")?,
                        pending: row.get("pending")?,
                    })
                },
            )?;
            Ok(stats)
        })
    }
}
