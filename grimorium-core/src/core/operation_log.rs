//! Durable operation log and purge strategies for the region store.

use crate::{Operation, Result};
use rusqlite::Transaction;
use serde::Serialize;

/// Seconds in one day; used to convert `retention_days` to a Unix timestamp cutoff.
const SECONDS_PER_DAY: i64 = 86_400;

/// Controls which old operations are removed from the log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PurgeStrategy {
    /// Retain only the most recent `keep_last` operations.
    LocalOnly { keep_last: usize },
    /// Retain operations for up to `retention_days`.
    WithRetention { retention_days: u32 },
}

/// Row summary returned by [`OperationLog::list`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationSummary {
    pub operation_id: String,
    pub timestamp: i64,
    pub operation_type: String,
}

/// Records hierarchy mutations to the `operations` table and purges stale entries.
#[derive(Debug)]
pub struct OperationLog {
    strategy: PurgeStrategy,
}

impl OperationLog {
    pub fn new(strategy: PurgeStrategy) -> Self {
        Self { strategy }
    }

    /// Serialises `op` and appends it to the `operations` table within `tx`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GrimoriumError::Database`] if the INSERT fails, or
    /// [`crate::GrimoriumError::Json`] if `op` cannot be serialised.
    pub fn log(&self, tx: &Transaction, op: &Operation) -> Result<()> {
        let op_json = serde_json::to_string(op)?;

        tx.execute(
            "INSERT INTO operations (operation_id, timestamp, operation_type, operation_data)
             VALUES (?, ?, ?, ?)",
            rusqlite::params![op.operation_id(), op.timestamp(), op.type_name(), op_json],
        )?;

        Ok(())
    }

    /// Deletes old operations from the log according to the purge strategy.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GrimoriumError::Database`] if the DELETE fails.
    pub fn purge_if_needed(&self, tx: &Transaction) -> Result<()> {
        match self.strategy {
            PurgeStrategy::LocalOnly { keep_last } => {
                tx.execute(
                    "DELETE FROM operations WHERE id NOT IN (
                        SELECT id FROM operations ORDER BY id DESC LIMIT ?
                    )",
                    [keep_last as i64],
                )?;
            }
            PurgeStrategy::WithRetention { retention_days } => {
                let cutoff = chrono::Utc::now().timestamp()
                    - (i64::from(retention_days) * SECONDS_PER_DAY);
                tx.execute("DELETE FROM operations WHERE timestamp < ?", [cutoff])?;
            }
        }
        Ok(())
    }

    /// Most recent operations first, at most `limit` of them.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GrimoriumError::Database`] if the query fails.
    pub fn list(&self, conn: &rusqlite::Connection, limit: usize) -> Result<Vec<OperationSummary>> {
        let mut stmt = conn.prepare(
            "SELECT operation_id, timestamp, operation_type FROM operations
             ORDER BY id DESC LIMIT ?",
        )?;
        let rows = stmt
            .query_map([limit as i64], |row| {
                Ok(OperationSummary {
                    operation_id: row.get(0)?,
                    timestamp: row.get(1)?,
                    operation_type: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
