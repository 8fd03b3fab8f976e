//! SQLite connection management for the region database.

use crate::{GrimoriumError, Result};
use rusqlite::Connection;
use std::path::Path;

/// Tables every Grimorium region database must contain.
const REQUIRED_TABLES: [&str; 2] = ["regions", "operations"];

pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Creates (or initialises) a database file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`GrimoriumError::Database`] for any SQLite failure.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// A fresh database that lives only as long as the returned value.
    ///
    /// # Errors
    ///
    /// Returns [`GrimoriumError::Database`] for any SQLite failure.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self { conn })
    }

    /// Opens an existing database, validating its tables and migrating
    /// older layouts.
    ///
    /// # Errors
    ///
    /// Returns [`GrimoriumError::InvalidWorkspace`] if the file is not a
    /// region database, or [`GrimoriumError::Database`] for SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        let table_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master
                 WHERE type='table' AND name IN (?1, ?2)",
                REQUIRED_TABLES,
                |row| row.get(0),
            )
            .map_err(|_| {
                GrimoriumError::InvalidWorkspace("Not a valid Grimorium database".to_string())
            })?;

        if table_count != REQUIRED_TABLES.len() as i64 {
            return Err(GrimoriumError::InvalidWorkspace(
                "Not a valid Grimorium database".to_string(),
            ));
        }

        // Migrate: databases created before sibling ordering lack order_index
        let column_exists: bool = conn.query_row(
            "SELECT COUNT(*) FROM pragma_table_info('regions') WHERE name='order_index'",
            [],
            |row| row.get::<_, i64>(0).map(|count| count > 0),
        )?;

        if !column_exists {
            log::info!("migrating regions table: adding order_index");
            conn.execute(
                "ALTER TABLE regions ADD COLUMN order_index INTEGER NOT NULL DEFAULT 0",
                [],
            )?;
        }

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}
