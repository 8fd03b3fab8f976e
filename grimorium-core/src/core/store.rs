//! The backing store boundary and its SQLite implementation.

use crate::core::tree::build_forest;
use crate::{
    DeleteResult, DeleteStrategy, GrimoriumError, Operation, OperationLog, OperationSummary,
    PurgeStrategy, Region, RegionNode, RegionScale, Result, Storage,
};
use rusqlite::{OptionalExtension, Transaction};
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

/// Authoritative storage for the region hierarchy.
///
/// The hierarchy editor only ever reads a whole forest and issues the two
/// mutations below; everything else (creation, deletion, field edits) is
/// the host's business and is followed by a reload.
pub trait RegionStore: Send {
    /// Returns the canonical forest for one book.
    ///
    /// # Errors
    ///
    /// Implementations return any storage failure.
    fn load_forest(&self, book_id: &str) -> Result<Vec<RegionNode>>;

    /// Durably sets the parent of `region_id`; `None` moves it to the top level.
    ///
    /// Setting the parent it already has must leave the store unchanged.
    ///
    /// # Errors
    ///
    /// Implementations return [`GrimoriumError::RegionNotFound`],
    /// [`GrimoriumError::InvalidMove`] or any storage failure.
    fn persist_reparent(&mut self, region_id: &str, new_parent_id: Option<&str>) -> Result<()>;

    /// Durably sets the complete sibling order under `parent_id`.
    ///
    /// Reordering to the order already stored must leave the store unchanged.
    ///
    /// # Errors
    ///
    /// Implementations return [`GrimoriumError::RegionNotFound`],
    /// [`GrimoriumError::InvalidMove`] or any storage failure.
    fn persist_reorder(&mut self, sibling_ids: &[String], parent_id: Option<&str>) -> Result<()>;
}

/// Default number of operations kept in the log.
const DEFAULT_KEEP_LAST: usize = 1000;

/// Columns selected for every region query, in [`map_region_row`] order.
const REGION_COLUMNS: &str =
    "id, book_id, name, parent_id, scale, order_index, created_at, updated_at";

/// [`RegionStore`] over a SQLite database file.
pub struct SqliteRegionStore {
    storage: Storage,
    operation_log: OperationLog,
}

impl SqliteRegionStore {
    /// Creates a new region database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`GrimoriumError::Database`] for any SQLite failure.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::with_storage(Storage::create(path)?))
    }

    /// Opens an existing region database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`GrimoriumError::InvalidWorkspace`] if the file is not a
    /// region database, or [`GrimoriumError::Database`] for SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::with_storage(Storage::open(path)?))
    }

    /// A throwaway in-memory store.
    ///
    /// # Errors
    ///
    /// Returns [`GrimoriumError::Database`] for any SQLite failure.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::with_storage(Storage::open_in_memory()?))
    }

    fn with_storage(storage: Storage) -> Self {
        Self {
            storage,
            operation_log: OperationLog::new(PurgeStrategy::LocalOnly {
                keep_last: DEFAULT_KEEP_LAST,
            }),
        }
    }

    /// Replaces the operation log purge strategy.
    #[must_use]
    pub fn with_purge_strategy(mut self, strategy: PurgeStrategy) -> Self {
        self.operation_log = OperationLog::new(strategy);
        self
    }

    /// Inserts a region as the last child of `parent_id` (or last top-level region).
    ///
    /// # Errors
    ///
    /// Returns [`GrimoriumError::RegionNotFound`] if the parent does not
    /// exist, [`GrimoriumError::InvalidMove`] if it belongs to another book,
    /// or [`GrimoriumError::Database`] for SQLite failures.
    pub fn create_region(
        &mut self,
        book_id: &str,
        name: &str,
        scale: RegionScale,
        parent_id: Option<&str>,
    ) -> Result<Region> {
        if let Some(pid) = parent_id {
            let parent = self.get_region(pid)?;
            if parent.book_id != book_id {
                return Err(GrimoriumError::InvalidMove(format!(
                    "Region {pid} belongs to a different book"
                )));
            }
        }

        let now = chrono::Utc::now().timestamp_millis();
        let tx = self.storage.connection_mut().transaction()?;
        let order_index = next_order_index(&tx, book_id, parent_id, None)?;
        let region = Region {
            id: Uuid::new_v4().to_string(),
            book_id: book_id.to_string(),
            name: name.to_string(),
            parent_id: parent_id.map(str::to_string),
            scale,
            order_index,
            created_at: now,
            updated_at: now,
        };
        tx.execute(
            "INSERT INTO regions (id, book_id, name, parent_id, scale, order_index, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                region.id,
                region.book_id,
                region.name,
                region.parent_id,
                region.scale.as_str(),
                region.order_index,
                region.created_at,
                region.updated_at,
            ],
        )?;
        tx.commit()?;
        Ok(region)
    }

    /// Fetches a single region.
    ///
    /// # Errors
    ///
    /// Returns [`GrimoriumError::RegionNotFound`] if `region_id` does not
    /// exist, or [`GrimoriumError::Database`] for SQLite failures.
    pub fn get_region(&self, region_id: &str) -> Result<Region> {
        let row = self
            .storage
            .connection()
            .query_row(
                &format!("SELECT {REGION_COLUMNS} FROM regions WHERE id = ?1"),
                [region_id],
                map_region_row,
            )
            .optional()?
            .ok_or_else(|| GrimoriumError::RegionNotFound(region_id.to_string()))?;
        region_from_row(row)
    }

    /// Every region of a book, ordered by sibling position.
    ///
    /// # Errors
    ///
    /// Returns [`GrimoriumError::Database`] for SQLite failures, or
    /// [`GrimoriumError::InvalidData`] for an unreadable scale.
    pub fn list_regions(&self, book_id: &str) -> Result<Vec<Region>> {
        let mut stmt = self.storage.connection().prepare(&format!(
            "SELECT {REGION_COLUMNS} FROM regions WHERE book_id = ?1
             ORDER BY order_index, created_at, id"
        ))?;
        let rows = stmt
            .query_map([book_id], map_region_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(region_from_row).collect()
    }

    /// Deletes a region, handling its children according to `strategy`.
    ///
    /// The whole deletion runs in one transaction. Sibling positions stay
    /// dense afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`GrimoriumError::RegionNotFound`] if `region_id` does not
    /// exist, or [`GrimoriumError::Database`] for SQLite failures.
    pub fn delete_region(
        &mut self,
        region_id: &str,
        strategy: DeleteStrategy,
    ) -> Result<DeleteResult> {
        let region = self.get_region(region_id)?;
        let now = chrono::Utc::now().timestamp_millis();
        let tx = self.storage.connection_mut().transaction()?;

        let result = match strategy {
            DeleteStrategy::DeleteAll => {
                let ids = subtree_ids(&tx, region_id)?;
                // Deepest first, so ON DELETE SET NULL never fires on rows about to go.
                for id in ids.iter().rev() {
                    tx.execute("DELETE FROM regions WHERE id = ?1", [id])?;
                }
                close_gap(&tx, &region)?;
                DeleteResult {
                    deleted_count: ids.len(),
                    affected_ids: ids,
                }
            }
            DeleteStrategy::PromoteChildren => {
                let children = child_ids(&tx, &region.book_id, Some(region_id))?;
                // Promoted children go after the siblings that remain.
                close_gap(&tx, &region)?;
                let base = next_order_index(
                    &tx,
                    &region.book_id,
                    region.parent_id.as_deref(),
                    Some(region_id),
                )?;
                for (offset, child_id) in children.iter().enumerate() {
                    tx.execute(
                        "UPDATE regions SET parent_id = ?1, order_index = ?2, updated_at = ?3 WHERE id = ?4",
                        rusqlite::params![region.parent_id, base + offset as i32, now, child_id],
                    )?;
                }
                tx.execute("DELETE FROM regions WHERE id = ?1", [region_id])?;
                let mut affected_ids = vec![region_id.to_string()];
                affected_ids.extend(children);
                DeleteResult {
                    deleted_count: 1,
                    affected_ids,
                }
            }
        };
        tx.commit()?;

        log::info!(
            "deleted region {region_id} ({strategy:?}): {} removed",
            result.deleted_count
        );
        Ok(result)
    }

    /// Most recent hierarchy operations, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`GrimoriumError::Database`] for SQLite failures.
    pub fn list_operations(&self, limit: usize) -> Result<Vec<OperationSummary>> {
        self.operation_log.list(self.storage.connection(), limit)
    }

    /// Walks the ancestor chain of `start` and reports whether `region_id` is on it.
    fn is_ancestor_of(&self, region_id: &str, start: &str) -> Result<bool> {
        let mut seen = HashSet::new();
        let mut current = start.to_string();
        loop {
            if !seen.insert(current.clone()) {
                log::warn!("stored parent cycle detected while walking ancestors of {start}");
                return Ok(true);
            }
            let parent: Option<String> = self
                .storage
                .connection()
                .query_row(
                    "SELECT parent_id FROM regions WHERE id = ?1",
                    [&current],
                    |row| row.get(0),
                )
                .optional()?
                .ok_or_else(|| GrimoriumError::RegionNotFound(current.clone()))?;
            match parent {
                Some(pid) if pid == region_id => return Ok(true),
                Some(pid) => current = pid,
                None => return Ok(false),
            }
        }
    }
}

impl RegionStore for SqliteRegionStore {
    fn load_forest(&self, book_id: &str) -> Result<Vec<RegionNode>> {
        Ok(build_forest(&self.list_regions(book_id)?))
    }

    fn persist_reparent(&mut self, region_id: &str, new_parent_id: Option<&str>) -> Result<()> {
        // 1. Self-parent check
        if new_parent_id == Some(region_id) {
            return Err(GrimoriumError::InvalidMove(
                "A region cannot be its own parent".to_string(),
            ));
        }

        let region = self.get_region(region_id)?;

        // 2. Same book and cycle check on the new parent
        if let Some(pid) = new_parent_id {
            let parent = self.get_region(pid)?;
            if parent.book_id != region.book_id {
                return Err(GrimoriumError::InvalidMove(format!(
                    "Region {pid} belongs to a different book"
                )));
            }
            if self.is_ancestor_of(region_id, pid)? {
                return Err(GrimoriumError::InvalidMove(
                    "Move would create a cycle".to_string(),
                ));
            }
        }

        // 3. Already there
        if region.parent_id.as_deref() == new_parent_id {
            log::debug!("reparent of {region_id} is a no-op");
            return Ok(());
        }

        let now = chrono::Utc::now().timestamp_millis();
        let tx = self.storage.connection_mut().transaction()?;

        // 4. Close the gap in the old sibling group
        close_gap(&tx, &region)?;

        // 5. Append to the new sibling group
        let new_order_index =
            next_order_index(&tx, &region.book_id, new_parent_id, Some(region_id))?;
        tx.execute(
            "UPDATE regions SET parent_id = ?1, order_index = ?2, updated_at = ?3 WHERE id = ?4",
            rusqlite::params![new_parent_id, new_order_index, now, region_id],
        )?;

        // 6. Log
        let op = Operation::MoveRegion {
            operation_id: Uuid::new_v4().to_string(),
            timestamp: now / 1000,
            region_id: region_id.to_string(),
            new_parent_id: new_parent_id.map(str::to_string),
            new_order_index,
        };
        self.operation_log.log(&tx, &op)?;
        self.operation_log.purge_if_needed(&tx)?;

        tx.commit()?;
        log::info!("region {region_id} reparented to {new_parent_id:?}");
        Ok(())
    }

    fn persist_reorder(&mut self, sibling_ids: &[String], parent_id: Option<&str>) -> Result<()> {
        let Some(first) = sibling_ids.first() else {
            return Ok(());
        };

        let distinct: HashSet<&String> = sibling_ids.iter().collect();
        if distinct.len() != sibling_ids.len() {
            return Err(GrimoriumError::InvalidMove(
                "Sibling order contains duplicate regions".to_string(),
            ));
        }

        let book_id = self.get_region(first)?.book_id;
        for id in sibling_ids {
            let region = self.get_region(id)?;
            if region.book_id != book_id || region.parent_id.as_deref() != parent_id {
                return Err(GrimoriumError::InvalidMove(format!(
                    "Region {id} is not a child of {}",
                    parent_id.unwrap_or("the top level")
                )));
            }
        }

        let now = chrono::Utc::now().timestamp_millis();
        let tx = self.storage.connection_mut().transaction()?;

        // Siblings the caller did not list keep their relative order after the listed ones.
        let current = child_ids(&tx, &book_id, parent_id)?;
        let mut final_order: Vec<String> = sibling_ids.to_vec();
        final_order.extend(current.iter().filter(|id| !distinct.contains(id)).cloned());

        let mut changed = false;
        for (index, id) in final_order.iter().enumerate() {
            changed |= tx.execute(
                "UPDATE regions SET order_index = ?1, updated_at = ?2
                 WHERE id = ?3 AND order_index != ?1",
                rusqlite::params![index as i32, now, id],
            )? > 0;
        }

        if !changed {
            log::debug!("reorder under {parent_id:?} is a no-op");
            return Ok(());
        }

        let op = Operation::ReorderRegions {
            operation_id: Uuid::new_v4().to_string(),
            timestamp: now / 1000,
            parent_id: parent_id.map(str::to_string),
            ordered_ids: final_order,
        };
        self.operation_log.log(&tx, &op)?;
        self.operation_log.purge_if_needed(&tx)?;

        tx.commit()?;
        Ok(())
    }
}

/// Position one past the last sibling under `parent_id`, ignoring `exclude`.
/// Shifts the siblings after `region` up by one, as if it had left its parent.
fn close_gap(tx: &Transaction, region: &Region) -> Result<()> {
    tx.execute(
        "UPDATE regions SET order_index = order_index - 1
         WHERE book_id = ?1 AND parent_id IS ?2 AND order_index > ?3 AND id != ?4",
        rusqlite::params![region.book_id, region.parent_id, region.order_index, region.id],
    )?;
    Ok(())
}

fn next_order_index(
    tx: &Transaction,
    book_id: &str,
    parent_id: Option<&str>,
    exclude: Option<&str>,
) -> Result<i32> {
    let next: i32 = tx.query_row(
        "SELECT COALESCE(MAX(order_index), -1) + 1 FROM regions
         WHERE book_id = ?1 AND parent_id IS ?2 AND id IS NOT ?3",
        rusqlite::params![book_id, parent_id, exclude],
        |row| row.get(0),
    )?;
    Ok(next)
}

fn child_ids(tx: &Transaction, book_id: &str, parent_id: Option<&str>) -> Result<Vec<String>> {
    let mut stmt = tx.prepare(
        "SELECT id FROM regions WHERE book_id = ?1 AND parent_id IS ?2
         ORDER BY order_index, created_at, id",
    )?;
    let ids = stmt
        .query_map(rusqlite::params![book_id, parent_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(ids)
}

/// `region_id` followed by all of its descendants, parents before children.
fn subtree_ids(tx: &Transaction, region_id: &str) -> Result<Vec<String>> {
    let mut stmt = tx.prepare(
        "WITH RECURSIVE subtree(id, depth) AS (
             SELECT ?1, 0
             UNION
             SELECT r.id, s.depth + 1 FROM regions r JOIN subtree s ON r.parent_id = s.id
             WHERE s.depth < 10000
         )
         SELECT id FROM subtree GROUP BY id ORDER BY MIN(depth)",
    )?;
    let ids = stmt
        .query_map([region_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(ids)
}

type RegionRow = (String, String, String, Option<String>, String, i32, i64, i64);

fn map_region_row(row: &rusqlite::Row) -> rusqlite::Result<RegionRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn region_from_row(
    (id, book_id, name, parent_id, scale, order_index, created_at, updated_at): RegionRow,
) -> Result<Region> {
    Ok(Region {
        id,
        book_id,
        name,
        parent_id,
        scale: scale.parse()?,
        order_index,
        created_at,
        updated_at,
    })
}
