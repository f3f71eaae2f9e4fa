use crate::ancestry::AncestryPath;
use crate::error::{PriorityError, Result};
use crate::migration::{self, TABLE};
use crate::model::{LeisureEntity, NewLeisure};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;

/// The full ordered listing, shared between all subscribers.
pub type Snapshot = Arc<Vec<LeisureEntity>>;

/// Connection tuning applied when a database file is opened.
#[derive(Debug, Clone)]
pub struct DaoOptions {
    pub busy_timeout: Duration,
    pub wal: bool,
}

impl Default for DaoOptions {
    fn default() -> Self {
        DaoOptions {
            busy_timeout: Duration::from_millis(5000),
            wal: true,
        }
    }
}

struct Inner {
    conn: Connection,
    /// Last seen `PRAGMA data_version`, used to notice commits made by other
    /// connections.
    data_version: i64,
}

/// Query surface over the leisure table. Holds no policy: counters and
/// ancestries arrive already computed.
///
/// Every write runs in a transaction and, once committed, republishes the
/// ordered listing to subscribers.
pub struct LeisureDao {
    inner: Mutex<Inner>,
    snapshots: watch::Sender<Snapshot>,
}

impl LeisureDao {
    /// Open or create the database at the given path and migrate it.
    pub fn open(path: &Path, options: &DaoOptions) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(options.busy_timeout)?;
        if options.wal {
            // journal_mode answers with the resulting mode.
            let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
            log::debug!("Journal mode for {}: {mode}", path.display());
        }
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        let applied = migration::initialize(&mut conn)?;
        if !applied.is_empty() {
            log::info!("Schema migrated through versions {applied:?}");
        }

        let data_version = read_data_version(&conn)?;
        let initial = Arc::new(query_all(&conn)?);
        let (snapshots, _) = watch::channel(initial);

        Ok(LeisureDao {
            inner: Mutex::new(Inner { conn, data_version }),
            snapshots,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| PriorityError::Other("leisure database lock poisoned".into()))
    }

    /// Republish the listing. Called with the lock held so snapshots go out in
    /// commit order.
    ///
    /// Runs after a commit, so a failure here is logged and not returned: the
    /// write itself already happened. `data_version` is left alone on failure
    /// and the next `refresh` tries again.
    fn publish(&self, inner: &mut Inner) -> bool {
        let published = query_all(&inner.conn).and_then(|rows| {
            inner.data_version = read_data_version(&inner.conn)?;
            self.snapshots.send_replace(Arc::new(rows));
            Ok(())
        });
        match published {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to publish leisure snapshot: {e}");
                false
            }
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Lowest counter among the nodes whose ancestry is exactly `ancestry`,
    /// or 0 when there are none.
    pub fn get_lowest_counter(&self, ancestry: &AncestryPath) -> Result<i64> {
        let inner = self.lock()?;
        let lowest: Option<i64> = inner.conn.query_row(
            &format!("SELECT MIN(counter) FROM {TABLE} WHERE ancestry = ?1"),
            params![ancestry],
            |row| row.get(0),
        )?;
        Ok(lowest.unwrap_or(0))
    }

    /// All leisures ordered by ancestry, then id.
    pub fn get_leisures(&self) -> Result<Vec<LeisureEntity>> {
        let inner = self.lock()?;
        query_all(&inner.conn)
    }

    /// Point lookup by id.
    pub fn get_leisure(&self, id: i64) -> Result<LeisureEntity> {
        let inner = self.lock()?;
        inner
            .conn
            .query_row(
                &format!("SELECT id, name, counter, ancestry, updated FROM {TABLE} WHERE id = ?1"),
                params![id],
                entity_from_row,
            )
            .optional()?
            .ok_or(PriorityError::NotFound { id })
    }

    pub fn get_ancestry(&self, id: i64) -> Result<AncestryPath> {
        let inner = self.lock()?;
        inner
            .conn
            .query_row(
                &format!("SELECT ancestry FROM {TABLE} WHERE id = ?1"),
                params![id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(PriorityError::NotFound { id })
    }

    pub fn get_leisure_counter(&self, id: i64) -> Result<i64> {
        let inner = self.lock()?;
        inner
            .conn
            .query_row(
                &format!("SELECT counter FROM {TABLE} WHERE id = ?1"),
                params![id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(PriorityError::NotFound { id })
    }

    /// Number of nodes whose ancestry is exactly `ancestry`.
    pub fn count_at(&self, ancestry: &AncestryPath) -> Result<i64> {
        let inner = self.lock()?;
        let count = inner.conn.query_row(
            &format!("SELECT COUNT(*) FROM {TABLE} WHERE ancestry = ?1"),
            params![ancestry],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn count(&self) -> Result<i64> {
        let inner = self.lock()?;
        let count = inner
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {TABLE}"), [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn schema_version(&self) -> Result<u32> {
        let inner = self.lock()?;
        migration::schema_version(&inner.conn)
    }

    /// Applied migrations as `(version, description)`.
    pub fn migration_history(&self) -> Result<Vec<(u32, String)>> {
        let inner = self.lock()?;
        migration::history(&inner.conn)
    }

    // ── Live listing ─────────────────────────────────────────────────

    /// Subscribe to the ordered listing. The subscription holds the current
    /// snapshot right away and sees every later commit.
    pub fn subscribe(&self) -> LeisureSubscription {
        LeisureSubscription::new(self.snapshots.subscribe())
    }

    /// Pick up commits made through other connections to the same file.
    /// Returns whether a new snapshot was published.
    pub fn refresh(&self) -> Result<bool> {
        let mut inner = self.lock()?;
        let current = read_data_version(&inner.conn)?;
        if current == inner.data_version {
            return Ok(false);
        }
        log::debug!("External change detected (data_version {current})");
        Ok(self.publish(&mut inner))
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Insert a leisure and return its assigned id.
    ///
    /// A non-root ancestry must name a parent that exists, at exactly the
    /// ancestry the path implies. The check and the insert share one
    /// statement, so a concurrent removal of the parent either happens first
    /// (and this fails with `ParentNotFound`) or removes the new row with it.
    pub fn add_leisure(&self, leisure: &NewLeisure) -> Result<i64> {
        let mut inner = self.lock()?;
        let tx = inner.conn.transaction()?;
        let inserted = match (leisure.ancestry.parent_id(), leisure.ancestry.parent()) {
            (Some(parent_id), Some(parent_ancestry)) => tx.execute(
                &format!(
                    "INSERT INTO {TABLE} (name, counter, ancestry, updated)
                     SELECT ?1, ?2, ?3, ?4
                     WHERE EXISTS (SELECT 1 FROM {TABLE} WHERE id = ?5 AND ancestry = ?6)"
                ),
                params![
                    leisure.name,
                    leisure.counter,
                    leisure.ancestry,
                    leisure.updated,
                    parent_id,
                    parent_ancestry
                ],
            )?,
            _ => tx.execute(
                &format!(
                    "INSERT INTO {TABLE} (name, counter, ancestry, updated) VALUES (?1, ?2, ?3, ?4)"
                ),
                params![leisure.name, leisure.counter, leisure.ancestry, leisure.updated],
            )?,
        };
        if inserted == 0 {
            let parent = leisure.ancestry.parent_id().unwrap_or_default();
            log::warn!("Insert under {} rejected: parent {parent} is gone", leisure.ancestry);
            return Err(PriorityError::ParentNotFound { id: parent });
        }
        let id = tx.last_insert_rowid();
        tx.commit()?;

        log::debug!("Inserted leisure {id} at {}", leisure.ancestry);
        self.publish(&mut inner);
        Ok(id)
    }

    /// Add one to the counter of every id and stamp them as updated, all or
    /// nothing.
    pub fn increment_leisures(&self, ids: &[i64]) -> Result<()> {
        let mut inner = self.lock()?;
        let now = Utc::now();

        let tx = inner.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "UPDATE {TABLE} SET counter = counter + 1, updated = ?1 WHERE id = ?2"
            ))?;
            for id in ids {
                let changed = stmt.execute(params![now, id]).map_err(|e| {
                    PriorityError::Transaction {
                        operation: "increment",
                        reason: e.to_string(),
                    }
                })?;
                if changed != 1 {
                    log::warn!("Increment batch {ids:?} rolled back: leisure {id} not found");
                    return Err(PriorityError::Transaction {
                        operation: "increment",
                        reason: format!("leisure {id} not found"),
                    });
                }
            }
        }
        tx.commit().map_err(|e| PriorityError::Transaction {
            operation: "increment",
            reason: e.to_string(),
        })?;

        self.publish(&mut inner);
        Ok(())
    }

    /// Delete the node named by `scope` and its whole subtree.
    ///
    /// `scope` is the target's ancestry with the target's own id appended.
    /// The target row is matched by (parent ancestry, id) and its descendants
    /// by an indexed range over every ancestry that starts with `scope`; both
    /// go in a single statement. Returns the number of rows removed.
    pub fn remove_leisures(&self, scope: &AncestryPath) -> Result<usize> {
        let (target, parent) = match (scope.parent_id(), scope.parent()) {
            (Some(target), Some(parent)) => (target, parent),
            _ => {
                return Err(PriorityError::format(
                    &scope.to_string(),
                    "removal scope must end with the target id",
                ))
            }
        };
        let (lo, hi) = prefix_range(scope);

        let mut inner = self.lock()?;
        let tx = inner.conn.transaction()?;
        let removed = tx
            .execute(
                &format!(
                    "DELETE FROM {TABLE}
                     WHERE (ancestry = ?1 AND id = ?2)
                        OR (ancestry >= ?3 AND ancestry < ?4)"
                ),
                params![parent, target, lo, hi],
            )
            .map_err(|e| PriorityError::Transaction {
                operation: "remove",
                reason: e.to_string(),
            })?;
        tx.commit().map_err(|e| PriorityError::Transaction {
            operation: "remove",
            reason: e.to_string(),
        })?;

        log::info!("Removed {removed} leisure(s) under {scope}");
        self.publish(&mut inner);
        Ok(removed)
    }

    pub fn rename_leisure(&self, id: i64, name: &str) -> Result<()> {
        let mut inner = self.lock()?;
        let tx = inner.conn.transaction()?;
        let changed = tx.execute(
            &format!("UPDATE {TABLE} SET name = ?1 WHERE id = ?2"),
            params![name, id],
        )?;
        if changed == 0 {
            return Err(PriorityError::NotFound { id });
        }
        tx.commit()?;

        self.publish(&mut inner);
        Ok(())
    }
}

/// A live view of the ordered listing.
pub struct LeisureSubscription {
    rx: watch::Receiver<Snapshot>,
}

impl LeisureSubscription {
    pub(crate) fn new(rx: watch::Receiver<Snapshot>) -> Self {
        LeisureSubscription { rx }
    }

    /// The latest snapshot; marks it as seen.
    pub fn current(&mut self) -> Snapshot {
        self.rx.borrow_and_update().clone()
    }

    /// Whether a snapshot newer than the last one seen has been published.
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Wait for the next committed change and return the new snapshot.
    /// `None` once the database has been dropped.
    pub async fn changed(&mut self) -> Option<Snapshot> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

/// Half-open range `[lo, hi)` covering every string that starts with the
/// canonical form of `scope`. The canonical form always ends with '/', and
/// '0' is the next byte after it.
fn prefix_range(scope: &AncestryPath) -> (String, String) {
    let lo = scope.to_string();
    let mut hi = lo.clone();
    hi.pop();
    hi.push('0');
    (lo, hi)
}

fn query_all(conn: &Connection) -> Result<Vec<LeisureEntity>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT id, name, counter, ancestry, updated FROM {TABLE} ORDER BY ancestry, id"
    ))?;
    let rows = stmt.query_map([], entity_from_row)?;

    let mut leisures = Vec::new();
    for row in rows {
        leisures.push(row?);
    }
    Ok(leisures)
}

fn read_data_version(conn: &Connection) -> Result<i64> {
    let version = conn.query_row("PRAGMA data_version", [], |row| row.get(0))?;
    Ok(version)
}

fn entity_from_row(row: &Row<'_>) -> rusqlite::Result<LeisureEntity> {
    Ok(LeisureEntity {
        id: row.get(0)?,
        name: row.get(1)?,
        counter: row.get(2)?,
        ancestry: row.get(3)?,
        updated: row.get(4)?,
    })
}
