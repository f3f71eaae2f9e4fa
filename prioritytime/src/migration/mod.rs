//! Versioned schema migrations.
//!
//! The schema version lives in `PRAGMA user_version`. A fresh database is
//! created at version 1 and then walked forward through [`MIGRATIONS`] one
//! step at a time, each step in its own transaction. Every applied step is
//! also written to `migration_history`.

use crate::error::{PriorityError, Result};
use rusqlite::{params, Connection};

/// Name of the leisure table at [`LATEST_VERSION`].
pub const TABLE: &str = "Tasks";

pub const LATEST_VERSION: u32 = 2;

const SCHEMA_V1: &str = "
    CREATE TABLE IF NOT EXISTS LeisureEntity (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        counter INTEGER NOT NULL DEFAULT 0,
        ancestry TEXT NOT NULL,
        updated TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS index_ancestry ON LeisureEntity(ancestry);
";

/// A single schema step from version `from` to version `to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub from: u32,
    pub to: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

pub const MIGRATION_1_2: Migration = Migration {
    from: 1,
    to: 2,
    description: "Rename LeisureEntity to Tasks",
    sql: "ALTER TABLE LeisureEntity RENAME TO Tasks;",
};

/// All known migrations, oldest first.
pub const MIGRATIONS: &[Migration] = &[MIGRATION_1_2];

impl Migration {
    /// Apply this step. Fails without touching the schema if the database is
    /// not at version `from`.
    pub fn apply(&self, conn: &mut Connection) -> Result<()> {
        let tx = conn.transaction()?;

        let found = schema_version(&tx)?;
        if found != self.from {
            return Err(PriorityError::Migration(format!(
                "migration {}->{} ({}) expects schema version {}, database is at {}",
                self.from, self.to, self.description, self.from, found
            )));
        }

        tx.execute_batch(self.sql).map_err(|e| {
            PriorityError::Migration(format!(
                "migration {}->{} ({}) failed: {e}",
                self.from, self.to, self.description
            ))
        })?;
        set_schema_version(&tx, self.to)?;
        record_migration(&tx, self.to, self.description)?;
        tx.commit()?;

        log::info!(
            "Applied migration {}->{}: {}",
            self.from,
            self.to,
            self.description
        );
        Ok(())
    }
}

/// Bring a database of any known version up to [`LATEST_VERSION`].
/// Returns the versions that were applied, in order.
pub fn initialize(conn: &mut Connection) -> Result<Vec<u32>> {
    ensure_history_table(conn)?;

    let mut applied = Vec::new();
    if schema_version(conn)? == 0 {
        let tx = conn.transaction()?;
        tx.execute_batch(SCHEMA_V1)?;
        set_schema_version(&tx, 1)?;
        record_migration(&tx, 1, "Create LeisureEntity")?;
        tx.commit()?;
        log::debug!("Created schema version 1");
        applied.push(1);
    }

    applied.extend(migrate(conn, MIGRATIONS, LATEST_VERSION)?);
    Ok(applied)
}

/// Walk the database from its current version to `target` using
/// `migrations`.
pub fn migrate(conn: &mut Connection, migrations: &[Migration], target: u32) -> Result<Vec<u32>> {
    validate_registry(migrations)?;

    let mut current = schema_version(conn)?;
    if current > target {
        return Err(PriorityError::Migration(format!(
            "database schema version {current} is newer than supported version {target}"
        )));
    }

    let mut applied = Vec::new();
    while current < target {
        let step = migrations
            .iter()
            .find(|m| m.from == current)
            .ok_or_else(|| {
                PriorityError::Migration(format!(
                    "no migration registered from schema version {current}"
                ))
            })?;
        if step.to > target {
            return Err(PriorityError::Migration(format!(
                "migration {}->{} overshoots target version {target}",
                step.from, step.to
            )));
        }
        step.apply(conn)?;
        current = step.to;
        applied.push(current);
    }

    Ok(applied)
}

/// Reject registries that are not a single ascending chain.
pub fn validate_registry(migrations: &[Migration]) -> Result<()> {
    for m in migrations {
        if m.to <= m.from {
            return Err(PriorityError::Migration(format!(
                "migration {}->{} does not move forward",
                m.from, m.to
            )));
        }
    }
    for pair in migrations.windows(2) {
        if pair[1].from != pair[0].to {
            return Err(PriorityError::Migration(format!(
                "migrations out of order: {}->{} followed by {}->{}",
                pair[0].from, pair[0].to, pair[1].from, pair[1].to
            )));
        }
    }
    Ok(())
}

pub fn schema_version(conn: &Connection) -> Result<u32> {
    let version = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    Ok(version)
}

fn set_schema_version(conn: &Connection, version: u32) -> Result<()> {
    // PRAGMA values cannot be bound as parameters.
    conn.execute_batch(&format!("PRAGMA user_version = {version}"))?;
    Ok(())
}

fn ensure_history_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS migration_history (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        ",
    )?;
    Ok(())
}

fn record_migration(conn: &Connection, version: u32, description: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO migration_history (version, description) VALUES (?1, ?2)",
        params![version, description],
    )?;
    Ok(())
}

/// Applied migrations as `(version, description)`, oldest first.
pub fn history(conn: &Connection) -> Result<Vec<(u32, String)>> {
    let mut stmt =
        conn.prepare("SELECT version, description FROM migration_history ORDER BY version")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(row?);
    }
    Ok(entries)
}
