//! Migration lifecycle operations for the inventory schema.
//!
//! Provides [`Migration`] for upgrading and downgrading the database along
//! the revision history in [`MIGRATIONS`](crate::MIGRATIONS). Every step
//! runs inside its own transaction together with its bookkeeping row, so an
//! interrupted run leaves the database at a well-defined revision.
//!
//! # Example
//!
//! ```no_run
//! use invent_sqlite::Migration;
//! use rusqlite::Connection;
//!
//! let conn = Connection::open("invent.db").unwrap();
//! let mut migration = Migration::new(conn).unwrap();
//!
//! // Bring the schema up to date
//! let applied = migration.up().unwrap();
//! println!("applied {} step(s)", applied.len());
//!
//! // Check status
//! let status = migration.status().unwrap();
//! assert!(status.is_current());
//! ```

use chrono::Utc;
use rusqlite::{Connection, params};
use tracing::{debug, info};

use crate::convert::count_to_usize;
use crate::error::{Result, StoreError};
use crate::schema::{MIGRATIONS, MIGRATIONS_TABLE_SQL, MigrationStep, latest_version};

/// Manages the revision history of the inventory schema.
///
/// Owns the connection for the duration of the migration work; use
/// [`into_connection`](Self::into_connection) to hand it on to an
/// [`InventoryStore`](crate::InventoryStore) afterwards.
pub struct Migration {
    conn: Connection,
}

impl Migration {
    /// Creates a migration manager for the given connection.
    pub fn new(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    /// Returns the highest applied revision, or 0 for an empty database.
    pub fn current_version(&self) -> Result<u32> {
        if !self.table_exists("schema_migrations")? {
            return Ok(0);
        }
        let version: Option<u32> =
            self.conn
                .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                    row.get(0)
                })?;
        Ok(version.unwrap_or(0))
    }

    /// Applies every pending revision.
    ///
    /// Safe to call repeatedly; returns the names of the steps applied by
    /// this call (empty when already current).
    pub fn up(&mut self) -> Result<Vec<&'static str>> {
        self.migrate_to(latest_version())
    }

    /// Reverts every applied revision, dropping all inventory tables.
    pub fn down(&mut self) -> Result<Vec<&'static str>> {
        self.migrate_to(0)
    }

    /// Upgrades or downgrades to the given revision.
    ///
    /// Returns the names of the steps applied (upgrade) or reverted
    /// (downgrade), in the order they ran.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MigrationError`] if `target` is beyond the
    /// newest known revision or a step fails; the failing step is rolled
    /// back and earlier steps stay applied.
    pub fn migrate_to(&mut self, target: u32) -> Result<Vec<&'static str>> {
        let latest = latest_version();
        if target > latest {
            return Err(StoreError::MigrationError(format!(
                "unknown target version {target} (latest is {latest})"
            )));
        }
        self.conn.execute_batch(MIGRATIONS_TABLE_SQL)?;

        let current = self.current_version()?;
        let mut ran = Vec::new();

        if target >= current {
            for step in MIGRATIONS
                .iter()
                .filter(|step| step.version > current && step.version <= target)
            {
                self.apply(step)?;
                ran.push(step.name);
            }
        } else {
            for step in MIGRATIONS
                .iter()
                .rev()
                .filter(|step| step.version > target && step.version <= current)
            {
                self.revert(step)?;
                ran.push(step.name);
            }
        }

        if ran.is_empty() {
            debug!(version = current, "schema already at target version");
        }
        Ok(ran)
    }

    /// Fails with [`StoreError::NotInitialized`] unless the schema is current.
    pub fn ensure_current(&self) -> Result<()> {
        let current = self.current_version()?;
        let latest = latest_version();
        if current != latest {
            return Err(StoreError::NotInitialized { current, latest });
        }
        Ok(())
    }

    /// Returns the current status of the migration history.
    pub fn status(&self) -> Result<MigrationStatus> {
        let current_version = self.current_version()?;
        let pending = MIGRATIONS
            .iter()
            .filter(|step| step.version > current_version)
            .map(|step| step.name.to_string())
            .collect();

        let (realm_count, item_count, label_count) = if current_version >= 1 {
            (
                self.count_rows("realms")?,
                self.count_rows("items")?,
                self.count_rows("labels")?,
            )
        } else {
            (0, 0, 0)
        };

        Ok(MigrationStatus {
            current_version,
            latest_version: latest_version(),
            pending,
            realm_count,
            item_count,
            label_count,
        })
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Consumes the migration and returns the underlying connection.
    pub fn into_connection(self) -> Connection {
        self.conn
    }

    fn apply(&mut self, step: &MigrationStep) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(step.up).map_err(|e| {
            StoreError::MigrationError(format!("failed to apply '{}': {e}", step.name))
        })?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![step.version, step.name, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        info!(version = step.version, name = step.name, "applied migration");
        Ok(())
    }

    fn revert(&mut self, step: &MigrationStep) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(step.down).map_err(|e| {
            StoreError::MigrationError(format!("failed to revert '{}': {e}", step.name))
        })?;
        tx.execute(
            "DELETE FROM schema_migrations WHERE version = ?1",
            params![step.version],
        )?;
        tx.commit()?;
        info!(version = step.version, name = step.name, "reverted migration");
        Ok(())
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn count_rows(&self, table: &str) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })?;
        count_to_usize(count)
    }
}

/// Status of the migration history.
///
/// Returned by [`Migration::status`], providing the applied and newest
/// revision along with row counts of the inventory tables.
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Highest applied revision (0 when nothing is applied).
    pub current_version: u32,
    /// Newest revision known to this build.
    pub latest_version: u32,
    /// Names of revisions not yet applied.
    pub pending: Vec<String>,
    pub realm_count: usize,
    pub item_count: usize,
    pub label_count: usize,
}

impl MigrationStatus {
    /// Whether every known revision has been applied.
    pub fn is_current(&self) -> bool {
        self.current_version == self.latest_version
    }
}
