//! Versioned SQL schema.
//!
//! The schema is expressed as an ordered list of [`MigrationStep`]s. Each
//! step carries the SQL to apply it and the SQL to revert it; the
//! [`Migration`](crate::Migration) manager records applied steps in the
//! `schema_migrations` table.
//!
//! # Table structure
//!
//! - `realms`: inventory-number namespaces (`prefix` is unique)
//! - `items`: tracked assets, each referencing exactly one realm
//!   (`inventory_number` is unique)
//! - `labels`: generated label records, removed with their item

/// One schema revision.
#[derive(Debug, Clone, Copy)]
pub struct MigrationStep {
    /// Monotonically increasing revision number, starting at 1.
    pub version: u32,
    /// Short machine-friendly name.
    pub name: &'static str,
    pub(crate) up: &'static str,
    pub(crate) down: &'static str,
}

/// Bookkeeping table recording applied revisions.
pub(crate) const MIGRATIONS_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
);
"#;

/// All schema revisions in application order.
pub const MIGRATIONS: &[MigrationStep] = &[
    MigrationStep {
        version: 1,
        name: "initial",
        up: r#"
CREATE TABLE realms (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    prefix TEXT NOT NULL UNIQUE,
    url_base TEXT,
    is_external INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    inventory_number TEXT UNIQUE,
    title TEXT NOT NULL,
    owner TEXT,
    resource_url TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    realm_id INTEGER NOT NULL,
    FOREIGN KEY (realm_id) REFERENCES realms(id)
);

CREATE TABLE labels (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    type TEXT NOT NULL,
    item_id INTEGER NOT NULL,
    media_type TEXT,
    attributes TEXT NOT NULL DEFAULT '{}',
    url TEXT,
    created_at TEXT NOT NULL,
    FOREIGN KEY (item_id) REFERENCES items(id) ON DELETE CASCADE
);

CREATE INDEX idx_items_realm ON items(realm_id);
CREATE INDEX idx_labels_item ON labels(item_id);
"#,
        down: r#"
DROP TABLE IF EXISTS labels;
DROP TABLE IF EXISTS items;
DROP TABLE IF EXISTS realms;
"#,
    },
    MigrationStep {
        version: 2,
        name: "item_flags",
        up: r#"
ALTER TABLE items ADD COLUMN is_labeled INTEGER NOT NULL DEFAULT 0;
ALTER TABLE items ADD COLUMN is_active INTEGER NOT NULL DEFAULT 1;
"#,
        down: r#"
ALTER TABLE items DROP COLUMN is_active;
ALTER TABLE items DROP COLUMN is_labeled;
"#,
    },
    MigrationStep {
        version: 3,
        name: "inventory_number_index",
        up: r#"
CREATE INDEX ix_items_inventory_number ON items(inventory_number);
"#,
        down: r#"
DROP INDEX IF EXISTS ix_items_inventory_number;
"#,
    },
];

/// The newest schema revision.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |step| step.version)
}
