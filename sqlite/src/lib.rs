//! SQLite storage backend for the inventory.
//!
//! This crate persists [`Realm`](invent_core::Realm),
//! [`Item`](invent_core::Item) and [`Label`](invent_core::Label) records in
//! a normalized SQLite schema. It includes a versioned migration history,
//! conversion between domain types and SQL rows, and a high-level store.
//!
//! # Architecture
//!
//! - **`schema`**: the ordered list of schema revisions
//! - **`migration`**: lifecycle operations (up/down/migrate_to/status)
//! - **`convert`**: row ↔ domain type transformations
//! - **`connect`**: connection strings
//! - **`query`**: runtime inventory access (CRUD operations)
//!
//! # Quick start: migrations
//!
//! ```no_run
//! use invent_sqlite::{DatabaseLocation, Migration};
//!
//! let location: DatabaseLocation = "sqlite://invent.db".parse().unwrap();
//! let mut migration = Migration::new(location.open().unwrap()).unwrap();
//!
//! migration.up().unwrap();
//!
//! let status = migration.status().unwrap();
//! println!("Items: {}", status.item_count);
//! ```
//!
//! # Quick start: queries
//!
//! ```no_run
//! use invent_core::{ItemFilter, Pagination, SortKey};
//! use invent_sqlite::InventoryStore;
//! use rusqlite::Connection;
//!
//! let conn = Connection::open("invent.db").unwrap();
//! let store = InventoryStore::new(&conn).unwrap();
//!
//! let filter = ItemFilter::default().owned_by("Alice").active(true);
//! for entry in store.list_items(&filter, SortKey::default(), Pagination::default()).unwrap() {
//!     println!("{}:  {}", entry.display_number(), entry.item.title);
//! }
//! ```

mod connect;
mod convert;
mod error;
mod migration;
mod query;
mod schema;

pub use connect::DatabaseLocation;
pub use error::{Result, StoreError};
pub use migration::{Migration, MigrationStatus};
pub use query::{DeleteMode, InventoryStore};
pub use schema::{MIGRATIONS, MigrationStep, latest_version};
