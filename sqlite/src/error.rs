//! Error types for inventory store operations.
//!
//! Provides a unified error type covering database access, migrations,
//! lookups, uniqueness violations and input validation.

use invent_core::{InventoryNumberError, RealmSelector, ValidationError};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite database operation failure.
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// A stored value could not be converted back into a domain type.
    #[error("conversion error: {0}")]
    ConversionError(String),

    /// Migration lifecycle operation failure.
    #[error("migration error: {0}")]
    MigrationError(String),

    /// The schema has not been migrated to the latest version.
    #[error("database schema is at version {current}, expected {latest}")]
    NotInitialized { current: u32, latest: u32 },

    /// No realm matches the selector.
    #[error("{0} not found")]
    RealmNotFound(RealmSelector),

    /// No item carries the inventory number.
    #[error("item not found: {0}")]
    ItemNotFound(String),

    /// Another realm already uses the prefix.
    #[error("a realm with prefix '{0}' already exists")]
    DuplicatePrefix(String),

    /// Another item already carries the inventory number.
    #[error("inventory number '{0}' is already assigned")]
    DuplicateInventoryNumber(String),

    /// Input rejected before touching the database.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Inventory-number generation failure.
    #[error(transparent)]
    InventoryNumber(#[from] InventoryNumberError),

    /// Label attributes could not be serialized.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Convenience alias for results with [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;
