//! Conversion between inventory types and SQLite rows.
//!
//! Timestamps are stored as RFC 3339 text with a fixed microsecond
//! precision and a `Z` suffix so that lexical order equals chronological
//! order; booleans are stored as integers.

use chrono::{DateTime, SecondsFormat, Utc};
use invent_core::{Item, ItemWithRealm, Label, Realm};
use rusqlite::Row;
use rusqlite::types::Type;

use crate::error::{Result, StoreError};

/// Realm columns, aliased `r`.
pub(crate) const REALM_COLUMNS: &str = "r.id, r.name, r.prefix, r.url_base, r.is_external";

/// Item columns, aliased `i`.
pub(crate) const ITEM_COLUMNS: &str = "i.id, i.inventory_number, i.title, i.owner, i.resource_url, \
     i.created_at, i.updated_at, i.realm_id, i.is_active, i.is_labeled";

/// Number of columns in [`ITEM_COLUMNS`].
const ITEM_COLUMN_COUNT: usize = 10;

pub(crate) const LABEL_COLUMNS: &str =
    "l.id, l.type, l.item_id, l.media_type, l.attributes, l.url, l.created_at";

/// Formats a timestamp for storage.
pub(crate) fn timestamp_to_string(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn timestamp_from_row(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Reads a realm starting at column `offset`.
pub(crate) fn realm_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Realm> {
    Ok(Realm {
        id: row.get(offset)?,
        name: row.get(offset + 1)?,
        prefix: row.get(offset + 2)?,
        url_base: row.get(offset + 3)?,
        is_external: row.get(offset + 4)?,
    })
}

/// Reads an item starting at column `offset`.
pub(crate) fn item_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(offset)?,
        inventory_number: row.get(offset + 1)?,
        title: row.get(offset + 2)?,
        owner: row.get(offset + 3)?,
        resource_url: row.get(offset + 4)?,
        created_at: timestamp_from_row(row, offset + 5)?,
        updated_at: timestamp_from_row(row, offset + 6)?,
        realm_id: row.get(offset + 7)?,
        is_active: row.get(offset + 8)?,
        is_labeled: row.get(offset + 9)?,
    })
}

/// Reads a row selected as `ITEM_COLUMNS, REALM_COLUMNS`.
pub(crate) fn item_with_realm_from_row(row: &Row<'_>) -> rusqlite::Result<ItemWithRealm> {
    Ok(ItemWithRealm {
        item: item_from_row(row, 0)?,
        realm: realm_from_row(row, ITEM_COLUMN_COUNT)?,
    })
}

pub(crate) fn label_from_row(row: &Row<'_>) -> rusqlite::Result<Label> {
    Ok(Label {
        id: row.get(0)?,
        label_type: row.get(1)?,
        item_id: row.get(2)?,
        media_type: row.get(3)?,
        attributes: row.get(4)?,
        url: row.get(5)?,
        created_at: timestamp_from_row(row, 6)?,
    })
}

/// Converts an SQL row count.
pub(crate) fn count_to_usize(count: i64) -> Result<usize> {
    usize::try_from(count)
        .map_err(|_| StoreError::ConversionError(format!("invalid row count {count}")))
}

/// Returns `true` if `err` is a UNIQUE violation on `table.column`.
pub(crate) fn is_unique_violation(err: &rusqlite::Error, column: &str) -> bool {
    match err {
        // The extended code identifies the constraint kind; only the message
        // names the column.
        rusqlite::Error::SqliteFailure(failure, Some(message)) => {
            failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                && message.contains(column)
        }
        _ => false,
    }
}
