//! Database connection strings.
//!
//! Accepts the `sqlite://` URL forms used by the command line as well as
//! bare filesystem paths:
//!
//! | Input                      | Location            |
//! |----------------------------|---------------------|
//! | `sqlite://`                | in-memory           |
//! | `sqlite://:memory:`        | in-memory           |
//! | `sqlite://invent.db`       | `invent.db`         |
//! | `sqlite:///var/lib/inv.db` | `/var/lib/inv.db`   |
//! | `inventory/invent.db`      | `inventory/invent.db` |

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use rusqlite::Connection;
use tracing::debug;

use crate::error::{Result, StoreError};

/// Where the inventory database lives.
///
/// # Examples
///
/// ```
/// use invent_sqlite::DatabaseLocation;
/// use std::path::PathBuf;
///
/// let memory: DatabaseLocation = "sqlite://".parse().unwrap();
/// assert_eq!(memory, DatabaseLocation::Memory);
///
/// let absolute: DatabaseLocation = "sqlite:///srv/invent.db".parse().unwrap();
/// assert_eq!(absolute, DatabaseLocation::File(PathBuf::from("/srv/invent.db")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    Memory,
    File(PathBuf),
}

impl DatabaseLocation {
    /// Opens a connection with foreign keys enabled.
    pub fn open(&self) -> Result<Connection> {
        debug!(location = %self, "opening database");
        let conn = match self {
            DatabaseLocation::Memory => Connection::open_in_memory()?,
            DatabaseLocation::File(path) => Connection::open(path)?,
        };
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }
}

impl FromStr for DatabaseLocation {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err(StoreError::ConversionError(
                "empty database location".to_string(),
            ));
        }
        let path = match raw.split_once("://") {
            Some(("sqlite", rest)) => rest,
            Some((scheme, _)) => {
                return Err(StoreError::ConversionError(format!(
                    "unsupported database scheme '{scheme}' (only sqlite:// is supported)"
                )));
            }
            None => raw,
        };
        if path.is_empty() || path == ":memory:" {
            Ok(DatabaseLocation::Memory)
        } else {
            Ok(DatabaseLocation::File(PathBuf::from(path)))
        }
    }
}

impl fmt::Display for DatabaseLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseLocation::Memory => f.write_str("sqlite://"),
            DatabaseLocation::File(path) => write!(f, "sqlite://{}", path.display()),
        }
    }
}
