//! Listing parameters: filters, sort keys and pagination.
//!
//! These types describe *what* to list; the store translates them into SQL.
//! Sort keys form a closed set so an unknown column name is rejected at the
//! interface boundary instead of reaching the database.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Number of items listed when no limit is given.
pub const DEFAULT_LIST_LIMIT: u64 = 20;

/// Item attribute to order listings by (always descending).
///
/// # Examples
///
/// ```
/// use invent_core::SortKey;
///
/// let key: SortKey = "created_at".parse().unwrap();
/// assert_eq!(key, SortKey::CreatedAt);
/// assert_eq!(key.column(), "created_at");
/// assert_eq!(SortKey::default(), SortKey::UpdatedAt);
///
/// let err = "colour".parse::<SortKey>().unwrap_err();
/// assert!(err.to_string().starts_with("invalid sort key 'colour'"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    Id,
    InventoryNumber,
    Title,
    Owner,
    ResourceUrl,
    CreatedAt,
    #[default]
    UpdatedAt,
    RealmId,
    IsActive,
    IsLabeled,
}

impl SortKey {
    /// All sort keys, in declaration order.
    pub const ALL: [SortKey; 10] = [
        SortKey::Id,
        SortKey::InventoryNumber,
        SortKey::Title,
        SortKey::Owner,
        SortKey::ResourceUrl,
        SortKey::CreatedAt,
        SortKey::UpdatedAt,
        SortKey::RealmId,
        SortKey::IsActive,
        SortKey::IsLabeled,
    ];

    /// Column name in the `items` table.
    pub fn column(self) -> &'static str {
        match self {
            SortKey::Id => "id",
            SortKey::InventoryNumber => "inventory_number",
            SortKey::Title => "title",
            SortKey::Owner => "owner",
            SortKey::ResourceUrl => "resource_url",
            SortKey::CreatedAt => "created_at",
            SortKey::UpdatedAt => "updated_at",
            SortKey::RealmId => "realm_id",
            SortKey::IsActive => "is_active",
            SortKey::IsLabeled => "is_labeled",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Error returned when parsing an unknown sort key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid sort key '{key}' (expected one of: {expected})")]
pub struct ParseSortKeyError {
    pub key: String,
    expected: String,
}

impl FromStr for SortKey {
    type Err = ParseSortKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_");
        SortKey::ALL
            .into_iter()
            .find(|key| key.column() == wanted)
            .ok_or_else(|| ParseSortKeyError {
                key: s.to_string(),
                expected: SortKey::ALL
                    .iter()
                    .map(|key| key.column())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// Conjunctive item filter. Absent predicates match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    /// Realm prefix or identity.
    pub realm: Option<String>,
    pub owner: Option<String>,
    pub is_active: Option<bool>,
    pub is_labeled: Option<bool>,
}

impl ItemFilter {
    pub fn in_realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = Some(realm.into());
        self
    }

    pub fn owned_by(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    pub fn labeled(mut self, is_labeled: bool) -> Self {
        self.is_labeled = Some(is_labeled);
        self
    }
}

/// Which realms to include when listing realms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RealmFilter {
    pub internal: bool,
    pub external: bool,
}

impl Default for RealmFilter {
    fn default() -> Self {
        Self {
            internal: true,
            external: true,
        }
    }
}

/// Offset/limit window over a listing.
///
/// # Examples
///
/// ```
/// use invent_core::Pagination;
///
/// assert_eq!(Pagination::from_signed(0, 5).limit, None);
/// assert_eq!(Pagination::from_signed(-1, 0).limit, None);
/// assert_eq!(Pagination::from_signed(10, -3), Pagination { limit: Some(10), offset: 0 });
/// assert_eq!(Pagination::default().limit, Some(20));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// `None` means unbounded.
    pub limit: Option<u64>,
    pub offset: u64,
}

impl Pagination {
    pub fn unbounded() -> Self {
        Self {
            limit: None,
            offset: 0,
        }
    }

    /// Builds a window from signed command-line values; a limit of zero or
    /// less is unbounded and a negative offset is clamped to zero.
    pub fn from_signed(limit: i64, offset: i64) -> Self {
        Self {
            limit: u64::try_from(limit).ok().filter(|limit| *limit > 0),
            offset: u64::try_from(offset).unwrap_or(0),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: Some(DEFAULT_LIST_LIMIT),
            offset: 0,
        }
    }
}
