//! Core inventory types and domain rules.
//!
//! This crate defines the foundational types for tracking physical items:
//!
//! - [`Realm`]: an organizational namespace whose unique prefix is
//!   embedded in every inventory number it issues.
//! - [`Item`]: a tracked asset belonging to exactly one realm.
//! - [`Label`]: a record of a generated label.
//!
//! Inventory numbers are derived by [`InventoryNumberFormat`]; realms are
//! picked by [`RealmSelector`]; listings are described by [`ItemFilter`],
//! [`SortKey`] and [`Pagination`]. Validation ([`validate_new_item`],
//! [`validate_new_realm`], [`validate_update`]) runs before any mutation.
//!
//! # Example
//!
//! ```
//! use invent_core::*;
//!
//! let realm = NewRealm::new("LAB", "Laboratory");
//! assert!(validate_new_realm(&realm).is_ok());
//!
//! let format = InventoryNumberFormat::default();
//! assert_eq!(format.format(&realm.prefix, 1), "LAB-000001");
//! ```

mod inventory;
mod query;
mod selector;
mod types;
mod validate;

pub use inventory::{DEFAULT_INVENTORY_NUMBER_FORMAT, InventoryNumberError, InventoryNumberFormat};
pub use query::{
    DEFAULT_LIST_LIMIT, ItemFilter, Pagination, ParseSortKeyError, RealmFilter, SortKey,
};
pub use selector::RealmSelector;
pub use types::*;
pub use validate::{ValidationError, validate_new_item, validate_new_realm, validate_update};
