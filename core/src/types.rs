//! Inventory type definitions.
//!
//! This module defines the data model shared by the store, the label
//! renderer and the command-line front end. The types are designed for
//! serialization with [`serde`] so they can be emitted as JSON listings or
//! fed into label templates unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::selector::RealmSelector;

/// An organizational namespace for items.
///
/// The `prefix` is globally unique and namespaces every inventory number
/// issued for the realm's items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Realm {
    /// Identity assigned by the store.
    pub id: i64,
    /// Human-readable name (e.g., "Laboratory").
    pub name: String,
    /// Unique inventory-number prefix (e.g., "LAB").
    pub prefix: String,
    /// Optional base URL that label QR codes resolve against.
    pub url_base: Option<String>,
    /// External realms are never picked as the default issuing realm.
    pub is_external: bool,
}

/// A realm that has not been persisted yet.
///
/// # Examples
///
/// ```
/// use invent_core::NewRealm;
///
/// let realm = NewRealm::new("LAB", "Laboratory")
///     .with_url_base("https://inventory.example.org/")
///     .external();
/// assert_eq!(realm.prefix, "LAB");
/// assert!(realm.is_external);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRealm {
    pub name: String,
    pub prefix: String,
    pub url_base: Option<String>,
    pub is_external: bool,
}

impl NewRealm {
    /// Creates an internal realm with the given prefix and name.
    pub fn new(prefix: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            url_base: None,
            is_external: false,
        }
    }

    /// Sets the base URL used for label QR codes.
    pub fn with_url_base(mut self, url_base: impl Into<String>) -> Self {
        self.url_base = Some(url_base.into());
        self
    }

    /// Marks the realm as external.
    pub fn external(mut self) -> Self {
        self.is_external = true;
        self
    }
}

/// A tracked physical asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Identity assigned by the store.
    pub id: i64,
    /// Unique, immutable once set.
    pub inventory_number: Option<String>,
    pub title: String,
    pub owner: Option<String>,
    pub resource_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Owning realm; every item belongs to exactly one.
    pub realm_id: i64,
    pub is_active: bool,
    pub is_labeled: bool,
}

/// An item that has not been persisted yet.
///
/// When `inventory_number` is `None` the store derives one from the owning
/// realm's prefix and the identity assigned on insert.
///
/// # Examples
///
/// ```
/// use invent_core::{NewItem, RealmSelector};
///
/// let item = NewItem::new("Oscilloscope")
///     .in_realm(RealmSelector::key("LAB"))
///     .with_owner("Alice");
/// assert_eq!(item.title, "Oscilloscope");
/// assert_eq!(item.owner.as_deref(), Some("Alice"));
/// assert!(item.inventory_number.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub title: String,
    pub realm: RealmSelector,
    pub inventory_number: Option<String>,
    pub owner: Option<String>,
    pub resource_url: Option<String>,
}

impl NewItem {
    /// Creates an item in the default realm.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            realm: RealmSelector::Default,
            inventory_number: None,
            owner: None,
            resource_url: None,
        }
    }

    pub fn in_realm(mut self, realm: RealmSelector) -> Self {
        self.realm = realm;
        self
    }

    pub fn with_inventory_number(mut self, number: impl Into<String>) -> Self {
        self.inventory_number = Some(number.into());
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_resource_url(mut self, url: impl Into<String>) -> Self {
        self.resource_url = Some(url.into());
        self
    }
}

/// A partial update of an item's mutable fields.
///
/// `None` leaves a field untouched. The inventory number is deliberately
/// absent: it never changes once assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemUpdate {
    pub title: Option<String>,
    pub resource_url: Option<String>,
    pub owner: Option<String>,
    pub is_active: Option<bool>,
    pub is_labeled: Option<bool>,
}

impl ItemUpdate {
    /// Returns `true` if the update would not change anything.
    ///
    /// # Examples
    ///
    /// ```
    /// use invent_core::ItemUpdate;
    ///
    /// assert!(ItemUpdate::default().is_empty());
    /// let update = ItemUpdate { owner: Some("Alice".into()), ..Default::default() };
    /// assert!(!update.is_empty());
    /// ```
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.resource_url.is_none()
            && self.owner.is_none()
            && self.is_active.is_none()
            && self.is_labeled.is_none()
    }
}

/// An item joined with its owning realm.
///
/// This is what the store hands back for display and label rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemWithRealm {
    pub item: Item,
    pub realm: Realm,
}

impl ItemWithRealm {
    pub fn realm_name(&self) -> &str {
        &self.realm.name
    }

    pub fn realm_prefix(&self) -> &str {
        &self.realm.prefix
    }

    /// The inventory number, or `"-"` for the (transient) unnumbered state.
    pub fn display_number(&self) -> &str {
        self.item.inventory_number.as_deref().unwrap_or("-")
    }
}

/// Record of a generated label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: i64,
    /// Label kind tag (e.g., `simple-62x29`).
    pub label_type: String,
    pub item_id: i64,
    pub media_type: Option<String>,
    /// Attributes the label was rendered with, as a JSON object.
    pub attributes: String,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A label record that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLabel {
    pub label_type: String,
    pub item_id: i64,
    pub media_type: Option<String>,
    pub attributes: serde_json::Map<String, serde_json::Value>,
    pub url: Option<String>,
}
