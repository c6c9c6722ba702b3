//! Runtime inventory access via SQLite queries.
//!
//! Provides [`InventoryStore`] for creating, reading, updating and listing
//! realms and items. Every mutation runs inside a single transaction, so
//! an item is never visible without its inventory number and a rejected
//! request leaves no trace.
//!
//! # Example
//!
//! ```no_run
//! use invent_core::{NewItem, NewRealm};
//! use invent_sqlite::{InventoryStore, Migration};
//! use rusqlite::Connection;
//!
//! let mut migration = Migration::new(Connection::open("invent.db").unwrap()).unwrap();
//! migration.up().unwrap();
//! let conn = migration.into_connection();
//!
//! let store = InventoryStore::new(&conn).unwrap();
//! store.create_realm(&NewRealm::new("LAB", "Laboratory")).unwrap();
//! let created = store.create_item(&NewItem::new("Oscilloscope")).unwrap();
//! println!("{}", created.display_number());
//! ```

use chrono::Utc;
use invent_core::{
    InventoryNumberFormat, ItemFilter, ItemUpdate, ItemWithRealm, Label, NewItem, NewLabel,
    NewRealm, Pagination, Realm, RealmFilter, RealmSelector, SortKey, validate_new_item,
    validate_new_realm, validate_update,
};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use tracing::{debug, info};

use crate::convert::{
    ITEM_COLUMNS, LABEL_COLUMNS, REALM_COLUMNS, is_unique_violation, item_with_realm_from_row,
    label_from_row, realm_from_row, timestamp_to_string,
};
use crate::error::{Result, StoreError};

/// How `delete_item` removes an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteMode {
    /// Keep the row but mark it inactive.
    #[default]
    Deactivate,
    /// Remove the row and its label records.
    Purge,
}

/// Query interface for reading and writing the inventory.
///
/// Wraps a connection and the inventory-number format used for items
/// created without an explicit number.
///
/// # Examples
///
/// ```
/// use invent_core::{ItemFilter, NewItem, NewRealm, Pagination, SortKey};
/// use invent_sqlite::{InventoryStore, Migration};
/// use rusqlite::Connection;
///
/// let mut migration = Migration::new(Connection::open_in_memory().unwrap()).unwrap();
/// migration.up().unwrap();
/// let conn = migration.into_connection();
/// let store = InventoryStore::new(&conn).unwrap();
///
/// store.create_realm(&NewRealm::new("LAB", "Laboratory")).unwrap();
/// let scope = store.create_item(&NewItem::new("Oscilloscope")).unwrap();
/// assert_eq!(scope.item.inventory_number.as_deref(), Some("LAB-000001"));
///
/// let listed = store
///     .list_items(&ItemFilter::default(), SortKey::Id, Pagination::unbounded())
///     .unwrap();
/// assert_eq!(listed.len(), 1);
/// ```
pub struct InventoryStore<'a> {
    conn: &'a Connection,
    number_format: InventoryNumberFormat,
}

impl<'a> InventoryStore<'a> {
    /// Creates a store using the default inventory-number format.
    pub fn new(conn: &'a Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self {
            conn,
            number_format: InventoryNumberFormat::default(),
        })
    }

    /// Replaces the format used to derive inventory numbers.
    pub fn with_number_format(mut self, number_format: InventoryNumberFormat) -> Self {
        self.number_format = number_format;
        self
    }

    pub fn number_format(&self) -> &InventoryNumberFormat {
        &self.number_format
    }

    // -----------------------------------------------------------------------
    // Realms
    // -----------------------------------------------------------------------

    /// Inserts a new realm.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for an empty name or malformed
    /// prefix and [`StoreError::DuplicatePrefix`] if the prefix is taken.
    pub fn create_realm(&self, realm: &NewRealm) -> Result<Realm> {
        validate_new_realm(realm)?;
        let tx = self.conn.unchecked_transaction()?;

        let inserted = tx.execute(
            "INSERT INTO realms (name, prefix, url_base, is_external) VALUES (?1, ?2, ?3, ?4)",
            params![realm.name, realm.prefix, realm.url_base, realm.is_external],
        );
        if let Err(e) = inserted {
            return Err(if is_unique_violation(&e, "realms.prefix") {
                StoreError::DuplicatePrefix(realm.prefix.clone())
            } else {
                e.into()
            });
        }
        let id = tx.last_insert_rowid();
        tx.commit()?;

        info!(id, prefix = %realm.prefix, "created realm");
        Ok(Realm {
            id,
            name: realm.name.clone(),
            prefix: realm.prefix.clone(),
            url_base: realm.url_base.clone(),
            is_external: realm.is_external,
        })
    }

    /// Lists realms ordered by identity.
    pub fn list_realms(&self, filter: RealmFilter) -> Result<Vec<Realm>> {
        let condition = match (filter.internal, filter.external) {
            (true, true) => "1",
            (true, false) => "r.is_external = 0",
            (false, true) => "r.is_external = 1",
            (false, false) => "0",
        };
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {REALM_COLUMNS} FROM realms r WHERE {condition} ORDER BY r.id"
        ))?;
        let realms = stmt
            .query_map([], |row| realm_from_row(row, 0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(realms)
    }

    /// Resolves a selector to exactly one realm.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RealmNotFound`] if nothing matches.
    pub fn resolve_realm(&self, selector: &RealmSelector) -> Result<Realm> {
        let realms = self.list_realms(RealmFilter::default())?;
        selector
            .select(&realms)
            .cloned()
            .ok_or_else(|| StoreError::RealmNotFound(selector.clone()))
    }

    // -----------------------------------------------------------------------
    // Items
    // -----------------------------------------------------------------------

    /// Inserts a new item, deriving its inventory number if none is given.
    ///
    /// Insertion and numbering share one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for a blank title,
    /// [`StoreError::RealmNotFound`] if the realm selector matches nothing,
    /// and [`StoreError::DuplicateInventoryNumber`] if the explicit number
    /// is already assigned. A derived number that is already taken is
    /// skipped by moving the item to the next identity.
    pub fn create_item(&self, item: &NewItem) -> Result<ItemWithRealm> {
        validate_new_item(item)?;
        let realm = self.resolve_realm(&item.realm)?;

        let tx = self.conn.unchecked_transaction()?;
        let now = timestamp_to_string(&Utc::now());
        let mut id = insert_item_row(&tx, item, realm.id, &now)?;
        let mut created = load_item_by_id(&tx, id)?;

        if created.item.inventory_number.is_none() {
            // Identities are distinct and every format renders the identity,
            // so each numbered item can cost at most one retry.
            let mut retries: i64 = tx.query_row(
                "SELECT COUNT(*) FROM items WHERE inventory_number IS NOT NULL",
                [],
                |row| row.get(0),
            )?;
            loop {
                let number = self
                    .number_format
                    .generate(&created.item, Some(&created.realm))?;
                if !number_assigned(&tx, &number)? {
                    tx.execute(
                        "UPDATE items SET inventory_number = ?1 WHERE id = ?2",
                        params![number, id],
                    )
                    .map_err(|e| map_number_violation(e, Some(&number)))?;
                    created.item.inventory_number = Some(number);
                    break;
                }
                if retries <= 0 {
                    return Err(StoreError::DuplicateInventoryNumber(number));
                }
                retries -= 1;
                debug!(id, %number, "generated number already assigned, taking the next identity");
                // AUTOINCREMENT keeps counting inside the transaction, so the
                // replacement row gets a fresh identity.
                tx.execute("DELETE FROM items WHERE id = ?1", [id])?;
                id = insert_item_row(&tx, item, realm.id, &now)?;
                created = load_item_by_id(&tx, id)?;
            }
        }
        tx.commit()?;

        info!(
            id,
            inventory_number = created.display_number(),
            realm = %created.realm.prefix,
            "created item"
        );
        Ok(created)
    }

    /// Looks up an item by inventory number.
    pub fn find_item(&self, inventory_number: &str) -> Result<Option<ItemWithRealm>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS}, {REALM_COLUMNS} FROM items i JOIN realms r ON r.id = i.realm_id \
             WHERE i.inventory_number = ?1"
        );
        let item = self
            .conn
            .query_row(&sql, [inventory_number], item_with_realm_from_row)
            .optional()?;
        Ok(item)
    }

    /// Looks up an item by inventory number.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ItemNotFound`] if no item carries the number.
    pub fn get_item(&self, inventory_number: &str) -> Result<ItemWithRealm> {
        self.find_item(inventory_number)?
            .ok_or_else(|| StoreError::ItemNotFound(inventory_number.to_string()))
    }

    /// Applies a partial update and returns the updated item.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for an empty update or blank
    /// title and [`StoreError::ItemNotFound`] if the item does not exist.
    pub fn update_item(&self, inventory_number: &str, update: &ItemUpdate) -> Result<ItemWithRealm> {
        validate_update(update)?;

        let mut assignments: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();
        if let Some(title) = &update.title {
            assignments.push("title = ?");
            values.push(Value::Text(title.clone()));
        }
        if let Some(url) = &update.resource_url {
            assignments.push("resource_url = ?");
            values.push(Value::Text(url.clone()));
        }
        if let Some(owner) = &update.owner {
            assignments.push("owner = ?");
            values.push(Value::Text(owner.clone()));
        }
        if let Some(active) = update.is_active {
            assignments.push("is_active = ?");
            values.push(Value::Integer(i64::from(active)));
        }
        if let Some(labeled) = update.is_labeled {
            assignments.push("is_labeled = ?");
            values.push(Value::Integer(i64::from(labeled)));
        }
        assignments.push("updated_at = ?");
        values.push(Value::Text(timestamp_to_string(&Utc::now())));
        values.push(Value::Text(inventory_number.to_string()));

        let tx = self.conn.unchecked_transaction()?;
        let rows = tx.execute(
            &format!(
                "UPDATE items SET {} WHERE inventory_number = ?",
                assignments.join(", ")
            ),
            params_from_iter(values.iter()),
        )?;
        if rows == 0 {
            return Err(StoreError::ItemNotFound(inventory_number.to_string()));
        }
        tx.commit()?;

        info!(inventory_number, "updated item");
        self.get_item(inventory_number)
    }

    /// Lists items matching `filter`, ordered descending by `sort_key`.
    ///
    /// Ties are broken by descending identity so paging is stable.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RealmNotFound`] if the realm filter matches no
    /// realm.
    pub fn list_items(
        &self,
        filter: &ItemFilter,
        sort_key: SortKey,
        page: Pagination,
    ) -> Result<Vec<ItemWithRealm>> {
        let mut conditions: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(realm) = &filter.realm {
            let realm = self.resolve_realm(&RealmSelector::key(realm.clone()))?;
            conditions.push("i.realm_id = ?");
            values.push(Value::Integer(realm.id));
        }
        if let Some(owner) = &filter.owner {
            conditions.push("i.owner = ?");
            values.push(Value::Text(owner.clone()));
        }
        if let Some(active) = filter.is_active {
            conditions.push("i.is_active = ?");
            values.push(Value::Integer(i64::from(active)));
        }
        if let Some(labeled) = filter.is_labeled {
            conditions.push("i.is_labeled = ?");
            values.push(Value::Integer(i64::from(labeled)));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        // SQLite treats a negative LIMIT as unbounded.
        let limit = page
            .limit
            .map_or(-1, |limit| i64::try_from(limit).unwrap_or(i64::MAX));
        values.push(Value::Integer(limit));
        values.push(Value::Integer(
            i64::try_from(page.offset).unwrap_or(i64::MAX),
        ));

        let sql = format!(
            "SELECT {ITEM_COLUMNS}, {REALM_COLUMNS} FROM items i JOIN realms r ON r.id = i.realm_id \
             {where_clause} ORDER BY i.{column} DESC, i.id DESC LIMIT ? OFFSET ?",
            column = sort_key.column(),
        );
        debug!(%sql, "listing items");

        let mut stmt = self.conn.prepare(&sql)?;
        let items = stmt
            .query_map(params_from_iter(values.iter()), item_with_realm_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(items)
    }

    /// Removes an item according to `mode` and returns its last state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ItemNotFound`] if the item does not exist.
    pub fn delete_item(&self, inventory_number: &str, mode: DeleteMode) -> Result<ItemWithRealm> {
        match mode {
            DeleteMode::Deactivate => {
                let update = ItemUpdate {
                    is_active: Some(false),
                    ..Default::default()
                };
                self.update_item(inventory_number, &update)
            }
            DeleteMode::Purge => {
                let tx = self.conn.unchecked_transaction()?;
                let existing = self.get_item(inventory_number)?;
                tx.execute("DELETE FROM items WHERE id = ?1", [existing.item.id])?;
                tx.commit()?;
                info!(inventory_number, "purged item");
                Ok(existing)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Labels
    // -----------------------------------------------------------------------

    /// Records a generated label and marks its item as labeled.
    pub fn record_label(&self, label: &NewLabel) -> Result<Label> {
        let attributes = serde_json::to_string(&label.attributes)?;
        let now = Utc::now();

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO labels (type, item_id, media_type, attributes, url, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                label.label_type,
                label.item_id,
                label.media_type,
                attributes,
                label.url,
                timestamp_to_string(&now),
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.execute(
            "UPDATE items SET is_labeled = 1, updated_at = ?1 WHERE id = ?2",
            params![timestamp_to_string(&now), label.item_id],
        )?;
        tx.commit()?;

        debug!(id, item_id = label.item_id, label_type = %label.label_type, "recorded label");
        Ok(Label {
            id,
            label_type: label.label_type.clone(),
            item_id: label.item_id,
            media_type: label.media_type.clone(),
            attributes,
            url: label.url.clone(),
            created_at: now,
        })
    }

    /// Lists label records for an item, oldest first.
    pub fn labels_for_item(&self, item_id: i64) -> Result<Vec<Label>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {LABEL_COLUMNS} FROM labels l WHERE l.item_id = ?1 ORDER BY l.id"
        ))?;
        let labels = stmt
            .query_map([item_id], label_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(labels)
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        self.conn
    }
}

fn load_item_by_id(conn: &Connection, id: i64) -> Result<ItemWithRealm> {
    let sql = format!(
        "SELECT {ITEM_COLUMNS}, {REALM_COLUMNS} FROM items i JOIN realms r ON r.id = i.realm_id \
         WHERE i.id = ?1"
    );
    let item = conn.query_row(&sql, [id], item_with_realm_from_row)?;
    Ok(item)
}

fn insert_item_row(conn: &Connection, item: &NewItem, realm_id: i64, now: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO items (inventory_number, title, owner, resource_url, created_at, updated_at, realm_id) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?6)",
        params![
            item.inventory_number,
            item.title,
            item.owner,
            item.resource_url,
            now,
            realm_id,
        ],
    )
    .map_err(|e| map_number_violation(e, item.inventory_number.as_deref()))?;
    Ok(conn.last_insert_rowid())
}

fn number_assigned(conn: &Connection, number: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM items WHERE inventory_number = ?1",
            [number],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn map_number_violation(err: rusqlite::Error, number: Option<&str>) -> StoreError {
    match number {
        Some(number) if is_unique_violation(&err, "items.inventory_number") => {
            StoreError::DuplicateInventoryNumber(number.to_string())
        }
        _ => err.into(),
    }
}
