//! Integration tests for the invent-sqlite crate.

use invent_core::{
    InventoryNumberFormat, ItemFilter, ItemUpdate, NewItem, NewLabel, NewRealm, Pagination,
    RealmSelector, SortKey, ValidationError,
};
use invent_sqlite::{DatabaseLocation, DeleteMode, InventoryStore, Migration, StoreError};
use rusqlite::Connection;

/// Helper to open an in-memory database with the full schema applied.
fn setup_connection() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    let mut migration = Migration::new(conn).unwrap();
    migration.up().unwrap();
    migration.into_connection()
}

/// Creates the `LAB` realm and returns a store over `conn`.
fn store_with_lab(conn: &Connection) -> InventoryStore<'_> {
    let store = InventoryStore::new(conn).unwrap();
    store
        .create_realm(&NewRealm::new("LAB", "Laboratory"))
        .unwrap();
    store
}

fn numbers(items: &[invent_core::ItemWithRealm]) -> Vec<String> {
    items.iter().map(|i| i.display_number().to_string()).collect()
}

// =============================================================================
// Inventory numbers
// =============================================================================

#[test]
fn test_default_realm_and_generated_number() {
    let conn = setup_connection();
    let store = store_with_lab(&conn);

    let scope = store.create_item(&NewItem::new("Oscilloscope")).unwrap();
    assert_eq!(scope.realm_prefix(), "LAB");
    assert_eq!(
        scope.item.inventory_number,
        Some(format!("LAB-{:06X}", scope.item.id))
    );
    assert!(scope.item.is_active);
    assert!(!scope.item.is_labeled);
    assert_eq!(scope.item.created_at, scope.item.updated_at);
}

#[test]
fn test_numbers_follow_identity_in_hex() {
    let conn = setup_connection();
    let store = store_with_lab(&conn);

    let mut last = None;
    for n in 0..12 {
        last = Some(store.create_item(&NewItem::new(format!("Item {n}"))).unwrap());
    }
    let last = last.unwrap();
    assert_eq!(last.item.id, 12);
    assert_eq!(last.display_number(), "LAB-00000C");
}

#[test]
fn test_generation_is_idempotent_on_stored_items() {
    let conn = setup_connection();
    let store = store_with_lab(&conn);
    let created = store.create_item(&NewItem::new("Multimeter")).unwrap();

    let format = InventoryNumberFormat::default();
    let first = format.generate(&created.item, Some(&created.realm)).unwrap();
    let second = format.generate(&created.item, Some(&created.realm)).unwrap();
    assert_eq!(first, second);
    assert_eq!(Some(first), created.item.inventory_number);

    let reloaded = store.get_item(created.display_number()).unwrap();
    assert_eq!(reloaded.item.inventory_number, created.item.inventory_number);
}

#[test]
fn test_explicit_inventory_number_is_kept() {
    let conn = setup_connection();
    let store = store_with_lab(&conn);
    let created = store
        .create_item(&NewItem::new("Soldering iron").with_inventory_number("LEGACY-7"))
        .unwrap();
    assert_eq!(created.display_number(), "LEGACY-7");
}

// =============================================================================
// Uniqueness
// =============================================================================

#[test]
fn test_duplicate_prefix_is_rejected() {
    let conn = setup_connection();
    let store = store_with_lab(&conn);
    let err = store
        .create_realm(&NewRealm::new("LAB", "Other laboratory"))
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicatePrefix(ref p) if p == "LAB"));
    assert_eq!(err.to_string(), "a realm with prefix 'LAB' already exists");
}

#[test]
fn test_duplicate_inventory_number_is_rejected() {
    let conn = setup_connection();
    let store = store_with_lab(&conn);
    store
        .create_item(&NewItem::new("First").with_inventory_number("X-1"))
        .unwrap();
    let err = store
        .create_item(&NewItem::new("Second").with_inventory_number("X-1"))
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateInventoryNumber(ref n) if n == "X-1"));

    let all = store
        .list_items(&ItemFilter::default(), SortKey::Id, Pagination::unbounded())
        .unwrap();
    assert_eq!(all.len(), 1);
}

#[test]
fn test_explicit_number_does_not_block_generation() {
    let conn = setup_connection();
    let store = store_with_lab(&conn);
    store
        .create_item(&NewItem::new("Legacy").with_inventory_number("LAB-000002"))
        .unwrap();

    for title in ["Scope", "Multimeter", "Power supply"] {
        store.create_item(&NewItem::new(title)).unwrap();
    }

    let all = store
        .list_items(&ItemFilter::default(), SortKey::Id, Pagination::unbounded())
        .unwrap();
    assert_eq!(
        numbers(&all),
        vec!["LAB-000005", "LAB-000004", "LAB-000003", "LAB-000002"]
    );
}

// =============================================================================
// Realm resolution
// =============================================================================

#[test]
fn test_default_realm_is_lowest_internal_identity() {
    let conn = setup_connection();
    let store = InventoryStore::new(&conn).unwrap();
    store
        .create_realm(&NewRealm::new("EXT", "Partner").external())
        .unwrap();
    store.create_realm(&NewRealm::new("LAB", "Laboratory")).unwrap();
    store.create_realm(&NewRealm::new("LIB", "Library")).unwrap();

    let item = store.create_item(&NewItem::new("Oscilloscope")).unwrap();
    assert_eq!(item.realm_prefix(), "LAB");
}

#[test]
fn test_explicit_realm_by_prefix_and_identity() {
    let conn = setup_connection();
    let store = store_with_lab(&conn);
    let lib = store.create_realm(&NewRealm::new("LIB", "Library")).unwrap();

    let by_prefix = store
        .create_item(&NewItem::new("Manual").in_realm(RealmSelector::key("LIB")))
        .unwrap();
    assert_eq!(by_prefix.realm.id, lib.id);

    let by_id = store
        .create_item(&NewItem::new("Atlas").in_realm(RealmSelector::key(lib.id.to_string())))
        .unwrap();
    assert_eq!(by_id.realm_prefix(), "LIB");
}

#[test]
fn test_prefix_wins_over_identity() {
    let conn = setup_connection();
    let store = InventoryStore::new(&conn).unwrap();
    // Realm 1 has prefix "2", realm 2 has prefix "B".
    store.create_realm(&NewRealm::new("2", "Two")).unwrap();
    store.create_realm(&NewRealm::new("B", "Bee")).unwrap();

    let realm = store.resolve_realm(&RealmSelector::key("2")).unwrap();
    assert_eq!(realm.name, "Two");
}

#[test]
fn test_unknown_realm_leaves_store_untouched() {
    let conn = setup_connection();
    let store = store_with_lab(&conn);
    let err = store
        .create_item(&NewItem::new("Scope").in_realm(RealmSelector::key("NOPE")))
        .unwrap_err();
    assert_eq!(err.to_string(), "realm 'NOPE' not found");

    let all = store
        .list_items(&ItemFilter::default(), SortKey::Id, Pagination::unbounded())
        .unwrap();
    assert!(all.is_empty());
}

#[test]
fn test_blank_title_is_rejected_before_mutation() {
    let conn = setup_connection();
    let store = store_with_lab(&conn);
    let err = store.create_item(&NewItem::new("   ")).unwrap_err();
    assert!(matches!(err, StoreError::Validation(ValidationError::EmptyTitle)));
}

// =============================================================================
// Listing
// =============================================================================

#[test]
fn test_owner_filter_after_update() {
    let conn = setup_connection();
    let store = store_with_lab(&conn);
    store.create_item(&NewItem::new("First")).unwrap();
    let second = store.create_item(&NewItem::new("Second")).unwrap();

    let update = ItemUpdate {
        owner: Some("Alice".to_string()),
        ..Default::default()
    };
    store.update_item(second.display_number(), &update).unwrap();

    let owned = store
        .list_items(
            &ItemFilter::default().owned_by("Alice"),
            SortKey::default(),
            Pagination::default(),
        )
        .unwrap();
    assert_eq!(numbers(&owned), vec![second.display_number().to_string()]);
}

#[test]
fn test_filters_compose_conjunctively() {
    let conn = setup_connection();
    let store = store_with_lab(&conn);
    let active_alice = store
        .create_item(&NewItem::new("Scope").with_owner("Alice"))
        .unwrap();
    let inactive_alice = store
        .create_item(&NewItem::new("Old scope").with_owner("Alice"))
        .unwrap();
    store
        .create_item(&NewItem::new("Drill").with_owner("Bob"))
        .unwrap();
    store
        .delete_item(inactive_alice.display_number(), DeleteMode::Deactivate)
        .unwrap();

    let filter = ItemFilter::default().owned_by("Alice").active(true);
    let found = store
        .list_items(&filter, SortKey::Id, Pagination::unbounded())
        .unwrap();
    assert_eq!(numbers(&found), vec![active_alice.display_number().to_string()]);
}

#[test]
fn test_limit_zero_is_unbounded() {
    let conn = setup_connection();
    let store = store_with_lab(&conn);
    for n in 0..25 {
        store.create_item(&NewItem::new(format!("Item {n}"))).unwrap();
    }

    let all = store
        .list_items(
            &ItemFilter::default(),
            SortKey::Id,
            Pagination::from_signed(0, 0),
        )
        .unwrap();
    assert_eq!(all.len(), 25);

    let negative = store
        .list_items(
            &ItemFilter::default(),
            SortKey::Id,
            Pagination::from_signed(-5, 0),
        )
        .unwrap();
    assert_eq!(negative.len(), 25);

    let page = store
        .list_items(
            &ItemFilter::default(),
            SortKey::Id,
            Pagination::from_signed(10, 20),
        )
        .unwrap();
    assert_eq!(page.len(), 5);

    let default_page = store
        .list_items(&ItemFilter::default(), SortKey::Id, Pagination::default())
        .unwrap();
    assert_eq!(default_page.len(), 20);
}

#[test]
fn test_sort_descending_with_stable_ties() {
    let conn = setup_connection();
    let store = store_with_lab(&conn);
    store.create_item(&NewItem::new("b").with_owner("X")).unwrap();
    store.create_item(&NewItem::new("a").with_owner("X")).unwrap();
    store.create_item(&NewItem::new("c").with_owner("X")).unwrap();

    let by_title = store
        .list_items(&ItemFilter::default(), SortKey::Title, Pagination::unbounded())
        .unwrap();
    let titles: Vec<_> = by_title.iter().map(|i| i.item.title.as_str()).collect();
    assert_eq!(titles, vec!["c", "b", "a"]);

    // Equal owners: newest identity first.
    let by_owner = store
        .list_items(&ItemFilter::default(), SortKey::Owner, Pagination::unbounded())
        .unwrap();
    let ids: Vec<_> = by_owner.iter().map(|i| i.item.id).collect();
    assert_eq!(ids, vec![3, 2, 1]);
}

#[test]
fn test_realm_filter() {
    let conn = setup_connection();
    let store = store_with_lab(&conn);
    store.create_realm(&NewRealm::new("LIB", "Library")).unwrap();
    store.create_item(&NewItem::new("Scope")).unwrap();
    let book = store
        .create_item(&NewItem::new("Manual").in_realm(RealmSelector::key("LIB")))
        .unwrap();

    let found = store
        .list_items(
            &ItemFilter::default().in_realm("LIB"),
            SortKey::default(),
            Pagination::default(),
        )
        .unwrap();
    assert_eq!(numbers(&found), vec![book.display_number().to_string()]);

    let err = store
        .list_items(
            &ItemFilter::default().in_realm("NOPE"),
            SortKey::default(),
            Pagination::default(),
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::RealmNotFound(_)));
}

// =============================================================================
// Updates, deletion and labels
// =============================================================================

#[test]
fn test_update_changes_fields() {
    let conn = setup_connection();
    let store = store_with_lab(&conn);
    let created = store.create_item(&NewItem::new("Scope")).unwrap();

    let update = ItemUpdate {
        title: Some("Oscilloscope".to_string()),
        resource_url: Some("https://wiki.example/scope".to_string()),
        is_labeled: Some(true),
        ..Default::default()
    };
    let updated = store.update_item(created.display_number(), &update).unwrap();
    assert_eq!(updated.item.title, "Oscilloscope");
    assert_eq!(
        updated.item.resource_url.as_deref(),
        Some("https://wiki.example/scope")
    );
    assert!(updated.item.is_labeled);
    assert!(updated.item.updated_at >= created.item.updated_at);
    assert_eq!(updated.item.inventory_number, created.item.inventory_number);
}

#[test]
fn test_empty_update_is_rejected() {
    let conn = setup_connection();
    let store = store_with_lab(&conn);
    let created = store.create_item(&NewItem::new("Scope")).unwrap();
    let err = store
        .update_item(created.display_number(), &ItemUpdate::default())
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(ValidationError::EmptyUpdate)));
}

#[test]
fn test_soft_delete_keeps_row() {
    let conn = setup_connection();
    let store = store_with_lab(&conn);
    let created = store.create_item(&NewItem::new("Scope")).unwrap();

    let deleted = store
        .delete_item(created.display_number(), DeleteMode::Deactivate)
        .unwrap();
    assert!(!deleted.item.is_active);
    assert!(store.find_item(created.display_number()).unwrap().is_some());
}

#[test]
fn test_purge_cascades_to_labels_and_never_reuses_numbers() {
    let conn = setup_connection();
    let store = store_with_lab(&conn);
    let created = store.create_item(&NewItem::new("Scope")).unwrap();

    let mut attributes = serde_json::Map::new();
    attributes.insert("title".to_string(), serde_json::json!("Scope"));
    let label = store
        .record_label(&NewLabel {
            label_type: "simple-62x29".to_string(),
            item_id: created.item.id,
            media_type: Some("application/pdf".to_string()),
            attributes,
            url: None,
        })
        .unwrap();
    assert_eq!(label.attributes, r#"{"title":"Scope"}"#);
    assert!(store.get_item(created.display_number()).unwrap().item.is_labeled);
    assert_eq!(store.labels_for_item(created.item.id).unwrap().len(), 1);

    store
        .delete_item(created.display_number(), DeleteMode::Purge)
        .unwrap();
    assert!(matches!(
        store.get_item(created.display_number()),
        Err(StoreError::ItemNotFound(_))
    ));
    assert!(store.labels_for_item(created.item.id).unwrap().is_empty());

    let next = store.create_item(&NewItem::new("Replacement")).unwrap();
    assert_ne!(next.item.inventory_number, created.item.inventory_number);
}

#[test]
fn test_delete_unknown_item() {
    let conn = setup_connection();
    let store = store_with_lab(&conn);
    for mode in [DeleteMode::Deactivate, DeleteMode::Purge] {
        assert!(matches!(
            store.delete_item("LAB-FFFFFF", mode),
            Err(StoreError::ItemNotFound(_))
        ));
    }
}

// =============================================================================
// Files on disk
// =============================================================================

#[test]
fn test_file_database_persists_between_connections() {
    let dir = tempfile::tempdir().unwrap();
    let location = DatabaseLocation::File(dir.path().join("invent.db"));

    {
        let mut migration = Migration::new(location.open().unwrap()).unwrap();
        migration.up().unwrap();
        let conn = migration.into_connection();
        let store = store_with_lab(&conn);
        store.create_item(&NewItem::new("Oscilloscope")).unwrap();
    }

    let conn = location.open().unwrap();
    let migration = Migration::new(conn).unwrap();
    migration.ensure_current().unwrap();
    assert_eq!(migration.status().unwrap().item_count, 1);

    let conn = migration.into_connection();
    let store = InventoryStore::new(&conn).unwrap();
    let item = store.get_item("LAB-000001").unwrap();
    assert_eq!(item.item.title, "Oscilloscope");
}
