//! Input validation.
//!
//! Validates new realms, new items and item updates before they reach the
//! store, so that a rejected request never leaves a partial mutation
//! behind.
//!
//! # Examples
//!
//! ```
//! use invent_core::*;
//!
//! assert!(validate_new_realm(&NewRealm::new("LAB", "Laboratory")).is_ok());
//!
//! // Prefixes become part of inventory numbers, so whitespace is rejected.
//! let err = validate_new_realm(&NewRealm::new("L A B", "Laboratory")).unwrap_err();
//! assert!(matches!(err, ValidationError::InvalidPrefix(_)));
//! ```

use thiserror::Error;

use crate::types::{ItemUpdate, NewItem, NewRealm};

/// Validation errors for inventory input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Item title is empty or whitespace-only.
    #[error("item title cannot be empty")]
    EmptyTitle,
    /// Realm name is empty or whitespace-only.
    #[error("realm name cannot be empty")]
    EmptyRealmName,
    /// Realm prefix is empty.
    #[error("realm prefix cannot be empty")]
    EmptyPrefix,
    /// Realm prefix contains whitespace or template braces.
    #[error("invalid realm prefix '{0}': must not contain whitespace or braces")]
    InvalidPrefix(String),
    /// An explicit inventory number is empty or whitespace-only.
    #[error("inventory number cannot be empty")]
    EmptyInventoryNumber,
    /// An update does not change any field.
    #[error("nothing to update")]
    EmptyUpdate,
}

/// Validates a realm before insertion.
pub fn validate_new_realm(realm: &NewRealm) -> Result<(), ValidationError> {
    if realm.name.trim().is_empty() {
        return Err(ValidationError::EmptyRealmName);
    }
    if realm.prefix.is_empty() {
        return Err(ValidationError::EmptyPrefix);
    }
    if realm
        .prefix
        .chars()
        .any(|c| c.is_whitespace() || c == '{' || c == '}')
    {
        return Err(ValidationError::InvalidPrefix(realm.prefix.clone()));
    }
    Ok(())
}

/// Validates an item before insertion.
pub fn validate_new_item(item: &NewItem) -> Result<(), ValidationError> {
    if item.title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if item
        .inventory_number
        .as_deref()
        .is_some_and(|number| number.trim().is_empty())
    {
        return Err(ValidationError::EmptyInventoryNumber);
    }
    Ok(())
}

/// Validates an item update.
pub fn validate_update(update: &ItemUpdate) -> Result<(), ValidationError> {
    if update.is_empty() {
        return Err(ValidationError::EmptyUpdate);
    }
    if update
        .title
        .as_deref()
        .is_some_and(|title| title.trim().is_empty())
    {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_realm_requires_name_and_prefix() {
        assert_eq!(
            validate_new_realm(&NewRealm::new("LAB", "  ")),
            Err(ValidationError::EmptyRealmName)
        );
        assert_eq!(
            validate_new_realm(&NewRealm::new("", "Laboratory")),
            Err(ValidationError::EmptyPrefix)
        );
    }

    #[test]
    fn test_realm_prefix_characters() {
        assert!(validate_new_realm(&NewRealm::new("LAB-2", "Lab")).is_ok());
        assert!(validate_new_realm(&NewRealm::new("lab_x", "Lab")).is_ok());
        assert_eq!(
            validate_new_realm(&NewRealm::new("{id}", "Lab")),
            Err(ValidationError::InvalidPrefix("{id}".to_string()))
        );
        assert!(validate_new_realm(&NewRealm::new("LAB\t", "Lab")).is_err());
    }

    #[test]
    fn test_item_requires_title() {
        assert_eq!(
            validate_new_item(&NewItem::new("")),
            Err(ValidationError::EmptyTitle)
        );
        assert!(validate_new_item(&NewItem::new("Oscilloscope")).is_ok());
    }

    #[test]
    fn test_item_explicit_number_must_not_be_blank() {
        let item = NewItem::new("Oscilloscope").with_inventory_number(" ");
        assert_eq!(
            validate_new_item(&item),
            Err(ValidationError::EmptyInventoryNumber)
        );
    }

    #[test]
    fn test_update_validation() {
        assert_eq!(
            validate_update(&ItemUpdate::default()),
            Err(ValidationError::EmptyUpdate)
        );
        let blank_title = ItemUpdate {
            title: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(
            validate_update(&blank_title),
            Err(ValidationError::EmptyTitle)
        );
        let deactivate = ItemUpdate {
            is_active: Some(false),
            ..Default::default()
        };
        assert!(validate_update(&deactivate).is_ok());
    }
}
