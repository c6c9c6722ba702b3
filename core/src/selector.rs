//! Realm selectors.
//!
//! A [`RealmSelector`] names the realm an operation applies to. The store
//! resolves it against its `realms` table; this module only defines the
//! matching rules so every backend applies them identically.

use std::fmt;

use crate::types::Realm;

/// Selects exactly one realm.
///
/// # Examples
///
/// ```
/// use invent_core::RealmSelector;
///
/// assert_eq!(RealmSelector::from_option(None), RealmSelector::Default);
/// assert_eq!(
///     RealmSelector::from_option(Some("LAB".to_string())),
///     RealmSelector::key("LAB"),
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RealmSelector {
    /// The internal realm with the lowest identity.
    #[default]
    Default,
    /// A realm prefix, or a realm identity written in decimal.
    Key(String),
}

impl RealmSelector {
    pub fn key(key: impl Into<String>) -> Self {
        Self::Key(key.into())
    }

    /// Maps an optional command-line value to a selector.
    pub fn from_option(key: Option<String>) -> Self {
        key.map_or(Self::Default, Self::Key)
    }

    /// Picks the matching realm out of `realms`.
    ///
    /// A prefix match wins over an identity match, so a realm whose prefix
    /// happens to be numeric is still reachable by that prefix.
    ///
    /// # Examples
    ///
    /// ```
    /// use invent_core::{Realm, RealmSelector};
    ///
    /// let realms = vec![
    ///     Realm { id: 2, name: "Library".into(), prefix: "LIB".into(), url_base: None, is_external: false },
    ///     Realm { id: 1, name: "Partner".into(), prefix: "EXT".into(), url_base: None, is_external: true },
    ///     Realm { id: 3, name: "Lab".into(), prefix: "LAB".into(), url_base: None, is_external: false },
    /// ];
    /// assert_eq!(RealmSelector::Default.select(&realms).unwrap().prefix, "LIB");
    /// assert_eq!(RealmSelector::key("LAB").select(&realms).unwrap().id, 3);
    /// assert_eq!(RealmSelector::key("1").select(&realms).unwrap().prefix, "EXT");
    /// assert!(RealmSelector::key("NOPE").select(&realms).is_none());
    /// ```
    pub fn select<'a>(&self, realms: &'a [Realm]) -> Option<&'a Realm> {
        match self {
            Self::Default => realms
                .iter()
                .filter(|realm| !realm.is_external)
                .min_by_key(|realm| realm.id),
            Self::Key(key) => realms.iter().find(|realm| realm.prefix == *key).or_else(|| {
                let id = key.trim().parse::<i64>().ok()?;
                realms.iter().find(|realm| realm.id == id)
            }),
        }
    }

    /// Identity value the key would match, if it is numeric.
    pub fn as_identity(&self) -> Option<i64> {
        match self {
            Self::Default => None,
            Self::Key(key) => key.trim().parse().ok(),
        }
    }
}

impl fmt::Display for RealmSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("default internal realm"),
            Self::Key(key) => write!(f, "realm '{key}'"),
        }
    }
}
