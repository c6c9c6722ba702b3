//! Typed label attributes.
//!
//! Attributes arrive as strings from the command line. Values of declared
//! attributes are coerced to the type the label kind declares; undeclared
//! attributes pass through as strings and are still visible to templates.

use chrono::SecondsFormat;
use invent_core::ItemWithRealm;
use serde_json::{Map, Value};

use crate::error::{LabelError, Result};
use crate::kind::{AttributeType, LabelKind};

/// Attribute values for one label.
///
/// # Examples
///
/// ```
/// use invent_label::{LabelAttributes, LabelKind};
///
/// let attrs = LabelAttributes::from_pairs(
///     LabelKind::Simple62x29,
///     [("generate_qrcode", "yes"), ("title", "Oscilloscope")],
/// )
/// .unwrap();
/// assert_eq!(attrs.get_bool("generate_qrcode"), Some(true));
/// assert_eq!(attrs.get_str("title"), Some("Oscilloscope"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelAttributes {
    values: Map<String, Value>,
}

impl LabelAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds attributes from raw key/value pairs, coercing declared ones.
    ///
    /// # Errors
    ///
    /// Returns [`LabelError::InvalidAttribute`] if a boolean attribute
    /// has a value that is not a recognized boolean spelling.
    pub fn from_pairs<K, V>(kind: LabelKind, pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self>
    where
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut attrs = Self::new();
        for (key, value) in pairs {
            attrs.set(kind, key, value.as_ref())?;
        }
        Ok(attrs)
    }

    /// Sets one attribute from its raw string form.
    pub fn set(&mut self, kind: LabelKind, key: impl Into<String>, raw: &str) -> Result<()> {
        let key = key.into();
        let value = match kind.attribute_type(&key) {
            Some(AttributeType::Bool) => Value::Bool(parse_bool(&key, raw)?),
            Some(AttributeType::Text) | None => Value::String(raw.to_string()),
        };
        self.values.insert(key, value);
        Ok(())
    }

    /// Overlays the fields of `entry` onto these attributes.
    ///
    /// Item fields replace user-supplied values of the same name. A
    /// `url_base` given by the user is kept; otherwise the realm's is used.
    pub fn with_item(mut self, entry: &ItemWithRealm) -> Self {
        let item = &entry.item;
        self.insert_text("title", &item.title);
        if let Some(owner) = &item.owner {
            self.insert_text("owner", owner);
        }
        if let Some(number) = &item.inventory_number {
            self.insert_text("inventory_number", number);
        }
        self.insert_text("realm_name", &entry.realm.name);
        self.insert_text("realm_prefix", &entry.realm.prefix);
        self.insert_text(
            "updated_at",
            &item.updated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        );
        if !self.values.contains_key("url_base") {
            if let Some(url_base) = &entry.realm.url_base {
                self.insert_text("url_base", url_base);
            }
        }
        self
    }

    /// Builds the attributes for a stored item.
    pub fn for_item<K, V>(
        kind: LabelKind,
        entry: &ItemWithRealm,
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self>
    where
        K: Into<String>,
        V: AsRef<str>,
    {
        Ok(Self::from_pairs(kind, pairs)?.with_item(entry))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(Value::as_bool)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.values
    }

    fn insert_text(&mut self, key: &str, value: &str) {
        self.values
            .insert(key.to_string(), Value::String(value.to_string()));
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" | "" => Ok(false),
        _ => Err(LabelError::InvalidAttribute {
            name: key.to_string(),
            value: raw.to_string(),
            expected: "a boolean",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use invent_core::{Item, Realm};

    fn entry(owner: Option<&str>, url_base: Option<&str>) -> ItemWithRealm {
        let ts = Utc.with_ymd_and_hms(2017, 8, 25, 12, 0, 0).unwrap();
        ItemWithRealm {
            item: Item {
                id: 26,
                inventory_number: Some("LAB-00001A".to_string()),
                title: "Oscilloscope".to_string(),
                owner: owner.map(str::to_string),
                resource_url: None,
                created_at: ts,
                updated_at: ts,
                realm_id: 1,
                is_active: true,
                is_labeled: false,
            },
            realm: Realm {
                id: 1,
                name: "Laboratory".to_string(),
                prefix: "LAB".to_string(),
                url_base: url_base.map(str::to_string),
                is_external: false,
            },
        }
    }

    #[test]
    fn test_bool_spellings() {
        for (raw, expected) in [("On", true), ("1", true), ("no", false), ("FALSE", false)] {
            let attrs =
                LabelAttributes::from_pairs(LabelKind::Simple62x29, [("generate_qrcode", raw)])
                    .unwrap();
            assert_eq!(attrs.get_bool("generate_qrcode"), Some(expected), "{raw}");
        }
    }

    #[test]
    fn test_invalid_bool() {
        let err = LabelAttributes::from_pairs(LabelKind::Simple62x29, [("generate_qrcode", "maybe")])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value 'maybe' for label attribute 'generate_qrcode' (expected a boolean)"
        );
    }

    #[test]
    fn test_undeclared_attributes_pass_through() {
        let attrs =
            LabelAttributes::from_pairs(LabelKind::Simple62x29, [("room", "B.104")]).unwrap();
        assert_eq!(attrs.get_str("room"), Some("B.104"));
    }

    #[test]
    fn test_item_fields_override_user_values() {
        let attrs = LabelAttributes::for_item(
            LabelKind::Simple100x62,
            &entry(Some("Alice"), None),
            [("title", "Wrong"), ("policy", "Ask first")],
        )
        .unwrap();
        assert_eq!(attrs.get_str("title"), Some("Oscilloscope"));
        assert_eq!(attrs.get_str("owner"), Some("Alice"));
        assert_eq!(attrs.get_str("policy"), Some("Ask first"));
        assert_eq!(attrs.get_str("realm_prefix"), Some("LAB"));
        assert_eq!(attrs.get_str("updated_at"), Some("2017-08-25T12:00:00Z"));
        assert_eq!(attrs.get("url_base"), None);
    }

    #[test]
    fn test_url_base_defaults_from_realm() {
        let item = entry(None, Some("https://inv.example/i/"));
        let defaulted =
            LabelAttributes::for_item(LabelKind::Simple100x62, &item, Vec::<(String, String)>::new())
                .unwrap();
        assert_eq!(defaulted.get_str("url_base"), Some("https://inv.example/i/"));
        assert_eq!(defaulted.get("owner"), None);

        let explicit = LabelAttributes::for_item(
            LabelKind::Simple100x62,
            &item,
            [("url_base", "https://other.example/")],
        )
        .unwrap();
        assert_eq!(explicit.get_str("url_base"), Some("https://other.example/"));
    }
}
