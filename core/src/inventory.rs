//! Inventory-number generation.
//!
//! Inventory numbers are derived from the owning realm's prefix and the
//! identity the store assigned to the item, so they stay stable across
//! renames and show at a glance which realm issued them. The rendering is
//! driven by a small template language:
//!
//! - `{prefix}`: the realm prefix
//! - `{id}` / `{id:FMT}`: the item identity; `FMT` is an optional `0`
//!   fill flag, an optional minimum width and an optional radix (`X` upper
//!   hex, `x` lower hex, `d` decimal)
//! - `{{` and `}}`: literal braces
//!
//! The default template is [`DEFAULT_INVENTORY_NUMBER_FORMAT`].
//!
//! # Example
//!
//! ```
//! use invent_core::InventoryNumberFormat;
//!
//! let format = InventoryNumberFormat::default();
//! assert_eq!(format.format("LAB", 26), "LAB-00001A");
//!
//! let custom: InventoryNumberFormat = "{prefix}/{id:d}".parse().unwrap();
//! assert_eq!(custom.format("LIB", 26), "LIB/26");
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::types::{Item, Realm};

/// Template used when none is configured.
pub const DEFAULT_INVENTORY_NUMBER_FORMAT: &str = "{prefix}-{id:06X}";

/// Errors raised while parsing a template or generating a number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryNumberError {
    /// The template could not be parsed.
    #[error("invalid inventory number format '{template}': {reason}")]
    InvalidFormat { template: String, reason: String },
    /// The item has no owning realm (or the realm passed in is not its owner).
    #[error("item {0} has no realm assigned")]
    NoRealmAssigned(i64),
    /// The owning realm has an empty prefix.
    #[error("realm {0} has an empty prefix")]
    EmptyPrefix(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Radix {
    Decimal,
    LowerHex,
    UpperHex,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Prefix,
    Id {
        zero_fill: bool,
        width: usize,
        radix: Radix,
    },
}

/// A parsed inventory-number template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryNumberFormat {
    template: String,
    segments: Vec<Segment>,
}

impl InventoryNumberFormat {
    /// Parses a template.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryNumberError::InvalidFormat`] for unbalanced braces,
    /// unknown placeholders, malformed `id` specs, or a template without an
    /// `{id}` placeholder (numbers would not be unique).
    pub fn parse(template: &str) -> Result<Self, InventoryNumberError> {
        let invalid = |reason: &str| InventoryNumberError::InvalidFormat {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(invalid("unmatched '}'")),
                '{' => {
                    let mut field = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(c) => field.push(c),
                            None => return Err(invalid("unterminated placeholder")),
                        }
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(parse_placeholder(&field).map_err(|reason| invalid(&reason))?);
                }
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        if !segments.iter().any(|s| matches!(s, Segment::Id { .. })) {
            return Err(invalid("template must contain an {id} placeholder"));
        }

        Ok(Self {
            template: template.to_string(),
            segments,
        })
    }

    /// The template this format was parsed from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Renders the number for a realm prefix and item identity.
    pub fn format(&self, prefix: &str, id: i64) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Prefix => out.push_str(prefix),
                Segment::Id {
                    zero_fill,
                    width,
                    radix,
                } => {
                    let digits = match radix {
                        Radix::Decimal => id.unsigned_abs().to_string(),
                        Radix::LowerHex => format!("{:x}", id.unsigned_abs()),
                        Radix::UpperHex => format!("{:X}", id.unsigned_abs()),
                    };
                    let sign = if id < 0 { "-" } else { "" };
                    let len = sign.len() + digits.len();
                    let pad = width.saturating_sub(len);
                    if *zero_fill {
                        out.push_str(sign);
                        out.extend(std::iter::repeat_n('0', pad));
                    } else {
                        out.extend(std::iter::repeat_n(' ', pad));
                        out.push_str(sign);
                    }
                    out.push_str(&digits);
                }
            }
        }
        out
    }

    /// Returns the item's inventory number, deriving it if unset.
    ///
    /// Idempotent: an item that already carries a number gets that number
    /// back untouched. The caller persists a freshly derived number.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryNumberError::NoRealmAssigned`] if `realm` is `None`
    /// or is not the item's owner, and [`InventoryNumberError::EmptyPrefix`]
    /// if the owning realm's prefix is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Utc;
    /// use invent_core::{InventoryNumberFormat, Item, Realm};
    ///
    /// let realm = Realm { id: 1, name: "Lab".into(), prefix: "LAB".into(), url_base: None, is_external: false };
    /// let mut item = Item {
    ///     id: 255, inventory_number: None, title: "Scope".into(), owner: None,
    ///     resource_url: None, created_at: Utc::now(), updated_at: Utc::now(),
    ///     realm_id: 1, is_active: true, is_labeled: false,
    /// };
    /// let format = InventoryNumberFormat::default();
    /// assert_eq!(format.generate(&item, Some(&realm)).unwrap(), "LAB-0000FF");
    ///
    /// item.inventory_number = Some("LEGACY-1".into());
    /// assert_eq!(format.generate(&item, Some(&realm)).unwrap(), "LEGACY-1");
    /// ```
    pub fn generate(
        &self,
        item: &Item,
        realm: Option<&Realm>,
    ) -> Result<String, InventoryNumberError> {
        if let Some(existing) = &item.inventory_number {
            return Ok(existing.clone());
        }
        let realm = realm
            .filter(|realm| realm.id == item.realm_id)
            .ok_or(InventoryNumberError::NoRealmAssigned(item.id))?;
        if realm.prefix.is_empty() {
            return Err(InventoryNumberError::EmptyPrefix(realm.id));
        }
        Ok(self.format(&realm.prefix, item.id))
    }
}

impl Default for InventoryNumberFormat {
    fn default() -> Self {
        Self {
            template: DEFAULT_INVENTORY_NUMBER_FORMAT.to_string(),
            segments: vec![
                Segment::Prefix,
                Segment::Literal("-".to_string()),
                Segment::Id {
                    zero_fill: true,
                    width: 6,
                    radix: Radix::UpperHex,
                },
            ],
        }
    }
}

impl FromStr for InventoryNumberFormat {
    type Err = InventoryNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for InventoryNumberFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

fn parse_placeholder(field: &str) -> Result<Segment, String> {
    let (name, spec) = match field.split_once(':') {
        Some((name, spec)) => (name.trim(), Some(spec)),
        None => (field.trim(), None),
    };
    match name {
        "prefix" => match spec {
            None => Ok(Segment::Prefix),
            Some(_) => Err("{prefix} does not take a format spec".to_string()),
        },
        "id" => parse_id_spec(spec.unwrap_or("")),
        other => Err(format!("unknown placeholder '{{{other}}}'")),
    }
}

fn parse_id_spec(spec: &str) -> Result<Segment, String> {
    let (zero_fill, rest) = match spec.strip_prefix('0') {
        Some(rest) => (true, rest),
        None => (false, spec),
    };
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let (width_str, radix_str) = rest.split_at(digits_end);
    let width = if width_str.is_empty() {
        0
    } else {
        width_str
            .parse::<usize>()
            .map_err(|_| format!("invalid width '{width_str}'"))?
    };
    let radix = match radix_str {
        "" | "d" => Radix::Decimal,
        "x" => Radix::LowerHex,
        "X" => Radix::UpperHex,
        other => return Err(format!("unsupported id format '{other}'")),
    };
    Ok(Segment::Id {
        zero_fill,
        width,
        radix,
    })
}
