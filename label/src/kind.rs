//! The closed set of label kinds.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::LabelError;

/// Declared type of a label attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    Bool,
    Text,
}

/// Physical size of a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
    pub unit: &'static str,
}

const SIMPLE_62X29_ATTRIBUTES: &[(&str, AttributeType)] = &[
    ("generate_qrcode", AttributeType::Bool),
    ("title", AttributeType::Text),
    ("owner", AttributeType::Text),
    ("inventory_number", AttributeType::Text),
    ("realm_name", AttributeType::Text),
];

const SIMPLE_100X62_ATTRIBUTES: &[(&str, AttributeType)] = &[
    ("generate_qrcode", AttributeType::Bool),
    ("url_base", AttributeType::Text),
    ("title", AttributeType::Text),
    ("owner", AttributeType::Text),
    ("maintainer", AttributeType::Text),
    ("policy", AttributeType::Text),
    ("inventory_number", AttributeType::Text),
    ("realm_name", AttributeType::Text),
    ("realm_prefix", AttributeType::Text),
];

/// A label layout.
///
/// # Examples
///
/// ```
/// use invent_label::LabelKind;
///
/// let kind: LabelKind = "simple-100x62".parse().unwrap();
/// assert_eq!(kind, LabelKind::Simple100x62);
/// assert_eq!(kind.dimensions().width, 100);
/// assert!(kind.qrcode_by_default());
///
/// let err = "fancy".parse::<LabelKind>().unwrap_err();
/// assert!(err.to_string().starts_with("unknown label type 'fancy'"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    /// 62×29 mm tape label; QR code only on request.
    Simple62x29,
    /// 100×62 mm label with maintainer and policy lines; QR code by default.
    Simple100x62,
}

impl LabelKind {
    pub const ALL: [LabelKind; 2] = [LabelKind::Simple62x29, LabelKind::Simple100x62];

    /// The type tag, as used on the command line and in label records.
    pub fn name(self) -> &'static str {
        match self {
            LabelKind::Simple62x29 => "simple-62x29",
            LabelKind::Simple100x62 => "simple-100x62",
        }
    }

    pub fn dimensions(self) -> Dimensions {
        let (width, height) = match self {
            LabelKind::Simple62x29 => (62, 29),
            LabelKind::Simple100x62 => (100, 62),
        };
        Dimensions {
            width,
            height,
            unit: "mm",
        }
    }

    /// Media type of the rendered document.
    pub fn media_type(self) -> &'static str {
        "application/pdf"
    }

    /// Name of the SVG template for this kind.
    pub fn template_name(self) -> &'static str {
        match self {
            LabelKind::Simple62x29 => "simple-62x29.svg",
            LabelKind::Simple100x62 => "simple-100x62.svg",
        }
    }

    /// Declared attributes and their types.
    pub fn attributes(self) -> &'static [(&'static str, AttributeType)] {
        match self {
            LabelKind::Simple62x29 => SIMPLE_62X29_ATTRIBUTES,
            LabelKind::Simple100x62 => SIMPLE_100X62_ATTRIBUTES,
        }
    }

    pub fn attribute_type(self, name: &str) -> Option<AttributeType> {
        self.attributes()
            .iter()
            .find(|(attr, _)| *attr == name)
            .map(|(_, ty)| *ty)
    }

    /// Whether a QR code is drawn when `generate_qrcode` is not given.
    pub fn qrcode_by_default(self) -> bool {
        matches!(self, LabelKind::Simple100x62)
    }

    /// Whether this kind joins the QR payload onto `url_base`.
    pub fn uses_url_base(self) -> bool {
        matches!(self, LabelKind::Simple100x62)
    }
}

impl fmt::Display for LabelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LabelKind {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LabelKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s.trim())
            .ok_or_else(|| LabelError::UnknownLabelType {
                name: s.to_string(),
                available: LabelKind::ALL
                    .iter()
                    .map(|kind| kind.name())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}
