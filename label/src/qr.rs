//! QR code payloads and SVG fragments.

use qrcode::{Color, QrCode};
use serde::Serialize;

use crate::error::{LabelError, Result};

/// Light modules drawn around the symbol on every side.
pub const QUIET_ZONE: usize = 4;

/// A QR symbol ready to be embedded in an SVG template.
///
/// `path` is SVG path data in module units; `size` is the symbol's edge
/// length in modules, quiet zone included, so a template scales it with
/// `viewBox="0 0 {size} {size}"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QrFragment {
    pub data: String,
    pub size: usize,
    pub path: String,
}

impl QrFragment {
    /// Encodes `data` as a QR symbol.
    ///
    /// # Examples
    ///
    /// ```
    /// use invent_label::QrFragment;
    ///
    /// let qr = QrFragment::encode("LAB-000001").unwrap();
    /// assert_eq!(qr.size, 21 + 8);
    /// assert!(qr.path.starts_with("M4,4h7"));
    /// ```
    pub fn encode(data: &str) -> Result<Self> {
        let code = QrCode::new(data.as_bytes()).map_err(|e| LabelError::QrCode(e.to_string()))?;
        let width = code.width();
        let colors = code.to_colors();

        let mut path = String::new();
        for (y, row) in colors.chunks(width).enumerate() {
            let mut x = 0;
            while x < width {
                if row[x] != Color::Dark {
                    x += 1;
                    continue;
                }
                let start = x;
                while x < width && row[x] == Color::Dark {
                    x += 1;
                }
                let run = x - start;
                path.push_str(&format!(
                    "M{},{}h{run}v1h-{run}z",
                    start + QUIET_ZONE,
                    y + QUIET_ZONE
                ));
            }
        }

        Ok(Self {
            data: data.to_string(),
            size: width + 2 * QUIET_ZONE,
            path,
        })
    }
}

/// Resolves `reference` against `base` the way a browser resolves a
/// relative link.
///
/// A base ending in `/` is appended to; otherwise its last path segment
/// is replaced. Query and fragment of the base are dropped.
///
/// # Examples
///
/// ```
/// use invent_label::url_join;
///
/// assert_eq!(url_join("https://inv.example/i/", "LAB-000001"), "https://inv.example/i/LAB-000001");
/// assert_eq!(url_join("https://inv.example/i/index", "LAB-000001"), "https://inv.example/i/LAB-000001");
/// assert_eq!(url_join("https://inv.example", "LAB-000001"), "https://inv.example/LAB-000001");
/// ```
pub fn url_join(base: &str, reference: &str) -> String {
    if base.is_empty() {
        return reference.to_string();
    }
    let base = base
        .split(['?', '#'])
        .next()
        .unwrap_or(base);

    let (authority_end, has_authority) = match base.find("://") {
        Some(scheme_end) => {
            let rest = scheme_end + 3;
            let end = base[rest..].find('/').map_or(base.len(), |i| rest + i);
            (end, true)
        }
        None => (0, false),
    };

    if has_authority && authority_end == base.len() {
        return format!("{base}/{reference}");
    }
    match base[authority_end..].rfind('/') {
        Some(slash) => format!("{}{reference}", &base[..authority_end + slash + 1]),
        None => reference.to_string(),
    }
}
