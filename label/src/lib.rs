//! Printable labels for inventory items.
//!
//! A label is an SVG template filled with item attributes and an optional
//! QR code, converted to PDF by an external program (`rsvg-convert` by
//! default).
//!
//! - [`LabelKind`]: the closed set of layouts and their declared attributes
//! - [`LabelAttributes`]: typed attribute values, optionally taken from an
//!   item
//! - [`QrFragment`]: QR symbol as SVG path data
//! - [`LabelRenderer`]: template rendering and conversion, configured by
//!   [`RendererConfig`]
//!
//! # Example
//!
//! ```no_run
//! use invent_label::{LabelAttributes, LabelKind, LabelOutput, LabelRenderer, RendererConfig};
//! use std::path::PathBuf;
//!
//! let renderer = LabelRenderer::new(RendererConfig::default()).unwrap();
//! let kind: LabelKind = "simple-100x62".parse().unwrap();
//! let attrs = LabelAttributes::from_pairs(
//!     kind,
//!     [("title", "Oscilloscope"), ("inventory_number", "LAB-000001")],
//! )
//! .unwrap();
//! renderer
//!     .render_to(kind, &attrs, &LabelOutput::File(PathBuf::from("LAB-000001.pdf")))
//!     .unwrap();
//! ```

mod attributes;
mod converter;
mod error;
mod kind;
mod qr;
mod render;

pub use attributes::LabelAttributes;
pub use converter::Converter;
pub use error::{LabelError, Result};
pub use kind::{AttributeType, Dimensions, LabelKind};
pub use qr::{QUIET_ZONE, QrFragment, url_join};
pub use render::{LabelOutput, LabelRenderer, RendererConfig};
