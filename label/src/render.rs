//! Label rendering.
//!
//! A [`LabelRenderer`] owns its template set and converter settings; there
//! is no process-wide template environment. Rendering is two-stage: the
//! kind's SVG template is filled from the attributes, then the SVG is
//! converted to PDF by the external converter.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tera::{Context, Tera};
use tracing::{debug, info};

use crate::attributes::LabelAttributes;
use crate::converter::Converter;
use crate::error::{LabelError, Result};
use crate::kind::LabelKind;
use crate::qr::{QrFragment, url_join};

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (
        "simple-62x29.svg",
        include_str!("../templates/simple-62x29.svg"),
    ),
    (
        "simple-100x62.svg",
        include_str!("../templates/simple-100x62.svg"),
    ),
];

/// Converter and template settings.
///
/// Deserializes from the `renderer` section of the configuration file;
/// every field is optional there.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RendererConfig {
    /// Converter program.
    pub converter: String,
    /// Resolution passed as `-d X -p Y`; `None` omits the flags.
    pub dpi: Option<[u32; 2]>,
    /// Seconds the converter may run before it is killed.
    pub timeout_secs: u64,
    /// Directory whose `<kind>.svg` files replace the built-in templates.
    pub template_dir: Option<PathBuf>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            converter: "rsvg-convert".to_string(),
            dpi: Some([72, 72]),
            timeout_secs: 30,
            template_dir: None,
        }
    }
}

/// Where a rendered label goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelOutput {
    Stdout,
    File(PathBuf),
}

impl LabelOutput {
    /// Maps a command-line path, where `-` means standard output.
    pub fn from_arg(path: &Path) -> Self {
        if path.as_os_str() == "-" {
            LabelOutput::Stdout
        } else {
            LabelOutput::File(path.to_path_buf())
        }
    }
}

/// Renders labels to SVG and PDF.
///
/// # Examples
///
/// ```
/// use invent_label::{LabelAttributes, LabelKind, LabelRenderer, RendererConfig};
///
/// let renderer = LabelRenderer::new(RendererConfig::default()).unwrap();
/// let attrs = LabelAttributes::from_pairs(
///     LabelKind::Simple62x29,
///     [("title", "Oscilloscope"), ("inventory_number", "LAB-000001")],
/// )
/// .unwrap();
/// let svg = renderer.render_svg(LabelKind::Simple62x29, &attrs).unwrap();
/// assert!(svg.contains("LAB-000001"));
/// ```
pub struct LabelRenderer {
    tera: Tera,
    converter: Converter,
}

impl LabelRenderer {
    /// Builds a renderer from its configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LabelError::Template`] if a template does not parse and
    /// [`LabelError::Io`] if an override template cannot be read.
    pub fn new(config: RendererConfig) -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![".svg"]);
        for (name, source) in BUILTIN_TEMPLATES {
            tera.add_raw_template(name, source)?;
        }

        if let Some(dir) = &config.template_dir {
            for kind in LabelKind::ALL {
                let path = dir.join(kind.template_name());
                if path.is_file() {
                    debug!(path = %path.display(), "loading template override");
                    let source = fs::read_to_string(&path)?;
                    tera.add_raw_template(kind.template_name(), &source)?;
                }
            }
        }

        let converter = Converter::new(
            config.converter,
            config.dpi.map(|[x, y]| (x, y)),
            Duration::from_secs(config.timeout_secs),
        );
        Ok(Self { tera, converter })
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    /// The QR code this label would carry, if any.
    ///
    /// A QR code needs an inventory number and is drawn when
    /// `generate_qrcode` is set (or defaulted on by the kind). For kinds
    /// that use `url_base`, the number is joined onto it.
    pub fn qr_fragment(&self, kind: LabelKind, attrs: &LabelAttributes) -> Result<Option<QrFragment>> {
        let wanted = attrs
            .get_bool("generate_qrcode")
            .unwrap_or(kind.qrcode_by_default());
        let Some(number) = attrs.get_str("inventory_number").filter(|_| wanted) else {
            return Ok(None);
        };
        let data = match attrs.get_str("url_base") {
            Some(base) if kind.uses_url_base() => url_join(base, number),
            _ => number.to_string(),
        };
        QrFragment::encode(&data).map(Some)
    }

    /// Fills the kind's SVG template.
    pub fn render_svg(&self, kind: LabelKind, attrs: &LabelAttributes) -> Result<String> {
        let mut context = Context::new();
        for (name, _) in kind.attributes() {
            context.insert(*name, &Value::Null);
        }
        for (name, value) in attrs.as_map() {
            context.insert(name.as_str(), value);
        }
        context.insert("qr", &self.qr_fragment(kind, attrs)?);
        context.insert("dimensions", &kind.dimensions());
        context.insert("label_type", kind.name());

        let svg = self.tera.render(kind.template_name(), &context)?;
        debug!(label_type = %kind, bytes = svg.len(), "rendered SVG");
        Ok(svg)
    }

    /// Renders the label as a document of the kind's media type.
    pub fn render(&self, kind: LabelKind, attrs: &LabelAttributes) -> Result<Vec<u8>> {
        let svg = self.render_svg(kind, attrs)?;
        self.converter.convert(svg.as_bytes())
    }

    /// Renders the label and writes it to `output`.
    ///
    /// A file is only created once conversion has succeeded, and is
    /// replaced atomically.
    pub fn render_to(
        &self,
        kind: LabelKind,
        attrs: &LabelAttributes,
        output: &LabelOutput,
    ) -> Result<()> {
        let document = self.render(kind, attrs)?;
        match output {
            LabelOutput::Stdout => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(&document)?;
                stdout.flush()?;
                debug!(label_type = %kind, bytes = document.len(), "wrote label to stdout");
            }
            LabelOutput::File(path) => {
                write_atomically(path, &document).map_err(|source| LabelError::Output {
                    path: path.clone(),
                    source,
                })?;
                info!(label_type = %kind, path = %path.display(), "wrote label");
            }
        }
        Ok(())
    }
}

fn write_atomically(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
