//! Text, CSV and JSON rendering of items and realms.

use std::io::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use invent_core::{ItemWithRealm, Realm};
use qrcode::QrCode;
use qrcode::render::unicode::Dense1x2;
use serde::Serialize;
use tera::{Context, Tera};
use tracing::warn;

/// Flat view of an item for templates, CSV and JSON.
#[derive(Debug, Clone, Serialize)]
pub struct ItemRow<'a> {
    pub id: i64,
    pub inventory_number: Option<&'a str>,
    pub title: &'a str,
    pub owner: Option<&'a str>,
    pub resource_url: Option<&'a str>,
    pub created_at: String,
    pub updated_at: String,
    pub realm_id: i64,
    pub realm_name: &'a str,
    pub realm_prefix: &'a str,
    pub is_active: bool,
    pub is_labeled: bool,
}

impl<'a> From<&'a ItemWithRealm> for ItemRow<'a> {
    fn from(entry: &'a ItemWithRealm) -> Self {
        let item = &entry.item;
        Self {
            id: item.id,
            inventory_number: item.inventory_number.as_deref(),
            title: &item.title,
            owner: item.owner.as_deref(),
            resource_url: item.resource_url.as_deref(),
            created_at: timestamp(&item.created_at),
            updated_at: timestamp(&item.updated_at),
            realm_id: item.realm_id,
            realm_name: entry.realm_name(),
            realm_prefix: entry.realm_prefix(),
            is_active: item.is_active,
            is_labeled: item.is_labeled,
        }
    }
}

pub fn timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Prints the detail block for one item.
pub fn write_item(out: &mut impl Write, entry: &ItemWithRealm, show_qrcode: bool) -> std::io::Result<()> {
    let item = &entry.item;
    writeln!(out, "{} – {}", entry.display_number(), item.title)?;
    writeln!(out, "{}", "-".repeat(80))?;
    writeln!(out, "  Realm:        {}", entry.realm_name())?;
    if let Some(url) = &item.resource_url {
        writeln!(out, "  Resource URL: {url}")?;
    }
    if let Some(owner) = &item.owner {
        writeln!(out, "  Owner:        {owner}")?;
    }
    if !item.is_active {
        writeln!(out, "  Status:       inactive")?;
    }
    if item.is_labeled {
        writeln!(out, "  Labeled:      yes")?;
    }
    writeln!(out, "  Created at:   {}", timestamp(&item.created_at))?;
    writeln!(out, "  Updated at:   {}", timestamp(&item.updated_at))?;

    if let Some(number) = item.inventory_number.as_deref().filter(|_| show_qrcode) {
        match QrCode::new(number.as_bytes()) {
            Ok(code) => {
                writeln!(out)?;
                let rendered = code
                    .render::<Dense1x2>()
                    .dark_color(Dense1x2::Light)
                    .light_color(Dense1x2::Dark)
                    .build();
                writeln!(out, "{rendered}")?;
            }
            Err(e) => warn!(inventory_number = number, error = %e, "cannot encode QR code"),
        }
    }
    writeln!(out)?;
    Ok(())
}

/// One-line-per-record formatting driven by a `tera` template.
pub struct LineTemplate {
    tera: Tera,
}

impl LineTemplate {
    const NAME: &'static str = "line";

    pub fn new(template: &str) -> Result<Self, String> {
        let mut tera = Tera::default();
        tera.add_raw_template(Self::NAME, template)
            .map_err(|e| format!("invalid --format template: {}", describe(&e)))?;
        Ok(Self { tera })
    }

    pub fn render(&self, record: &impl Serialize) -> Result<String, String> {
        let context = Context::from_serialize(record)
            .map_err(|e| format!("failed to build template context: {e}"))?;
        self.tera
            .render(Self::NAME, &context)
            .map_err(|e| format!("failed to render --format template: {}", describe(&e)))
    }
}

fn describe(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

pub fn item_line(entry: &ItemWithRealm) -> String {
    format!("{}:  {}", entry.display_number(), entry.item.title)
}

pub fn realm_line(realm: &Realm) -> String {
    let mut line = format!("{}: {}", realm.prefix, realm.name);
    if realm.is_external {
        line.push_str(" (external)");
    }
    line
}

pub fn write_csv(out: impl Write, items: &[ItemWithRealm]) -> Result<(), String> {
    let mut writer = csv::Writer::from_writer(out);
    for entry in items {
        writer
            .serialize(ItemRow::from(entry))
            .map_err(|e| format!("failed to write CSV: {e}"))?;
    }
    writer
        .flush()
        .map_err(|e| format!("failed to write CSV: {e}"))
}

pub fn write_json(mut out: impl Write, items: &[ItemWithRealm]) -> Result<(), String> {
    let rows: Vec<ItemRow<'_>> = items.iter().map(ItemRow::from).collect();
    serde_json::to_writer_pretty(&mut out, &rows)
        .map_err(|e| format!("failed to write JSON: {e}"))?;
    writeln!(out).map_err(|e| format!("failed to write JSON: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use invent_core::Item;

    fn entry() -> ItemWithRealm {
        let ts = Utc.with_ymd_and_hms(2017, 8, 25, 21, 54, 47).unwrap();
        ItemWithRealm {
            item: Item {
                id: 1,
                inventory_number: Some("LAB-000001".to_string()),
                title: "Oscilloscope".to_string(),
                owner: Some("Alice".to_string()),
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
                url_base: None,
                is_external: false,
            },
        }
    }

    #[test]
    fn test_item_block_without_qrcode() {
        let mut out = Vec::new();
        write_item(&mut out, &entry(), false).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "LAB-000001 – Oscilloscope");
        assert_eq!(lines[1].len(), 80);
        assert_eq!(lines[2], "  Realm:        Laboratory");
        assert_eq!(lines[3], "  Owner:        Alice");
        assert_eq!(lines[4], "  Created at:   2017-08-25T21:54:47Z");
        assert!(!text.contains('▀'));
    }

    #[test]
    fn test_item_block_with_qrcode() {
        let mut out = Vec::new();
        write_item(&mut out, &entry(), true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains('█') || text.contains('▀') || text.contains('▄'));
    }

    #[test]
    fn test_oversized_number_skips_qrcode() {
        let mut long = entry();
        long.item.inventory_number = Some("X".repeat(8000));
        let mut out = Vec::new();
        write_item(&mut out, &long, true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("  Updated at:   2017-08-25T21:54:47Z"));
        assert!(!text.contains('█') && !text.contains('▀') && !text.contains('▄'));
    }

    #[test]
    fn test_line_template() {
        let template = LineTemplate::new("{{ realm_prefix }}|{{ inventory_number }}|{{ owner }}").unwrap();
        let e = entry();
        assert_eq!(
            template.render(&ItemRow::from(&e)).unwrap(),
            "LAB|LAB-000001|Alice"
        );
        assert!(LineTemplate::new("{{ unclosed").is_err());
    }

    #[test]
    fn test_csv_has_header() {
        let mut out = Vec::new();
        write_csv(&mut out, &[entry()]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,inventory_number,title,owner,resource_url,created_at,updated_at,realm_id,realm_name,realm_prefix,is_active,is_labeled"
        );
        assert_eq!(
            lines.next().unwrap(),
            "1,LAB-000001,Oscilloscope,Alice,,2017-08-25T21:54:47Z,2017-08-25T21:54:47Z,1,Laboratory,LAB,true,false"
        );
    }

    #[test]
    fn test_realm_line() {
        let mut realm = entry().realm;
        assert_eq!(realm_line(&realm), "LAB: Laboratory");
        realm.is_external = true;
        assert_eq!(realm_line(&realm), "LAB: Laboratory (external)");
    }
}
