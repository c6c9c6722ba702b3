//! Integration tests for the invent-label crate.
//!
//! The converter is replaced by small shell scripts so the tests do not
//! depend on librsvg being installed.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use invent_label::{
    LabelAttributes, LabelError, LabelKind, LabelOutput, LabelRenderer, RendererConfig,
};

/// Serializes script creation and execution; executing a file another
/// thread still holds open for writing fails with ETXTBSY.
static SCRIPT_LOCK: Mutex<()> = Mutex::new(());

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn renderer_with(converter: &Path, timeout_secs: u64) -> LabelRenderer {
    LabelRenderer::new(RendererConfig {
        converter: converter.display().to_string(),
        timeout_secs,
        ..Default::default()
    })
    .unwrap()
}

fn scope_attrs(kind: LabelKind) -> LabelAttributes {
    LabelAttributes::from_pairs(
        kind,
        [("title", "Oscilloscope"), ("inventory_number", "LAB-000001")],
    )
    .unwrap()
}

#[test]
fn test_converter_receives_svg_and_arguments() {
    let _guard = SCRIPT_LOCK.lock().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let args_file = dir.path().join("args");
    let script = write_script(
        dir.path(),
        "convert.sh",
        &format!("echo \"$@\" > '{}'\ncat", args_file.display()),
    );

    let renderer = renderer_with(&script, 10);
    let kind = LabelKind::Simple100x62;
    let document = renderer.render(kind, &scope_attrs(kind)).unwrap();

    let text = String::from_utf8(document).unwrap();
    assert!(text.starts_with("<?xml"));
    assert!(text.contains("Oscilloscope"));
    assert!(text.contains("<path"));
    assert_eq!(
        fs::read_to_string(&args_file).unwrap().trim(),
        "-f pdf -d 72 -p 72"
    );
}

#[test]
fn test_dpi_flags_can_be_omitted() {
    let _guard = SCRIPT_LOCK.lock().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let args_file = dir.path().join("args");
    let script = write_script(
        dir.path(),
        "convert.sh",
        &format!("echo \"$@\" > '{}'\ncat >/dev/null", args_file.display()),
    );

    let renderer = LabelRenderer::new(RendererConfig {
        converter: script.display().to_string(),
        dpi: None,
        ..Default::default()
    })
    .unwrap();
    let kind = LabelKind::Simple62x29;
    renderer.render(kind, &scope_attrs(kind)).unwrap();
    assert_eq!(fs::read_to_string(&args_file).unwrap().trim(), "-f pdf");
}

#[test]
fn test_failed_conversion_writes_nothing() {
    let _guard = SCRIPT_LOCK.lock().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "convert.sh",
        "cat >/dev/null\necho 'cannot parse SVG' >&2\nexit 3",
    );

    let renderer = renderer_with(&script, 10);
    let target = dir.path().join("label.pdf");
    let kind = LabelKind::Simple62x29;
    let err = renderer
        .render_to(kind, &scope_attrs(kind), &LabelOutput::File(target.clone()))
        .unwrap_err();

    match err {
        LabelError::ConverterFailed { status, stderr } => {
            assert!(status.contains('3'), "{status}");
            assert_eq!(stderr, "cannot parse SVG");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!target.exists());
    // Only the script remains; no stray temporary files.
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_file_output_replaces_existing_file() {
    let _guard = SCRIPT_LOCK.lock().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "convert.sh", "cat >/dev/null\nprintf '%%PDF-1.4 fake'");

    let target = dir.path().join("label.pdf");
    fs::write(&target, "old contents").unwrap();

    let renderer = renderer_with(&script, 10);
    let kind = LabelKind::Simple62x29;
    renderer
        .render_to(kind, &scope_attrs(kind), &LabelOutput::File(target.clone()))
        .unwrap();
    assert_eq!(fs::read_to_string(&target).unwrap(), "%PDF-1.4 fake");
}

#[test]
fn test_slow_converter_is_killed() {
    let _guard = SCRIPT_LOCK.lock().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "convert.sh", "exec sleep 30");

    let renderer = renderer_with(&script, 1);
    let kind = LabelKind::Simple62x29;
    let started = std::time::Instant::now();
    let err = renderer.render(kind, &scope_attrs(kind)).unwrap_err();
    assert!(matches!(
        err,
        LabelError::ConverterTimeout { timeout_secs: 1, .. }
    ));
    assert!(started.elapsed() < std::time::Duration::from_secs(20));
}
