// ==============================================================================
// Shared Test Helpers
// ==============================================================================
//
// Common utility functions used across multiple integration test files.
//
// Each test file that imports this module compiles its own copy, so not every
// function is used in every binary. Suppress the resulting dead_code warnings.
#![allow(dead_code)]
// Import this module in each test file with:
//
//     mod common;
//     use common::{fixture, read_golden, render_diagnostic};

use std::fs;
use std::path::{Path, PathBuf};

use miette::{GraphicalReportHandler, GraphicalTheme};

/// Every file the translator writes for the `qemu` fixture tree, in the
/// order it produces them.
pub const QEMU_OUTPUTS: [&str; 6] = [
    "block.proto",
    "common.proto",
    "run-state.proto",
    "descriptor.proto",
    "service.proto",
    "events.proto",
];

/// Absolute path of a directory or file under `tests/fixtures`.
pub fn fixture(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(relative)
}

/// Read a golden `.proto` file from `tests/fixtures/expected`.
///
/// Line endings are normalized so checkouts with `\r\n` still compare equal.
pub fn read_golden(name: &str) -> String {
    let path = fixture("expected").join(name);
    fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read golden file {}: {e}", path.display()))
        .replace("\r\n", "\n")
}

/// Names of the regular files directly inside `dir`, sorted.
pub fn list_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("failed to list {}: {e}", dir.display()))
        .map(|entry| {
            entry
                .expect("directory entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}

/// Render a single diagnostic to a deterministic string for snapshot tests.
/// Uses non-unicode theme at 80 columns.
pub fn render_diagnostic(report: &miette::Report) -> String {
    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::none()).with_width(80);
    let mut buf = String::new();
    handler
        .render_report(&mut buf, report.as_ref())
        .expect("render to String is infallible");
    buf
}
