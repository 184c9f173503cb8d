#![allow(dead_code)]

use std::path::PathBuf;

use covpeek::model::{CoverageReport, FileCoverage, LineCoverage};
use tempfile::TempDir;

/// Path of a file under `tests/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn fixture(name: &str) -> Vec<u8> {
    std::fs::read(fixture_path(name)).unwrap()
}

/// Write `content` under `name` in a fresh temporary directory.
/// The caller must hold onto `TempDir` to keep the file alive.
pub fn write_temp(name: &str, content: &[u8]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    (dir, path)
}

/// A file whose totals are derived from `lines` (`(line, count)` pairs).
pub fn file(path: &str, lines: &[(u32, i64)]) -> FileCoverage {
    let mut file = FileCoverage::new(path);
    for &(number, count) in lines {
        file.lines.insert(number, LineCoverage::new(number, count));
    }
    file.recount_from_lines();
    file
}

pub fn report(files: Vec<FileCoverage>) -> CoverageReport {
    let mut report = CoverageReport::new();
    for f in files {
        report.insert_file(f);
    }
    report
}

pub fn assert_pct(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-4,
        "expected {expected}%, got {actual}%"
    );
}
