//! Uniform in-memory representation of coverage data, independent of any
//! specific format. Every parser produces a `CoverageReport`; merge, diff and
//! threshold checks only ever look at this model.

use std::collections::btree_map::{self, BTreeMap};

use serde::Serialize;

/// Compute a coverage percentage (0–100), returning 0.0 when the total is zero.
#[must_use]
pub fn percent(covered: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        covered as f64 / total as f64 * 100.0
    }
}

/// A single instrumentable line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineCoverage {
    pub line_number: u32,
    /// Negative values only come from malformed input; parsers keep them
    /// and record a warning.
    pub execution_count: i64,
    /// LCOV `DA` checksum, when the producer emitted one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl LineCoverage {
    pub fn new(line_number: u32, execution_count: i64) -> Self {
        Self {
            line_number,
            execution_count,
            checksum: None,
        }
    }

    #[must_use]
    pub fn is_covered(&self) -> bool {
        self.execution_count > 0
    }
}

/// A function/method declaration and how often it ran.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionCoverage {
    pub name: String,
    pub line_number: u32,
    pub execution_count: i64,
}

/// Coverage data for a single source file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FileCoverage {
    pub path: String,
    pub total_lines: u64,
    pub covered_lines: u64,
    /// Derived from the two counts by [`FileCoverage::recompute`].
    pub coverage_pct: f64,
    pub functions: Vec<FunctionCoverage>,
    pub lines: BTreeMap<u32, LineCoverage>,
}

impl FileCoverage {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Refresh `coverage_pct` from the current counts.
    pub fn recompute(&mut self) {
        self.coverage_pct = percent(self.covered_lines, self.total_lines);
    }

    /// Derive both counts from the line map, then recompute.
    ///
    /// Used by formats whose totals are not stated explicitly in the input.
    pub fn recount_from_lines(&mut self) {
        self.total_lines = self.lines.len() as u64;
        self.covered_lines = self.lines.values().filter(|l| l.is_covered()).count() as u64;
        self.recompute();
    }
}

/// Aggregate numbers across every file of a report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoverageTotals {
    pub files: usize,
    pub total_lines: u64,
    pub covered_lines: u64,
    pub coverage_pct: f64,
}

/// The complete result of parsing a single coverage artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoverageReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_name: Option<String>,
    files: BTreeMap<String, FileCoverage>,
}

impl CoverageReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a file keyed by its own path. An existing entry for the same
    /// path is replaced and returned.
    pub fn insert_file(&mut self, file: FileCoverage) -> Option<FileCoverage> {
        self.files.insert(file.path.clone(), file)
    }

    #[must_use]
    pub fn file(&self, path: &str) -> Option<&FileCoverage> {
        self.files.get(path)
    }

    #[must_use]
    pub fn contains_file(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Files in path order.
    pub fn files(&self) -> btree_map::Values<'_, String, FileCoverage> {
        self.files.values()
    }

    pub fn paths(&self) -> btree_map::Keys<'_, String, FileCoverage> {
        self.files.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Sum every file's counts into one overall figure.
    #[must_use]
    pub fn totals(&self) -> CoverageTotals {
        let (total_lines, covered_lines) = self
            .files
            .values()
            .fold((0u64, 0u64), |(total, covered), f| {
                (total.saturating_add(f.total_lines), covered.saturating_add(f.covered_lines))
            });
        CoverageTotals {
            files: self.files.len(),
            total_lines,
            covered_lines,
            coverage_pct: percent(covered_lines, total_lines),
        }
    }
}

impl IntoIterator for CoverageReport {
    type Item = FileCoverage;
    type IntoIter = btree_map::IntoValues<String, FileCoverage>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_zero_total() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(5, 0), 0.0);
        assert!(!percent(0, 0).is_nan());
    }

    #[test]
    fn test_recompute() {
        let mut file = FileCoverage::new("src/lib.rs");
        file.total_lines = 3;
        file.covered_lines = 1;
        file.recompute();
        assert!((file.coverage_pct - 33.333_333).abs() < 1e-4);

        file.total_lines = 0;
        file.recompute();
        assert_eq!(file.coverage_pct, 0.0);
    }

    #[test]
    fn test_recount_from_lines() {
        let mut file = FileCoverage::new("a.go");
        file.lines.insert(1, LineCoverage::new(1, 4));
        file.lines.insert(2, LineCoverage::new(2, 0));
        file.lines.insert(3, LineCoverage::new(3, -1));
        file.lines.insert(4, LineCoverage::new(4, 1));
        file.recount_from_lines();
        assert_eq!(file.total_lines, 4);
        assert_eq!(file.covered_lines, 2);
        assert_eq!(file.coverage_pct, 50.0);
    }

    #[test]
    fn test_insert_file_last_write_wins() {
        let mut report = CoverageReport::new();
        let mut first = FileCoverage::new("a.rs");
        first.total_lines = 1;
        assert!(report.insert_file(first).is_none());

        let mut second = FileCoverage::new("a.rs");
        second.total_lines = 7;
        let replaced = report.insert_file(second).unwrap();
        assert_eq!(replaced.total_lines, 1);

        assert_eq!(report.len(), 1);
        assert_eq!(report.file("a.rs").unwrap().total_lines, 7);
        assert!(report.file("missing.rs").is_none());
    }

    #[test]
    fn test_totals() {
        let mut report = CoverageReport::new();
        assert_eq!(report.totals().coverage_pct, 0.0);

        for (path, total, covered) in [("a", 10, 5), ("b", 30, 25)] {
            let mut f = FileCoverage::new(path);
            f.total_lines = total;
            f.covered_lines = covered;
            f.recompute();
            report.insert_file(f);
        }

        let totals = report.totals();
        assert_eq!(totals.files, 2);
        assert_eq!(totals.total_lines, 40);
        assert_eq!(totals.covered_lines, 30);
        assert_eq!(totals.coverage_pct, 75.0);
    }

    #[test]
    fn test_serialize_report() {
        let mut report = CoverageReport::new();
        report.test_name = Some("unit".to_string());
        let mut f = FileCoverage::new("a.rs");
        f.lines.insert(1, LineCoverage::new(1, 2));
        f.recount_from_lines();
        report.insert_file(f);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["test_name"], "unit");
        assert_eq!(json["files"]["a.rs"]["covered_lines"], 1);
        assert_eq!(json["files"]["a.rs"]["lines"]["1"]["execution_count"], 2);
    }
}
