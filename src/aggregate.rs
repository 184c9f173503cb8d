//! Operations over whole reports: merging runs, diffing two snapshots, and
//! gating on a minimum percentage.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::{CovpeekError, Result};
use crate::model::{CoverageReport, FileCoverage, FunctionCoverage};

/// Combine several reports into one.
///
/// Files are matched by path. For a path present in more than one report the
/// stated totals are summed, line execution counts are summed (the first
/// checksum seen is kept) and functions with the same name and line are
/// summed. The report name is the first one any input carries.
pub fn merge<'a>(reports: impl IntoIterator<Item = &'a CoverageReport>) -> CoverageReport {
    let mut merged = CoverageReport::new();
    let mut files: BTreeMap<String, FileCoverage> = BTreeMap::new();

    for report in reports {
        if merged.test_name.is_none() {
            merged.test_name.clone_from(&report.test_name);
        }
        for file in report.files() {
            match files.get_mut(&file.path) {
                Some(acc) => absorb(acc, file),
                None => {
                    files.insert(file.path.clone(), file.clone());
                }
            }
        }
    }

    for (_, mut file) in files {
        file.functions = combine_functions(file.functions);
        file.recompute();
        merged.insert_file(file);
    }
    merged
}

fn absorb(acc: &mut FileCoverage, other: &FileCoverage) {
    acc.total_lines = acc.total_lines.saturating_add(other.total_lines);
    acc.covered_lines = acc.covered_lines.saturating_add(other.covered_lines);
    for (&number, line) in &other.lines {
        acc.lines
            .entry(number)
            .and_modify(|l| l.execution_count = l.execution_count.saturating_add(line.execution_count))
            .or_insert_with(|| line.clone());
    }
    acc.functions.extend(other.functions.iter().cloned());
}

/// Sum functions sharing `(line, name)`, ordered by line then name.
fn combine_functions(functions: Vec<FunctionCoverage>) -> Vec<FunctionCoverage> {
    let mut combined: BTreeMap<(u32, String), i64> = BTreeMap::new();
    for f in functions {
        let count = combined.entry((f.line_number, f.name)).or_default();
        *count = count.saturating_add(f.execution_count);
    }
    combined
        .into_iter()
        .map(|((line_number, name), execution_count)| FunctionCoverage {
            name,
            line_number,
            execution_count,
        })
        .collect()
}

/// Per-file change between two reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileChange {
    pub path: String,
    /// 0 when the file is absent from the first report.
    pub coverage_a: f64,
    /// 0 when the file is absent from the second report.
    pub coverage_b: f64,
    pub delta: f64,
}

/// How coverage moved from report A to report B.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageDiff {
    pub overall_a: f64,
    pub overall_b: f64,
    pub overall_delta: f64,
    /// One entry per path present on either side, sorted by path.
    pub file_changes: Vec<FileChange>,
}

impl CoverageDiff {
    /// Files whose coverage went down.
    pub fn regressions(&self) -> impl Iterator<Item = &FileChange> {
        self.file_changes.iter().filter(|c| c.delta < 0.0)
    }
}

/// Compare two reports. Every delta is `B - A`.
pub fn diff(a: &CoverageReport, b: &CoverageReport) -> CoverageDiff {
    let overall_a = a.totals().coverage_pct;
    let overall_b = b.totals().coverage_pct;

    let paths: BTreeSet<&String> = a.paths().chain(b.paths()).collect();
    let file_changes = paths
        .into_iter()
        .map(|path| {
            let coverage_a = a.file(path).map_or(0.0, |f| f.coverage_pct);
            let coverage_b = b.file(path).map_or(0.0, |f| f.coverage_pct);
            FileChange {
                path: path.clone(),
                coverage_a,
                coverage_b,
                delta: coverage_b - coverage_a,
            }
        })
        .collect();

    CoverageDiff {
        overall_a,
        overall_b,
        overall_delta: overall_b - overall_a,
        file_changes,
    }
}

/// Result of comparing a report against a minimum percentage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdOutcome {
    pub actual: f64,
    pub minimum: f64,
    pub passed: bool,
}

/// Check the aggregate percentage of `report` against `minimum` (0-100).
pub fn check_threshold(report: &CoverageReport, minimum: f64) -> Result<ThresholdOutcome> {
    if !(0.0..=100.0).contains(&minimum) {
        return Err(CovpeekError::InvalidThreshold(minimum));
    }

    let actual = report.totals().coverage_pct;
    let passed = actual >= minimum;
    if !passed {
        tracing::debug!(actual, minimum, "coverage below threshold");
    }
    Ok(ThresholdOutcome {
        actual,
        minimum,
        passed,
    })
}

/// A copy of `report` holding only files strictly below `threshold` percent.
pub fn filter_below(report: &CoverageReport, threshold: f64) -> CoverageReport {
    let mut filtered = CoverageReport::new();
    filtered.test_name.clone_from(&report.test_name);
    for file in report.files().filter(|f| f.coverage_pct < threshold) {
        filtered.insert_file(file.clone());
    }
    filtered
}
