/// Parser for coverage.py's `coverage.json` report.
///
/// Reference: https://coverage.readthedocs.io/en/latest/cmd.html#json-reporting-coverage-json
///
/// Shape (other top-level keys such as `meta` and `totals` are ignored):
///   {
///     "files": {
///       "<path>": {
///         "executed_lines": [1, 2, ...],
///         "missing_lines": [3, ...],
///         "summary": { "covered_lines": 2, "num_statements": 3, ... }
///       }
///     }
///   }
///
/// The format records no hit counts: executed lines get count 1 and missing
/// lines count 0.
use std::io::{BufRead, Read};

use serde::Deserialize;
use serde_json::Value;

use super::{normalize_path, CoverageParser, ParseOutcome, Warnings};
use crate::detect::Format;
use crate::error::{CovpeekError, Result};
use crate::model::*;

/// coverage.py JSON parser.
pub struct CoverageJsonParser;

impl CoverageParser for CoverageJsonParser {
    fn format(&self) -> Format {
        Format::CoverageJson
    }

    fn parse_reader(
        &self,
        reader: &mut dyn BufRead,
        warnings: &mut Warnings,
    ) -> Result<CoverageReport> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        parse_document(&data, warnings)
    }
}

/// Parse coverage.py JSON from raw bytes.
pub fn parse(input: &[u8]) -> Result<ParseOutcome> {
    CoverageJsonParser.parse(input)
}

#[derive(Debug, Deserialize)]
struct FileEntry {
    #[serde(default)]
    executed_lines: Vec<u32>,
    #[serde(default)]
    missing_lines: Vec<u32>,
    #[serde(default)]
    summary: Option<Summary>,
}

#[derive(Debug, Deserialize)]
struct Summary {
    #[serde(default)]
    covered_lines: u64,
    #[serde(default)]
    num_statements: u64,
}

fn parse_document(data: &[u8], warnings: &mut Warnings) -> Result<CoverageReport> {
    let Value::Object(mut root) = serde_json::from_slice::<Value>(data)? else {
        return Err(CovpeekError::Parse(
            "coverage JSON must be an object at the top level".to_string(),
        ));
    };

    let mut report = CoverageReport::new();
    let files = match root.remove("files") {
        Some(Value::Object(files)) => files,
        Some(_) => {
            return Err(CovpeekError::Parse(
                "`files` in coverage JSON must be an object".to_string(),
            ))
        }
        None => {
            warnings.push("coverage JSON has no `files` mapping");
            return Ok(report);
        }
    };

    for (path, value) in files {
        let entry: FileEntry = match serde_json::from_value(value) {
            Ok(entry) => entry,
            Err(e) => {
                warnings.push(format!("failed to parse file {path}: {e}"));
                continue;
            }
        };

        let file = build_file(normalize_path(&path), entry, warnings);
        if report.insert_file(file).is_some() {
            warnings.push(format!(
                "file {}: duplicate entry after path normalization replaces an earlier one",
                normalize_path(&path)
            ));
        }
    }

    Ok(report)
}

fn build_file(path: &str, entry: FileEntry, warnings: &mut Warnings) -> FileCoverage {
    let mut file = FileCoverage::new(path);

    for line_number in entry.executed_lines {
        file.lines
            .insert(line_number, LineCoverage::new(line_number, 1));
    }
    for line_number in entry.missing_lines {
        file.lines
            .entry(line_number)
            .or_insert_with(|| LineCoverage::new(line_number, 0));
    }

    match entry.summary {
        Some(summary) if summary.num_statements > 0 => {
            file.total_lines = summary.num_statements;
            file.covered_lines = summary.covered_lines;
            file.recompute();

            let line_total = file.lines.len() as u64;
            let line_covered = file.lines.values().filter(|l| l.is_covered()).count() as u64;
            if summary.num_statements != line_total {
                warnings.push(format!(
                    "file {path}: summary num_statements ({}) doesn't match line count ({line_total})",
                    summary.num_statements
                ));
            }
            if summary.covered_lines != line_covered {
                warnings.push(format!(
                    "file {path}: summary covered_lines ({}) doesn't match calculated covered lines ({line_covered})",
                    summary.covered_lines
                ));
            }
        }
        _ => file.recount_from_lines(),
    }

    file
}
