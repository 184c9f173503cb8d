/// Parser for the LCOV `.info` format.
///
/// Reference: https://ltp.sourceforge.net/coverage/lcov/geninfo.1.php
///
/// Key records:
///   TN:<test name>
///   SF:<absolute path to source file>
///   FN:<line>,<function name>
///   FNDA:<execution count>,<function name>
///   FNF:<number of functions found>
///   FNH:<number of functions hit>
///   DA:<line number>,<execution count>[,<checksum>]
///   BRDA:<line>,<block>,<branch>,<taken>
///   BRF:<branches found>
///   BRH:<branches hit>
///   LF:<lines found>
///   LH:<lines hit>
///   end_of_record
///
/// `LH`/`LF` are taken as authoritative for a file's totals; the `DA`
/// entries only populate the line map.
use std::collections::HashMap;
use std::io::BufRead;

use super::{CoverageParser, NumberedLines, ParseOutcome, Warnings};
use crate::detect::Format;
use crate::error::Result;
use crate::model::*;

/// LCOV format parser.
pub struct LcovParser;

impl CoverageParser for LcovParser {
    fn format(&self) -> Format {
        Format::Lcov
    }

    fn parse_reader(
        &self,
        reader: &mut dyn BufRead,
        warnings: &mut Warnings,
    ) -> Result<CoverageReport> {
        parse_reader(reader, warnings)
    }
}

/// Parse LCOV coverage data from raw bytes.
pub fn parse(input: &[u8]) -> Result<ParseOutcome> {
    LcovParser.parse(input)
}

/// The file currently being assembled, plus a name index into its
/// function list so `FNDA` lookups stay O(1).
struct OpenFile {
    file: FileCoverage,
    fn_index: HashMap<String, usize>,
}

impl OpenFile {
    fn new(path: &str) -> Self {
        Self {
            file: FileCoverage::new(path),
            fn_index: HashMap::new(),
        }
    }

    fn finish(mut self, report: &mut CoverageReport) {
        self.file.recompute();
        report.insert_file(self.file);
    }
}

fn parse_reader(reader: &mut dyn BufRead, warnings: &mut Warnings) -> Result<CoverageReport> {
    let mut report = CoverageReport::new();
    let mut current: Option<OpenFile> = None;

    for next in NumberedLines::new(reader) {
        let (line_no, line) = next?;
        if line.is_empty() {
            continue;
        }

        if line == "end_of_record" {
            if let Some(open) = current.take() {
                open.finish(&mut report);
            }
            continue;
        }

        let Some((tag, value)) = line.split_once(':') else {
            warnings.at_line(line_no, format_args!("unknown record type: {line}"));
            continue;
        };

        match tag {
            "TN" => {
                report.test_name = (!value.is_empty()).then(|| value.to_string());
            }
            "SF" => {
                if let Some(open) = current.take() {
                    warnings.at_line(
                        line_no,
                        format_args!("missing end_of_record for {}", open.file.path),
                    );
                    open.finish(&mut report);
                }
                current = Some(OpenFile::new(value));
            }
            "FNF" | "FNH" | "BRF" | "BRH" | "BRDA" => {
                // Function totals are derived from FN/FNDA; branch data is not modelled.
            }
            "FN" | "FNDA" | "DA" | "LH" | "LF" => {
                let Some(open) = current.as_mut() else {
                    warnings.at_line(line_no, format_args!("{tag} record without active source file"));
                    continue;
                };
                let applied = match tag {
                    "FN" => apply_fn(open, value),
                    "FNDA" => apply_fnda(open, value),
                    "DA" => apply_da(open, value, line_no, warnings),
                    "LH" => parse_count(tag, value).map(|n| open.file.covered_lines = n),
                    _ => parse_count(tag, value).map(|n| open.file.total_lines = n),
                };
                if let Err(message) = applied {
                    warnings.at_line(line_no, message);
                }
            }
            _ => warnings.at_line(line_no, format_args!("unknown record type: {line}")),
        }
    }

    if let Some(open) = current.take() {
        warnings.push(format!(
            "missing end_of_record for {} at end of input",
            open.file.path
        ));
        open.finish(&mut report);
    }

    Ok(report)
}

/// `FN:<line>,<name>`
fn apply_fn(open: &mut OpenFile, value: &str) -> std::result::Result<(), String> {
    let (line_str, name) = value
        .split_once(',')
        .ok_or_else(|| format!("invalid FN format: FN:{value}"))?;
    let line_number = line_str
        .parse::<u32>()
        .map_err(|_| format!("invalid line number in FN: {line_str}"))?;

    let functions = &mut open.file.functions;
    open.fn_index
        .entry(name.to_string())
        .or_insert(functions.len());
    functions.push(FunctionCoverage {
        name: name.to_string(),
        line_number,
        execution_count: 0,
    });
    Ok(())
}

/// `FNDA:<count>,<name>`. Data for an undeclared function is dropped.
fn apply_fnda(open: &mut OpenFile, value: &str) -> std::result::Result<(), String> {
    let (count_str, name) = value
        .split_once(',')
        .ok_or_else(|| format!("invalid FNDA format: FNDA:{value}"))?;
    let execution_count = count_str
        .parse::<i64>()
        .map_err(|_| format!("invalid execution count in FNDA: {count_str}"))?;

    if let Some(&idx) = open.fn_index.get(name) {
        open.file.functions[idx].execution_count = execution_count;
    }
    Ok(())
}

/// `DA:<line>,<count>[,<checksum>]`
fn apply_da(
    open: &mut OpenFile,
    value: &str,
    line_no: usize,
    warnings: &mut Warnings,
) -> std::result::Result<(), String> {
    let mut parts = value.splitn(3, ',');
    let (Some(line_str), Some(count_str)) = (parts.next(), parts.next()) else {
        return Err(format!("invalid DA format: DA:{value}"));
    };
    let line_number = line_str
        .parse::<u32>()
        .map_err(|_| format!("invalid line number in DA: {line_str}"))?;
    let execution_count = count_str
        .parse::<i64>()
        .map_err(|_| format!("invalid execution count in DA: {count_str}"))?;
    let checksum = parts.next().filter(|c| !c.is_empty()).map(str::to_string);

    if execution_count < 0 {
        warnings.at_line(
            line_no,
            format_args!("negative execution count {execution_count} for line {line_number}"),
        );
    }

    open.file.lines.insert(
        line_number,
        LineCoverage {
            line_number,
            execution_count,
            checksum,
        },
    );
    Ok(())
}

fn parse_count(tag: &str, value: &str) -> std::result::Result<u64, String> {
    value
        .parse::<u64>()
        .map_err(|_| format!("invalid {tag} value: {value}"))
}
