/// Parser for Go's `-coverprofile` format.
///
/// Reference: https://go.dev/blog/cover
///
/// Format:
///   mode: set|count|atomic
///   <file>:<startLine>.<startCol>,<endLine>.<endCol> <numStatements> <count>
///
/// Each entry describes a basic block. Since the model is per-line, every
/// block is expanded into the lines it spans. How overlapping blocks combine
/// depends on the mode: `count`/`atomic` sum, `set` ORs.
use std::collections::btree_map::Entry;
use std::collections::HashMap;
use std::io::BufRead;

use super::{CoverageParser, NumberedLines, ParseOutcome, Warnings};
use crate::detect::Format;
use crate::error::{CovpeekError, Result};
use crate::model::*;

/// Go coverage profile parser.
pub struct GocoverParser;

impl CoverageParser for GocoverParser {
    fn format(&self) -> Format {
        Format::GoCover
    }

    fn parse_reader(
        &self,
        reader: &mut dyn BufRead,
        warnings: &mut Warnings,
    ) -> Result<CoverageReport> {
        parse_reader(reader, warnings)
    }
}

/// Parse a Go coverage profile from raw bytes.
pub fn parse(input: &[u8]) -> Result<ParseOutcome> {
    GocoverParser.parse(input)
}

/// Accumulation mode declared on the first line of the profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Set,
    Count,
    Atomic,
    /// Accepted with a warning; accumulates like `Set`.
    Other(String),
}

impl Mode {
    fn parse(value: &str) -> Self {
        match value {
            "set" => Mode::Set,
            "count" => Mode::Count,
            "atomic" => Mode::Atomic,
            other => Mode::Other(other.to_string()),
        }
    }

    fn sums(&self) -> bool {
        matches!(self, Mode::Count | Mode::Atomic)
    }
}

/// Widest block, in lines, that is expanded into the line map.
pub const MAX_BLOCK_LINES: u32 = 100_000;

/// A parsed block from a single line of the coverage profile.
#[derive(Debug, PartialEq)]
struct Block<'a> {
    file: &'a str,
    start_line: u32,
    end_line: u32,
    count: i64,
}

fn parse_reader(reader: &mut dyn BufRead, warnings: &mut Warnings) -> Result<CoverageReport> {
    let mut lines = NumberedLines::new(reader);

    let mode = loop {
        let Some(next) = lines.next() else {
            return Err(CovpeekError::MissingMode);
        };
        let (line_no, line) = next?;
        if line.is_empty() {
            continue;
        }
        let value = line.strip_prefix("mode:").ok_or(CovpeekError::MissingMode)?;
        let mode = Mode::parse(value.trim());
        if let Mode::Other(name) = &mode {
            warnings.at_line(line_no, format_args!("unknown coverage mode: {name}"));
        }
        break mode;
    };

    let mut files: HashMap<String, FileCoverage> = HashMap::new();
    for next in lines {
        let (line_no, line) = next?;
        if line.is_empty() {
            continue;
        }

        let block = match parse_block_line(&line) {
            Ok(block) => block,
            Err(message) => {
                warnings.at_line(line_no, message);
                continue;
            }
        };
        if block.count < 0 {
            warnings.at_line(
                line_no,
                format_args!("negative execution count {} for {}", block.count, block.file),
            );
        }

        let file = files
            .entry(block.file.to_string())
            .or_insert_with(|| FileCoverage::new(block.file));
        apply_block(file, &block, &mode);
    }

    let mut report = CoverageReport::new();
    for (_, mut file) in files {
        file.recount_from_lines();
        report.insert_file(file);
    }
    Ok(report)
}

/// Parse `<file>:<startLine>.<startCol>,<endLine>.<endCol> <numStmt> <count>`.
///
/// The two numeric fields are taken from the right, so paths containing
/// spaces survive, and the location is split at its last `:` so paths
/// containing colons (e.g. Windows drive letters) survive too.
fn parse_block_line(line: &str) -> std::result::Result<Block<'_>, String> {
    let invalid = || format!("invalid coverage entry format: {line}");
    let (rest, count) = split_last_field(line).ok_or_else(invalid)?;
    let (location, statements) = split_last_field(rest).ok_or_else(invalid)?;

    let (file, range) = location
        .rsplit_once(':')
        .filter(|(file, _)| !file.is_empty())
        .ok_or_else(invalid)?;
    let (start, end) = range
        .split_once(',')
        .ok_or_else(|| format!("invalid line range format: {range}"))?;
    let start_line = position_line(start)?;
    let end_line = position_line(end)?;
    if end_line < start_line {
        return Err(format!("end line {end_line} is before start line {start_line}"));
    }
    let span = u64::from(end_line - start_line) + 1;
    if span > u64::from(MAX_BLOCK_LINES) {
        return Err(format!(
            "block spans {span} lines, more than the limit of {MAX_BLOCK_LINES}"
        ));
    }

    statements
        .parse::<u32>()
        .map_err(|_| format!("invalid number of statements: {statements}"))?;
    let count = count
        .parse::<i64>()
        .map_err(|_| format!("invalid execution count: {count}"))?;

    Ok(Block {
        file,
        start_line,
        end_line,
        count,
    })
}

/// Split off the last whitespace-separated field.
fn split_last_field(s: &str) -> Option<(&str, &str)> {
    let (rest, last) = s.trim_end().rsplit_once(char::is_whitespace)?;
    let rest = rest.trim_end();
    (!rest.is_empty()).then_some((rest, last))
}

/// Line part of a `<line>.<column>` position.
fn position_line(position: &str) -> std::result::Result<u32, String> {
    let (line, column) = position
        .split_once('.')
        .ok_or_else(|| format!("invalid position format: {position}"))?;
    column
        .parse::<u32>()
        .map_err(|_| format!("invalid column number: {column}"))?;
    line.parse::<u32>()
        .map_err(|_| format!("invalid line number: {line}"))
}

fn apply_block(file: &mut FileCoverage, block: &Block<'_>, mode: &Mode) {
    for line_number in block.start_line..=block.end_line {
        match file.lines.entry(line_number) {
            Entry::Vacant(slot) => {
                // A first sighting keeps malformed negative counts visible.
                let count = if mode.sums() { block.count } else { block.count.min(1) };
                slot.insert(LineCoverage::new(line_number, count));
            }
            Entry::Occupied(mut slot) => {
                let entry = slot.get_mut();
                if mode.sums() {
                    entry.execution_count = entry.execution_count.saturating_add(block.count);
                } else if block.count > 0 {
                    entry.execution_count = 1;
                }
            }
        }
    }
}
