/// Auto-detection of coverage file formats.
///
/// Strategy:
///   1. Check the file name for strong hints (cheap, preferred)
///   2. Peek at the first non-empty lines of the content
///   3. A format forced by the caller bypasses both (handled in `ingest`)
///
/// `None` means Unknown: no parser applies, which is not an error by itself.
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::CovpeekError;

/// Number of non-empty lines inspected by content sniffing.
pub const DEFAULT_SNIFF_LINES: usize = 10;

/// `mode: <value>` header of a Go cover profile. Any value matches here; the
/// parser decides whether the mode is one it knows.
static MODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^mode:\s*\S+$").unwrap());

/// Where common toolchains write their reports, relative to a project root,
/// in the order a caller should probe them.
pub const DEFAULT_REPORT_PATHS: [&str; 7] = [
    "coverage.out",
    "test/coverage.out",
    "lcov.info",
    "target/coverage/lcov.info",
    "coverage/lcov.info",
    "coverage.xml",
    "coverage.json",
];

const LCOV_PREFIXES: [&str; 7] = ["TN:", "SF:", "FN:", "FNDA:", "DA:", "LH:", "LF:"];

/// Supported coverage formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Format {
    /// LCOV tracefile (`.info`), emitted by Rust, TypeScript and C tooling.
    Lcov,
    /// Go `-coverprofile` output.
    GoCover,
    /// Cobertura-compatible XML, e.g. coverage.py's `coverage.xml`.
    Cobertura,
    /// coverage.py `coverage.json`.
    CoverageJson,
}

/// Names accepted for a forced format, including ecosystem aliases.
const ALIASES: &[(&str, Format)] = &[
    ("lcov", Format::Lcov),
    ("info", Format::Lcov),
    ("rust", Format::Lcov),
    ("ts", Format::Lcov),
    ("typescript", Format::Lcov),
    ("js", Format::Lcov),
    ("javascript", Format::Lcov),
    ("go", Format::GoCover),
    ("golang", Format::GoCover),
    ("gocover", Format::GoCover),
    ("coverprofile", Format::GoCover),
    ("cobertura", Format::Cobertura),
    ("xml", Format::Cobertura),
    ("pycover-xml", Format::Cobertura),
    ("python-xml", Format::Cobertura),
    ("json", Format::CoverageJson),
    ("coverage-json", Format::CoverageJson),
    ("pycover-json", Format::CoverageJson),
    ("python-json", Format::CoverageJson),
];

impl Format {
    pub const ALL: [Format; 4] = [
        Format::Lcov,
        Format::GoCover,
        Format::Cobertura,
        Format::CoverageJson,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Lcov => "lcov",
            Format::GoCover => "gocover",
            Format::Cobertura => "cobertura",
            Format::CoverageJson => "coverage-json",
        }
    }

    /// Human-facing name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Format::Lcov => "LCOV",
            Format::GoCover => "Go Coverage",
            Format::Cobertura => "Cobertura XML",
            Format::CoverageJson => "Python JSON Coverage",
        }
    }
}

impl std::str::FromStr for Format {
    type Err = CovpeekError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ALIASES
            .iter()
            .find(|(alias, _)| *alias == wanted)
            .map(|(_, format)| *format)
            .ok_or_else(|| CovpeekError::UnknownFormatName(s.to_string()))
    }
}

impl TryFrom<String> for Format {
    type Error = CovpeekError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the coverage format from an optional file name and the content.
/// The file name wins; content is only sniffed when the name says nothing.
pub fn detect_format(filename: Option<&str>, content: &[u8], sniff_lines: usize) -> Option<Format> {
    if let Some(fmt) = filename.and_then(detect_by_filename) {
        tracing::debug!(format = %fmt, "detected coverage format from file name");
        return Some(fmt);
    }

    let detected = detect_by_content(content, sniff_lines);
    tracing::debug!(format = ?detected, "detected coverage format from content");
    detected
}

/// Classify a file name by extension and substring heuristics.
pub fn detect_by_filename(filename: &str) -> Option<Format> {
    let name = filename.to_lowercase();

    if name.ends_with(".out") {
        return Some(Format::GoCover);
    }
    if name.ends_with(".xml") && name.contains("coverage") {
        return Some(Format::Cobertura);
    }
    if name.ends_with(".json") && name.contains("coverage") {
        return Some(Format::CoverageJson);
    }
    if name.ends_with(".lcov") || name.ends_with(".info") || name.contains("lcov.info") {
        return Some(Format::Lcov);
    }
    None
}

/// Classify content by looking at its first `max_lines` non-empty lines.
///
/// Rules apply in fixed precedence: Go mode header on the first line, then
/// XML markers, then JSON markers, then LCOV record prefixes.
pub fn detect_by_content(content: &[u8], max_lines: usize) -> Option<Format> {
    let head: Vec<String> = content
        .split(|&b| b == b'\n')
        .map(|raw| String::from_utf8_lossy(raw).trim().to_string())
        .filter(|line| !line.is_empty())
        .take(max_lines)
        .collect();

    let first = head.first()?;
    if MODE_RE.is_match(first) {
        return Some(Format::GoCover);
    }

    if head
        .iter()
        .any(|l| l.contains("<coverage") || l.contains("<class filename="))
    {
        return Some(Format::Cobertura);
    }

    if head
        .iter()
        .any(|l| l.contains("\"files\"") || l.contains("\"executed_lines\""))
    {
        return Some(Format::CoverageJson);
    }

    if head
        .iter()
        .any(|l| l == "end_of_record" || LCOV_PREFIXES.iter().any(|p| l.starts_with(p)))
    {
        return Some(Format::Lcov);
    }

    None
}
