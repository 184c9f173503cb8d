use crate::config::ParseOptions;
use crate::detect::{detect_format, Format};
use crate::error::{CovpeekError, Result};
use crate::model::CoverageReport;
use crate::parsers::cobertura::CoberturaParser;
use crate::parsers::coverage_json::CoverageJsonParser;
use crate::parsers::gocover::GocoverParser;
use crate::parsers::lcov::LcovParser;
use crate::parsers::{CoverageParser, ParseOutcome};

/// A parsed coverage artifact and how it was interpreted.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub format: Format,
    pub report: CoverageReport,
    pub warnings: Vec<String>,
}

/// Pick a format for `content` (forced, then by file name, then by content)
/// and parse it.
pub fn parse_report(
    content: &[u8],
    filename: Option<&str>,
    options: &ParseOptions,
) -> Result<Ingested> {
    let format = match options.format {
        Some(format) => format,
        None => detect_format(filename, content, options.sniff_lines)
            .ok_or(CovpeekError::UnknownFormat)?,
    };

    let ParseOutcome { report, warnings } = parse_with_format(format, content)?;
    Ok(Ingested {
        format,
        report,
        warnings,
    })
}

/// Parse `content` as `format` without any detection.
pub fn parse_with_format(format: Format, content: &[u8]) -> Result<ParseOutcome> {
    parser_for(format).parse(content)
}

/// The parser responsible for `format`.
pub fn parser_for(format: Format) -> &'static dyn CoverageParser {
    match format {
        Format::Lcov => &LcovParser,
        Format::GoCover => &GocoverParser,
        Format::Cobertura => &CoberturaParser,
        Format::CoverageJson => &CoverageJsonParser,
    }
}
