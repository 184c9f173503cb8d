pub mod cobertura;
pub mod coverage_json;
pub mod gocover;
pub mod lcov;

use std::fmt;
use std::io::BufRead;

use crate::detect::Format;
use crate::error::Result;
use crate::model::CoverageReport;

/// Every format parser implements this trait.
pub trait CoverageParser {
    /// Which format this parser handles.
    fn format(&self) -> Format;

    /// Parse from a buffered reader, recording recoverable problems in
    /// `warnings`. An `Err` means the input as a whole was unusable.
    fn parse_reader(&self, reader: &mut dyn BufRead, warnings: &mut Warnings)
        -> Result<CoverageReport>;

    /// Parse raw bytes with a fresh warning collector.
    fn parse(&self, input: &[u8]) -> Result<ParseOutcome> {
        let mut warnings = Warnings::new(self.format());
        let report = self.parse_reader(&mut &*input, &mut warnings)?;
        tracing::debug!(
            format = %self.format(),
            files = report.len(),
            warnings = warnings.len(),
            "parsed coverage report"
        );
        Ok(ParseOutcome {
            report,
            warnings: warnings.into_vec(),
        })
    }
}

/// A parsed report together with the warnings produced while parsing it.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub report: CoverageReport,
    pub warnings: Vec<String>,
}

/// Collects the non-fatal diagnostics of one parse call.
///
/// Each message is also emitted as a `tracing` warning so callers that only
/// install a subscriber still see them.
#[derive(Debug)]
pub struct Warnings {
    format: Format,
    messages: Vec<String>,
}

impl Warnings {
    pub fn new(format: Format) -> Self {
        Self {
            format,
            messages: Vec::new(),
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(format = %self.format, "{message}");
        self.messages.push(message);
    }

    /// Record a warning tied to a 1-based input line.
    pub fn at_line(&mut self, line: usize, message: impl fmt::Display) {
        self.push(format!("line {line}: {message}"));
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn into_vec(self) -> Vec<String> {
        self.messages
    }
}

/// Iterates over the trimmed lines of a reader together with their 1-based
/// line numbers. Invalid UTF-8 is replaced rather than rejected; only a
/// failing reader ends iteration with an error.
pub(crate) struct NumberedLines<'a> {
    reader: &'a mut dyn BufRead,
    buf: Vec<u8>,
    number: usize,
}

impl<'a> NumberedLines<'a> {
    pub(crate) fn new(reader: &'a mut dyn BufRead) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            number: 0,
        }
    }
}

impl Iterator for NumberedLines<'_> {
    type Item = std::io::Result<(usize, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                self.number += 1;
                let line = String::from_utf8_lossy(&self.buf).trim().to_string();
                Some(Ok((self.number, line)))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// Strip a leading `./` from a reported file name.
pub(crate) fn normalize_path(path: &str) -> &str {
    path.strip_prefix("./").unwrap_or(path)
}
