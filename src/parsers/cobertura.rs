/// Parser for Cobertura XML coverage reports (as written by coverage.py,
/// gcovr, and most JVM tooling).
///
/// Cobertura XML structure:
///   <coverage>
///     <packages>
///       <package name="...">
///         <classes>
///           <class name="..." filename="...">
///             <methods>...</methods>
///             <lines>
///               <line number="..." hits="..." />
///             </lines>
///           </class>
///         </classes>
///       </package>
///     </packages>
///   </coverage>
///
/// Only `<line>` elements directly under a class's `<lines>` are counted;
/// the per-method copies under `<methods>` would double count.
use std::collections::HashMap;
use std::io::BufRead;
use std::str;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use super::{normalize_path, CoverageParser, ParseOutcome, Warnings};
use crate::detect::Format;
use crate::error::{CovpeekError, Result};
use crate::model::*;

pub struct CoberturaParser;

impl CoverageParser for CoberturaParser {
    fn format(&self) -> Format {
        Format::Cobertura
    }

    fn parse_reader(
        &self,
        reader: &mut dyn BufRead,
        warnings: &mut Warnings,
    ) -> Result<CoverageReport> {
        parse_cobertura(reader, warnings)
    }
}

/// Parse Cobertura XML from raw bytes.
pub fn parse(input: &[u8]) -> Result<ParseOutcome> {
    CoberturaParser.parse(input)
}

fn parse_cobertura(input: &mut dyn BufRead, warnings: &mut Warnings) -> Result<CoverageReport> {
    let mut reader = Reader::from_reader(input);
    reader.trim_text(true);

    let mut report = CoverageReport::new();
    let mut buf = Vec::new();

    // Names of the currently open elements, outermost first.
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut seen_root = false;
    let mut current_file: Option<FileCoverage> = None;

    loop {
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(source) => {
                return Err(CovpeekError::Xml {
                    source,
                    position: reader.buffer_position(),
                })
            }
        };

        match event {
            Event::Eof => break,
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                let name = e.local_name().as_ref().to_vec();

                if stack.is_empty() {
                    if seen_root {
                        return Err(CovpeekError::Parse(
                            "multiple root elements in Cobertura XML".to_string(),
                        ));
                    }
                    if name != b"coverage" {
                        return Err(CovpeekError::Parse(format!(
                            "expected <coverage> root element, found <{}>",
                            String::from_utf8_lossy(&name)
                        )));
                    }
                    seen_root = true;
                }

                match name.as_slice() {
                    b"class" => {
                        current_file = open_class(e, warnings);
                        if is_empty {
                            close_class(current_file.take(), &mut report, warnings);
                        }
                    }
                    b"line" if in_class_lines(&stack) => {
                        if let Some(file) = current_file.as_mut() {
                            record_line(e, file, warnings);
                        }
                    }
                    _ => {}
                }

                if !is_empty {
                    stack.push(name);
                }
            }
            Event::End(ref e) => {
                // quick-xml rejects mismatched end tags itself.
                stack.pop();
                if e.local_name().as_ref() == b"class" {
                    close_class(current_file.take(), &mut report, warnings);
                }
            }
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(CovpeekError::Parse(format!(
            "unexpected end of document: <{}> is not closed",
            String::from_utf8_lossy(open)
        )));
    }
    if !seen_root {
        return Err(CovpeekError::Parse(
            "document has no <coverage> root element".to_string(),
        ));
    }

    Ok(report)
}

/// Is the element about to be opened a direct child of `<class><lines>`?
fn in_class_lines(stack: &[Vec<u8>]) -> bool {
    matches!(stack, [.., class, lines] if class == b"class" && lines == b"lines")
}

fn open_class(e: &BytesStart<'_>, warnings: &mut Warnings) -> Option<FileCoverage> {
    let attrs = attr_map(e);
    match attrs.get("filename") {
        Some(filename) => Some(FileCoverage::new(normalize_path(filename))),
        None => {
            let name = attrs.get("name").map_or("<unnamed>", String::as_str);
            warnings.push(format!("class {name} has no filename attribute; skipped"));
            None
        }
    }
}

fn close_class(file: Option<FileCoverage>, report: &mut CoverageReport, warnings: &mut Warnings) {
    let Some(mut file) = file else {
        return;
    };
    file.recount_from_lines();
    let path = file.path.clone();
    if report.insert_file(file).is_some() {
        warnings.push(format!(
            "file {path}: duplicate class entry replaces an earlier one"
        ));
    }
}

fn record_line(e: &BytesStart<'_>, file: &mut FileCoverage, warnings: &mut Warnings) {
    let attrs = attr_map(e);
    let path = &file.path;

    let Some(number_str) = attrs.get("number") else {
        warnings.push(format!("file {path}: line element without number attribute"));
        return;
    };
    let Ok(line_number) = number_str.parse::<u32>() else {
        warnings.push(format!("file {path}: invalid line number {number_str:?}"));
        return;
    };
    let execution_count = match attrs.get("hits") {
        None => 0,
        Some(hits) => match hits.parse::<i64>() {
            Ok(hits) => hits,
            Err(_) => {
                warnings.push(format!(
                    "file {path}: line {line_number} has invalid hit count {hits:?}"
                ));
                return;
            }
        },
    };
    if execution_count < 0 {
        warnings.push(format!(
            "file {path}: line {line_number} has negative hit count {execution_count}"
        ));
    }

    file.lines
        .insert(line_number, LineCoverage::new(line_number, execution_count));
}

/// Extract attributes from an XML element into a HashMap.
fn attr_map(e: &BytesStart<'_>) -> HashMap<String, String> {
    e.attributes()
        .filter_map(|a| {
            let attr = a.ok()?;
            let key = str::from_utf8(attr.key.local_name().into_inner())
                .ok()?
                .to_string();
            let value = attr.unescape_value().ok()?.to_string();
            Some((key, value))
        })
        .collect()
}
