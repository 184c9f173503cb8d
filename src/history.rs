//! Coverage diff between two revisions of the same report file.
//!
//! Looking up a file's content at a revision is left to a [`ContentSource`]
//! supplied by the caller (a git checkout, a CI artifact store, ...).

use anyhow::Result as AnyResult;

use crate::aggregate::{diff, CoverageDiff};
use crate::config::ParseOptions;
use crate::error::{CovpeekError, Result};
use crate::ingest::{parse_report, Ingested};

/// Fetches the bytes of a file as it was at some revision.
pub trait ContentSource {
    fn fetch(&self, revision: &str, path: &str) -> AnyResult<Vec<u8>>;
}

impl<F> ContentSource for F
where
    F: Fn(&str, &str) -> AnyResult<Vec<u8>>,
{
    fn fetch(&self, revision: &str, path: &str) -> AnyResult<Vec<u8>> {
        self(revision, path)
    }
}

/// The diff between two revisions plus the parse warnings of each side.
#[derive(Debug, Clone)]
pub struct RevisionDiff {
    pub diff: CoverageDiff,
    pub warnings_base: Vec<String>,
    pub warnings_target: Vec<String>,
}

/// Fetch `path` at `base` and `target`, parse both and diff them
/// (`target - base`). `path` doubles as the file name hint for detection.
pub fn diff_revisions(
    source: &dyn ContentSource,
    path: &str,
    base: &str,
    target: &str,
    options: &ParseOptions,
) -> Result<RevisionDiff> {
    let before = load(source, path, base, options)?;
    let after = load(source, path, target, options)?;

    Ok(RevisionDiff {
        diff: diff(&before.report, &after.report),
        warnings_base: before.warnings,
        warnings_target: after.warnings,
    })
}

fn load(
    source: &dyn ContentSource,
    path: &str,
    revision: &str,
    options: &ParseOptions,
) -> Result<Ingested> {
    let content = source
        .fetch(revision, path)
        .map_err(|e| CovpeekError::Fetch {
            revision: revision.to_string(),
            source: e.into(),
        })?;
    tracing::debug!(revision, path, bytes = content.len(), "fetched coverage file");
    parse_report(&content, Some(path), options)
}
