//! Options that steer format selection for a parse call.

use serde::Deserialize;

use crate::detect::{Format, DEFAULT_SNIFF_LINES};

/// Per-call parse configuration.
///
/// Deserializable so a caller can load it from whatever settings source it
/// already has; every field is optional there.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Skip detection and parse as this format.
    pub format: Option<Format>,
    /// How many non-empty lines content sniffing may look at.
    pub sniff_lines: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            format: None,
            sniff_lines: DEFAULT_SNIFF_LINES,
        }
    }
}

impl ParseOptions {
    /// Options that force `format` and leave everything else at its default.
    pub fn forced(format: Format) -> Self {
        Self {
            format: Some(format),
            ..Self::default()
        }
    }
}
