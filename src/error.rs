use thiserror::Error;

#[derive(Error, Debug)]
pub enum CovpeekError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid Go coverage profile: missing mode declaration")]
    MissingMode,

    #[error("XML parse error at position {position}: {source}")]
    Xml {
        source: quick_xml::Error,
        position: usize,
    },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown coverage format")]
    UnknownFormat,

    #[error("Unknown format: '{0}'. Supported: lcov, go, cobertura, json")]
    UnknownFormatName(String),

    #[error("threshold must be between 0 and 100, got {0:.2}")]
    InvalidThreshold(f64),

    #[error("failed to fetch coverage at revision '{revision}': {source}")]
    Fetch {
        revision: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub type Result<T> = std::result::Result<T, CovpeekError>;
