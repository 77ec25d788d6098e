use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum HarvestError {
    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid config value for {field}: {value}")]
    InvalidConfig { field: &'static str, value: String },

    #[error("invalid column letter: {0}")]
    InvalidColumn(String),

    #[error("failed to read workbook at {0}")]
    WorkbookRead(PathBuf),

    #[error("failed to parse workbook: {0}")]
    WorkbookParse(String),

    #[error("source sheet not found: {0}")]
    #[diagnostic(help("check `source_sheet` in metric-harvest.json or pass --source-sheet"))]
    MissingSheet(String),

    #[error("start marker {marker:?} not found in column {column} of sheet {sheet}")]
    StartMarkerNotFound {
        sheet: String,
        column: String,
        marker: String,
    },

    #[error("HTTP client setup failed: {0}")]
    HttpClient(String),

    #[error("Failed to fetch {url}: HTTP {status}")]
    DocumentStatus { url: String, status: u16 },

    #[error("Failed to fetch {url}: {message}")]
    DocumentHttp { url: String, message: String },

    #[error("CSV export failed: {0}")]
    Csv(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

/// Failure classes of a metric record lookup. Rendered as sentinels only when
/// a report row is written out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("field path not present in record")]
    PathMissing,

    #[error("record endpoint returned status {0}")]
    HttpStatus(u16),

    #[error("record request failed: {0}")]
    Transport(String),
}
