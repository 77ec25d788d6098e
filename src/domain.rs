use std::fmt;

use serde::Serialize;

use crate::error::LookupError;

pub const NOT_AVAILABLE: &str = "N/A";
pub const ERROR_SENTINEL: &str = "Error";
pub const HTTP_ERROR_SENTINEL: &str = "HTTP Error";

pub const REPORT_HEADER: [&str; 4] = ["Metric name", "Metric URL", "Test URL", "Test description"];

/// One worklist cell as read from the source sheet. `row_index` is the
/// 1-based spreadsheet row number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorklistRow {
    pub row_index: usize,
    pub display_value: String,
    pub formula_text: String,
    pub hyperlink_url: Option<String>,
}

impl WorklistRow {
    pub fn is_blank(&self) -> bool {
        self.display_value.trim().is_empty()
            && self.formula_text.trim().is_empty()
            && self
                .hyperlink_url
                .as_deref()
                .is_none_or(|url| url.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RdfDocument {
    pub source_url: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    pub metric_url: Option<String>,
    pub test_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MetricRecordId(String);

impl MetricRecordId {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetricRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FAIRsharing.{}", self.0)
    }
}

/// Outcome of resolving a metric's human-readable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricName {
    Found(String),
    /// The metric URL carried no record id.
    NoRecordId,
    Lookup(LookupError),
}

impl MetricName {
    pub fn render(&self) -> String {
        match self {
            MetricName::Found(name) => name.clone(),
            MetricName::NoRecordId | MetricName::Lookup(LookupError::PathMissing) => {
                NOT_AVAILABLE.to_string()
            }
            MetricName::Lookup(LookupError::HttpStatus(_)) => HTTP_ERROR_SENTINEL.to_string(),
            MetricName::Lookup(LookupError::Transport(_)) => ERROR_SENTINEL.to_string(),
        }
    }
}

impl From<Result<String, LookupError>> for MetricName {
    fn from(value: Result<String, LookupError>) -> Self {
        match value {
            Ok(name) => MetricName::Found(name),
            Err(err) => MetricName::Lookup(err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    Enriched {
        metric_name: MetricName,
        metric_url: String,
        test_description: Option<String>,
    },
    FetchFailed {
        message: String,
    },
}

/// One output line. Never mutated after the row processor creates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub row_index: usize,
    pub test_url: String,
    pub outcome: ReportOutcome,
}

impl ReportRow {
    pub fn is_error(&self) -> bool {
        matches!(self.outcome, ReportOutcome::FetchFailed { .. })
    }

    /// Cells in header order, with failures rendered as sentinels.
    pub fn cells(&self) -> [String; 4] {
        match &self.outcome {
            ReportOutcome::Enriched {
                metric_name,
                metric_url,
                test_description,
            } => [
                metric_name.render(),
                metric_url.clone(),
                self.test_url.clone(),
                test_description
                    .clone()
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            ],
            ReportOutcome::FetchFailed { message } => [
                ERROR_SENTINEL.to_string(),
                ERROR_SENTINEL.to_string(),
                self.test_url.clone(),
                message.clone(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_failures_render_as_sentinels() {
        assert_eq!(MetricName::NoRecordId.render(), "N/A");
        assert_eq!(
            MetricName::Lookup(LookupError::HttpStatus(500)).render(),
            "HTTP Error"
        );
        assert_eq!(
            MetricName::Lookup(LookupError::Transport("reset".to_string())).render(),
            "Error"
        );
    }

    #[test]
    fn blank_row_detection() {
        let row = WorklistRow {
            row_index: 4,
            display_value: "  ".to_string(),
            ..WorklistRow::default()
        };
        assert!(row.is_blank());

        let linked = WorklistRow {
            hyperlink_url: Some("https://example.org".to_string()),
            ..row
        };
        assert!(!linked.is_blank());
    }
}
