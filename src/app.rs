use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::HarvestConfig;
use crate::domain::{MetricName, ReportOutcome, ReportRow, WorklistRow};
use crate::error::HarvestError;
use crate::fairsharing::{MetricClient, lookup};
use crate::fetch::DocumentClient;
use crate::rdf::{PatternRdfExtractor, RdfExtractor};
use crate::record::extract_record_id;
use crate::sheet::Workbook;
use crate::url_resolver;

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// Shared stop flag, checked before each row.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct HarvestResult {
    pub rows: Vec<ReportRow>,
    pub skipped: usize,
    pub cancelled: bool,
}

impl HarvestResult {
    pub fn errors(&self) -> usize {
        self.rows.iter().filter(|row| row.is_error()).count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub entries: usize,
    pub skipped: usize,
    pub errors: usize,
    pub cancelled: bool,
    pub target_sheet: String,
    pub generated_at: String,
}

impl RunSummary {
    pub fn new(result: &HarvestResult, target_sheet: &str) -> Self {
        Self {
            entries: result.rows.len(),
            skipped: result.skipped,
            errors: result.errors(),
            cancelled: result.cancelled,
            target_sheet: target_sheet.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Outcome of one worklist row before it is collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    NoUrl,
    NoMetricUrl { test_url: String },
    Report(ReportRow),
}

pub struct Harvester<D: DocumentClient, M: MetricClient, E: RdfExtractor = PatternRdfExtractor> {
    config: HarvestConfig,
    documents: D,
    metrics: M,
    extractor: E,
}

impl<D: DocumentClient, M: MetricClient> Harvester<D, M, PatternRdfExtractor> {
    pub fn new(config: HarvestConfig, documents: D, metrics: M) -> Self {
        Self::with_extractor(config, documents, metrics, PatternRdfExtractor)
    }
}

impl<D: DocumentClient, M: MetricClient, E: RdfExtractor> Harvester<D, M, E> {
    pub fn with_extractor(config: HarvestConfig, documents: D, metrics: M, extractor: E) -> Self {
        Self {
            config,
            documents,
            metrics,
            extractor,
        }
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Reads the worklist from the source sheet, processes it and rewrites
    /// the target sheet. The workbook is left untouched when setup fails.
    pub fn run(
        &self,
        workbook: &mut Workbook,
        cancel: &CancelToken,
        sink: &dyn ProgressSink,
    ) -> Result<HarvestResult, HarvestError> {
        let worklist = self.worklist(workbook)?;
        sink.event(ProgressEvent {
            message: format!(
                "phase=Resolve; {} worklist rows in {}",
                worklist.len(),
                self.config.source_sheet
            ),
            elapsed: None,
        });

        let result = self.process_rows(&worklist, cancel, sink);
        workbook.write_report(&self.config.target_sheet, &result.rows);
        tracing::info!(
            entries = result.rows.len(),
            target = %self.config.target_sheet,
            "report written"
        );
        Ok(result)
    }

    pub fn worklist(&self, workbook: &Workbook) -> Result<Vec<WorklistRow>, HarvestError> {
        let sheet = workbook.sheet(&self.config.source_sheet)?;
        sheet
            .worklist(
                self.config.column_index,
                &self.config.start_marker,
                &self.config.stop_marker,
            )
            .ok_or_else(|| HarvestError::StartMarkerNotFound {
                sheet: self.config.source_sheet.clone(),
                column: self.config.source_column.clone(),
                marker: self.config.start_marker.clone(),
            })
    }

    /// Processes rows strictly in order; one row's failure never stops the batch.
    pub fn process_rows(
        &self,
        rows: &[WorklistRow],
        cancel: &CancelToken,
        sink: &dyn ProgressSink,
    ) -> HarvestResult {
        let mut report = Vec::new();
        let mut skipped = 0usize;
        let mut cancelled = false;

        for (position, row) in rows.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::warn!(row = row.row_index, "run cancelled");
                cancelled = true;
                break;
            }

            let start = Instant::now();
            let outcome = self.process_row(row);
            let message = match &outcome {
                RowOutcome::NoUrl => {
                    skipped += 1;
                    format!("row {}: no URL, skipped", row.row_index)
                }
                RowOutcome::NoMetricUrl { test_url } => {
                    skipped += 1;
                    format!("row {}: no metric URL in {test_url}", row.row_index)
                }
                RowOutcome::Report(entry) if entry.is_error() => {
                    format!("row {}: fetch failed", row.row_index)
                }
                RowOutcome::Report(_) => format!("row {}: ok", row.row_index),
            };
            sink.event(ProgressEvent {
                message,
                elapsed: Some(start.elapsed()),
            });

            let fetched = !matches!(outcome, RowOutcome::NoUrl);
            if let RowOutcome::Report(entry) = outcome {
                report.push(entry);
            }

            // No sleep after the final row; nothing follows it.
            if fetched && position + 1 < rows.len() && !self.config.request_delay.is_zero() {
                thread::sleep(self.config.request_delay);
            }
        }

        HarvestResult {
            rows: report,
            skipped,
            cancelled,
        }
    }

    pub fn process_row(&self, row: &WorklistRow) -> RowOutcome {
        let Some(resolved) = url_resolver::resolve(row) else {
            tracing::info!(row = row.row_index, "no URL found, skipping");
            return RowOutcome::NoUrl;
        };
        let test_url = resolved.url;
        tracing::debug!(row = row.row_index, url = %test_url, source = ?resolved.source, "resolved test URL");

        let document = match self.documents.fetch_text(&test_url) {
            Ok(document) => document,
            Err(err) => {
                tracing::warn!(row = row.row_index, "{err}");
                return RowOutcome::Report(ReportRow {
                    row_index: row.row_index,
                    test_url,
                    outcome: ReportOutcome::FetchFailed {
                        message: err.to_string(),
                    },
                });
            }
        };

        let extracted = self.extractor.extract(&document);
        let Some(metric_url) = extracted.metric_url else {
            tracing::info!(row = row.row_index, url = %test_url, "no metric URL found");
            return RowOutcome::NoMetricUrl { test_url };
        };
        tracing::debug!(
            row = row.row_index,
            metric_url = %metric_url,
            has_description = extracted.test_description.is_some(),
            "extracted fields"
        );

        let metric_name = match extract_record_id(&metric_url) {
            Some(id) => lookup(&self.metrics, &id, &self.config.metric_name_path),
            None => {
                tracing::warn!(row = row.row_index, metric_url = %metric_url, "no record id in metric URL");
                MetricName::NoRecordId
            }
        };

        RowOutcome::Report(ReportRow {
            row_index: row.row_index,
            test_url,
            outcome: ReportOutcome::Enriched {
                metric_name,
                metric_url,
                test_description: extracted.test_description,
            },
        })
    }
}
