use std::io::{self, Write};

use camino::Utf8Path;
use serde::Serialize;

use crate::app::{ProgressEvent, ProgressSink, RunSummary};
use crate::domain::{REPORT_HEADER, ReportRow};
use crate::error::HarvestError;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_summary(summary: &RunSummary) -> io::Result<()> {
        Self::print_json(summary)
    }

    pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Prints progress lines to stderr.
pub struct StderrProgress;

impl ProgressSink for StderrProgress {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => eprintln!("{} ({} ms)", event.message, elapsed.as_millis()),
            None => eprintln!("{}", event.message),
        }
    }
}

pub fn write_csv<W: Write>(writer: W, rows: &[ReportRow]) -> Result<(), HarvestError> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(REPORT_HEADER)
        .map_err(|err| HarvestError::Csv(err.to_string()))?;
    for row in rows {
        out.write_record(row.cells())
            .map_err(|err| HarvestError::Csv(err.to_string()))?;
    }
    out.flush()
        .map_err(|err| HarvestError::Csv(err.to_string()))?;
    Ok(())
}

pub fn export_csv(path: &Utf8Path, rows: &[ReportRow]) -> Result<(), HarvestError> {
    let file = std::fs::File::create(path.as_std_path())
        .map_err(|err| HarvestError::Filesystem(err.to_string()))?;
    write_csv(file, rows)
}
