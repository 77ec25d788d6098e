use std::fs;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::domain::{REPORT_HEADER, ReportRow, WorklistRow};
use crate::error::HarvestError;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Workbook {
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Sheet {
    pub name: String,
    #[serde(default)]
    pub rows: Vec<Vec<CellEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<SheetFormat>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CellEntry {
    Text(String),
    Rich(RichCell),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RichCell {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub formula: Option<String>,
    #[serde(default)]
    pub hyperlink: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SheetFormat {
    #[serde(default)]
    pub bold_rows: Vec<usize>,
    #[serde(default)]
    pub column_widths: Vec<usize>,
}

impl CellEntry {
    pub fn display_value(&self) -> &str {
        match self {
            CellEntry::Text(value) => value,
            CellEntry::Rich(cell) => cell.value.as_deref().unwrap_or(""),
        }
    }

    fn to_worklist_row(&self, row_index: usize) -> WorklistRow {
        match self {
            CellEntry::Text(value) => WorklistRow {
                row_index,
                display_value: value.clone(),
                ..WorklistRow::default()
            },
            CellEntry::Rich(cell) => WorklistRow {
                row_index,
                display_value: cell.value.clone().unwrap_or_default(),
                formula_text: cell.formula.clone().unwrap_or_default(),
                hyperlink_url: cell.hyperlink.clone(),
            },
        }
    }
}

/// Converts a column letter (`A`, `Z`, `AA`) to a 0-based index.
pub fn column_index(letters: &str) -> Result<usize, HarvestError> {
    let trimmed = letters.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|ch| ch.is_ascii_alphabetic()) {
        return Err(HarvestError::InvalidColumn(letters.to_string()));
    }
    let index = trimmed.chars().try_fold(0usize, |acc, ch| {
        let digit = (ch.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        acc.checked_mul(26)?.checked_add(digit)
    });
    index
        .map(|value| value - 1)
        .ok_or_else(|| HarvestError::InvalidColumn(letters.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    SeekingStart,
    Collecting,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStep {
    Skip,
    Collect,
}

/// Marker-delimited worklist scan over one column.
#[derive(Debug, Clone)]
pub struct WorklistScanner<'a> {
    start_marker: &'a str,
    stop_marker: &'a str,
    state: ScanState,
}

impl<'a> WorklistScanner<'a> {
    pub fn new(start_marker: &'a str, stop_marker: &'a str) -> Self {
        Self {
            start_marker,
            stop_marker,
            state: ScanState::SeekingStart,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn step(&mut self, row: &WorklistRow) -> ScanStep {
        let text = row.display_value.trim();
        match self.state {
            ScanState::SeekingStart => {
                if text == self.start_marker {
                    self.state = ScanState::Collecting;
                }
                ScanStep::Skip
            }
            ScanState::Collecting => {
                if text == self.stop_marker || row.is_blank() {
                    self.state = ScanState::Stopped;
                    ScanStep::Skip
                } else {
                    ScanStep::Collect
                }
            }
            ScanState::Stopped => ScanStep::Skip,
        }
    }
}

impl Sheet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Sheet::default()
        }
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&CellEntry> {
        self.rows.get(row).and_then(|cells| cells.get(column))
    }

    /// Rows strictly between the start and stop markers in `column`.
    pub fn worklist(
        &self,
        column: usize,
        start_marker: &str,
        stop_marker: &str,
    ) -> Option<Vec<WorklistRow>> {
        let mut scanner = WorklistScanner::new(start_marker, stop_marker);
        let mut rows = Vec::new();
        for index in 0..self.rows.len() {
            let row = self
                .cell(index, column)
                .map(|cell| cell.to_worklist_row(index + 1))
                .unwrap_or_else(|| WorklistRow {
                    row_index: index + 1,
                    ..WorklistRow::default()
                });
            if scanner.step(&row) == ScanStep::Collect {
                rows.push(row);
            }
            if scanner.state() == ScanState::Stopped {
                break;
            }
        }
        (scanner.state() != ScanState::SeekingStart).then_some(rows)
    }

    /// Replaces the sheet content with a bold header row and the report rows.
    pub fn write_report(&mut self, report: &[ReportRow]) {
        let mut rows = Vec::with_capacity(report.len() + 1);
        rows.push(
            REPORT_HEADER
                .iter()
                .map(|title| CellEntry::Text(title.to_string()))
                .collect::<Vec<_>>(),
        );
        for row in report {
            rows.push(row.cells().into_iter().map(CellEntry::Text).collect());
        }

        let column_widths = (0..REPORT_HEADER.len())
            .map(|column| {
                rows.iter()
                    .filter_map(|cells| cells.get(column))
                    .map(|cell| cell.display_value().chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        self.rows = rows;
        self.format = Some(SheetFormat {
            bold_rows: vec![0],
            column_widths,
        });
    }
}

impl Workbook {
    pub fn load(path: &Utf8Path) -> Result<Self, HarvestError> {
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|_| HarvestError::WorkbookRead(path.as_std_path().to_path_buf()))?;
        serde_json::from_str(&content).map_err(|err| HarvestError::WorkbookParse(err.to_string()))
    }

    pub fn save(&self, path: &Utf8Path) -> Result<(), HarvestError> {
        let bytes = serde_json::to_vec_pretty(self)
            .map_err(|err| HarvestError::Filesystem(err.to_string()))?;
        write_bytes_atomic(path, &bytes)
    }

    pub fn sheet(&self, name: &str) -> Result<&Sheet, HarvestError> {
        self.sheets
            .iter()
            .find(|sheet| sheet.name == name)
            .ok_or_else(|| HarvestError::MissingSheet(name.to_string()))
    }

    /// Returns the named sheet, appending an empty one when absent.
    pub fn sheet_or_insert(&mut self, name: &str) -> &mut Sheet {
        let position = match self.sheets.iter().position(|sheet| sheet.name == name) {
            Some(position) => position,
            None => {
                self.sheets.push(Sheet::new(name));
                self.sheets.len() - 1
            }
        };
        &mut self.sheets[position]
    }

    pub fn write_report(&mut self, target: &str, report: &[ReportRow]) {
        self.sheet_or_insert(target).write_report(report);
    }
}

fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), HarvestError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let mut temp = tempfile::Builder::new()
        .prefix("metric-harvest")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| HarvestError::Filesystem(err.to_string()))?;
    std::io::Write::write_all(&mut temp, content)
        .map_err(|err| HarvestError::Filesystem(err.to_string()))?;
    temp.persist(path.as_std_path())
        .map_err(|err| HarvestError::Filesystem(err.to_string()))?;
    Ok(())
}
