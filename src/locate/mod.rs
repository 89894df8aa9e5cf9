use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::workbook::{cell_at, Cell, RawSheet, RawWorkbook};

/// Sheet names that look like the generic data sheet of a workbook.
/// Checked when no sheet name mentions the requested year.
const FALLBACK_SHEET_PATTERNS: &[&str] = &["data", "contributions"];

/// Something the locator had to find was not there. These abort the
/// extraction; messy-but-present data never raises them.
#[derive(Debug, Error)]
pub enum LocateError {
    #[error("no sheet found for year {year}: workbook contains no sheets")]
    SheetNotFound { year: i32 },

    #[error("no row mentioning {month:?} found in sheet {sheet:?}")]
    HeaderRowNotFound { month: String, sheet: String },

    #[error("no column header mentioning {month:?} found in sheet {sheet:?}")]
    MonthColumnNotFound { month: String, sheet: String },
}

/// Pick the sheet holding `year`'s records.
///
/// Preference order: first sheet whose name contains the year, then
/// the first whose name looks like a generic data sheet, then the
/// workbook's first sheet. Only an empty workbook is an error.
pub fn find_year_sheet(workbook: &RawWorkbook, year: i32) -> Result<&RawSheet, LocateError> {
    let year_str = year.to_string();

    if let Some(sheet) = workbook.sheets.iter().find(|s| s.name.contains(&year_str)) {
        debug!(sheet = %sheet.name, year, "sheet matched by year");
        return Ok(sheet);
    }

    if let Some(sheet) = workbook.sheets.iter().find(|s| {
        let lower = s.name.to_lowercase();
        FALLBACK_SHEET_PATTERNS.iter().any(|p| lower.contains(p))
    }) {
        debug!(sheet = %sheet.name, year, "sheet matched by data-sheet pattern");
        return Ok(sheet);
    }

    match workbook.sheets.first() {
        Some(sheet) => {
            debug!(sheet = %sheet.name, year, "falling back to first sheet");
            Ok(sheet)
        }
        None => Err(LocateError::SheetNotFound { year }),
    }
}

/// Row index of the header row: the first row with any cell that
/// mentions `month_name`. Sheets here carry banner rows and side
/// tables above the real header, so the month name is the anchor.
pub fn find_month_header_row(sheet: &RawSheet, month_name: &str) -> Result<usize, LocateError> {
    for (row_idx, row) in sheet.grid.iter().enumerate() {
        if row.iter().any(|cell| cell.contains_ci(month_name)) {
            return Ok(row_idx);
        }
    }
    Err(LocateError::HeaderRowNotFound {
        month: month_name.to_string(),
        sheet: sheet.name.clone(),
    })
}

/// A sheet viewed from its header row down: the header cells as text
/// labels, and everything below as data rows.
#[derive(Debug)]
pub struct HeaderedTable<'a> {
    pub sheet_name: &'a str,
    pub labels: Vec<String>,
    pub rows: &'a [Vec<Cell>],
    pub header_row: usize,
}

impl<'a> HeaderedTable<'a> {
    pub fn from_sheet(sheet: &'a RawSheet, header_row: usize) -> Self {
        let labels = sheet
            .grid
            .get(header_row)
            .map(|row| row.iter().map(|c| c.as_text()).collect())
            .unwrap_or_default();
        let rows = sheet.grid.get(header_row + 1..).unwrap_or(&[]);
        Self {
            sheet_name: &sheet.name,
            labels,
            rows,
            header_row,
        }
    }

    /// Widest extent across labels and data rows.
    pub fn n_cols(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.len())
            .max()
            .unwrap_or(0)
            .max(self.labels.len())
    }
}

/// First column whose label mentions `month_name`.
pub fn find_month_column(
    table: &HeaderedTable<'_>,
    month_name: &str,
) -> Result<usize, LocateError> {
    let needle = month_name.to_lowercase();
    table
        .labels
        .iter()
        .position(|label| label.to_lowercase().contains(&needle))
        .ok_or_else(|| LocateError::MonthColumnNotFound {
            month: month_name.to_string(),
            sheet: table.sheet_name.to_string(),
        })
}

/// First column where some data cell mentions "name". Header rows in
/// these workbooks are often banner rows, so the member-name column is
/// recognised by its contents rather than its label. Falls back to the
/// first column.
pub fn find_name_column(table: &HeaderedTable<'_>) -> usize {
    for col in 0..table.n_cols() {
        let hit = table
            .rows
            .iter()
            .any(|row| cell_at(row, col).contains_ci("name"));
        if hit {
            return col;
        }
    }
    debug!("no column mentions \"name\", defaulting to the first column");
    0
}

/// A free-standing figure written next to a label somewhere on the
/// sheet, like "Money Dispensed" or "Total Book Balance".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SideValue {
    Number(f64),
    Text(String),
}

impl SideValue {
    /// Numeric when the cell coerces, raw text otherwise, unset for an
    /// empty cell.
    pub fn from_cell(cell: &Cell) -> Option<Self> {
        if cell.is_empty() {
            return None;
        }
        match cell.as_number() {
            Some(n) => Some(SideValue::Number(n)),
            None => Some(SideValue::Text(cell.as_text())),
        }
    }
}

/// Scan the whole sheet for `label` and return the value one column to
/// its right. The scan never short-circuits: a later occurrence of the
/// label overrides an earlier one, including clearing the value when
/// its neighbour cell is empty.
pub fn find_side_value(sheet: &RawSheet, label: &str) -> Option<SideValue> {
    let mut found = None;
    for (row_idx, row) in sheet.grid.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            if cell.contains_ci(label) {
                found = SideValue::from_cell(sheet.cell(row_idx, col_idx + 1));
            }
        }
    }
    found
}
