pub mod render;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Month, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::locate::{self, LocateError, SideValue};
use crate::summary::{self, ContributionTable};
use crate::workbook::RawWorkbook;

/// Which period to pull out of a workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionTarget {
    pub year: i32,
    pub month: Month,
}

impl ExtractionTarget {
    /// `month` is 1-based, 1 = January.
    pub fn new(year: i32, month: u8) -> Result<Self> {
        let month =
            Month::try_from(month).map_err(|_| anyhow!("month must be 1..=12, got {}", month))?;
        Ok(Self { year, month })
    }

    pub fn month_name(&self) -> &'static str {
        self.month.name()
    }
}

/// Everything the report surfaces consume, in one serializable bundle.
/// Round-trips losslessly through JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub year: i32,
    pub month: String,
    pub table: ContributionTable,
    pub total_contributions: f64,
    pub num_contributors: usize,
    pub num_missing: usize,
    pub defaulters: Vec<String>,
    pub money_dispensed: Option<SideValue>,
    pub total_book_balance: Option<SideValue>,
}

/// Run the full extraction for one period: pick the sheet, read the
/// side figures, locate the contribution table, clean it and derive
/// the statistics.
///
/// Missing sheet, header row or month column abort with a
/// [`LocateError`]; messy cell contents degrade into missing values
/// instead.
#[tracing::instrument(level = "info", skip(workbook), fields(year = target.year, month = target.month_name()))]
pub fn extract_report(
    workbook: &RawWorkbook,
    target: ExtractionTarget,
) -> Result<ReportRecord, LocateError> {
    let month_name = target.month_name();

    let sheet = locate::find_year_sheet(workbook, target.year)?;
    info!(sheet = %sheet.name, "selected sheet");

    let money_dispensed = locate::find_side_value(sheet, "money dispensed");
    let total_book_balance = locate::find_side_value(sheet, "total book balance");

    let header_row = locate::find_month_header_row(sheet, month_name)?;
    let table = locate::HeaderedTable::from_sheet(sheet, header_row);
    let month_col = locate::find_month_column(&table, month_name)?;
    let name_col = locate::find_name_column(&table);
    info!(header_row, month_col, name_col, "located contribution table");

    let cleaned = summary::clean_rows(table.rows, name_col, month_col);
    let stats = summary::summarize(&cleaned);
    info!(
        total = stats.total_contributions,
        contributors = stats.num_contributors,
        missing = stats.num_missing,
        "summarized contributions"
    );

    Ok(ReportRecord {
        year: target.year,
        month: month_name.to_string(),
        table: cleaned,
        total_contributions: stats.total_contributions,
        num_contributors: stats.num_contributors,
        num_missing: stats.num_missing,
        defaulters: stats.defaulters,
        money_dispensed,
        total_book_balance,
    })
}

/// File name for a persisted record, e.g.
/// `contributions_report_2024_March_20240331_120000.json`.
pub fn report_file_name(record: &ReportRecord, generated_at: DateTime<Utc>) -> String {
    format!(
        "contributions_report_{}_{}_{}.json",
        record.year,
        record.month,
        generated_at.format("%Y%m%d_%H%M%S")
    )
}

/// Serialize the record into `dir`, creating it if needed. Returns the
/// path written.
pub fn write_record<P: AsRef<Path>>(record: &ReportRecord, dir: P) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let path = dir.join(report_file_name(record, Utc::now()));
    let json = serde_json::to_string_pretty(record)?;
    fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

/// Read a previously persisted record back.
pub fn read_record<P: AsRef<Path>>(path: P) -> Result<ReportRecord> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let record = serde_json::from_str(&text)
        .with_context(|| format!("parsing record {}", path.display()))?;
    Ok(record)
}
