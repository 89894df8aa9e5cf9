// src/workbook/load.rs
use anyhow::{bail, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

use super::{Cell, RawSheet, RawWorkbook};

/// Extensions the local loader accepts.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["xlsx", "xls", "xlsb", "ods", "csv"];

/// Load a workbook from disk, dispatching on the file extension.
/// Spreadsheet formats keep every worksheet; a CSV file becomes a
/// single sheet named after the file stem.
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_workbook<P: AsRef<Path>>(path: P) -> Result<RawWorkbook> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "csv" => load_csv(path),
        "xlsx" | "xls" | "xlsb" | "ods" => load_spreadsheet(path),
        other => bail!(
            "unsupported file type {:?} for {}; supported: {}",
            other,
            path.display(),
            SUPPORTED_EXTENSIONS.join(", ")
        ),
    }
}

fn load_spreadsheet(path: &Path) -> Result<RawWorkbook> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("failed to open workbook {}", path.display()))?;

    let names: Vec<String> = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(names.len());
    for name in &names {
        let range = match workbook.worksheet_range(name) {
            Ok(r) => r,
            Err(e) => {
                warn!(sheet = %name, error = %e, "skipping unreadable sheet");
                continue;
            }
        };
        sheets.push(RawSheet::new(name.clone(), grid_from_range(&range)));
    }

    debug!(sheets = sheets.len(), "loaded workbook");
    Ok(RawWorkbook::new(sheets))
}

fn load_csv(path: &Path) -> Result<RawWorkbook> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "csv".to_string());
    let sheet = sheet_from_csv(name, file)
        .with_context(|| format!("reading CSV {}", path.display()))?;
    Ok(RawWorkbook::new(vec![sheet]))
}

/// Parse CSV text into a sheet. Every non-empty field becomes a text
/// cell; numeric coercion happens later, at the point of use.
pub(crate) fn sheet_from_csv<R: Read>(name: impl Into<String>, reader: R) -> Result<RawSheet> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut grid = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("CSV parse error at record {}", idx))?;
        let row: Vec<Cell> = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(field.to_string())
                }
            })
            .collect();
        grid.push(row);
    }
    Ok(RawSheet::new(name, grid))
}

/// Lay a calamine range out on an absolute grid. Ranges rarely start
/// at A1, so rows above and columns left of the data block are padded
/// with empty cells to keep coordinates meaningful.
fn grid_from_range(range: &calamine::Range<Data>) -> Vec<Vec<Cell>> {
    let Some((start_row, start_col)) = range.start() else {
        return Vec::new();
    };

    let mut grid: Vec<Vec<Cell>> = Vec::with_capacity(start_row as usize + range.height());
    for _ in 0..start_row {
        grid.push(Vec::new());
    }
    for row in range.rows() {
        let mut cells: Vec<Cell> = Vec::with_capacity(start_col as usize + row.len());
        cells.resize(start_col as usize, Cell::Empty);
        cells.extend(row.iter().map(cell_from_data));
        grid.push(cells);
    }
    grid
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ts) => Cell::Text(ts.to_string()),
            None => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => Cell::Text(s.clone()),
        Data::DurationIso(s) => Cell::Text(s.clone()),
        // error cells carry no usable value; treat them like blanks
        Data::Error(_) => Cell::Empty,
    }
}
