use std::{env, path::Path, process::exit};

use anyhow::Result;
use welfare_reports::workbook::{load, RawSheet};

fn main() {
    // Expect exactly one CLI argument: path to a workbook file.
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <WORKBOOK_FILE>", args[0]);
        exit(1);
    }
    if let Err(e) = inspect_workbook(Path::new(&args[1])) {
        eprintln!("Error: {}", e);
        exit(1);
    }
}

/// Load the workbook and print its sheet inventory plus a grid preview
/// of each sheet.
fn inspect_workbook(path: &Path) -> Result<()> {
    let workbook = load::load_workbook(path)?;

    println!("=== Workbook: {} ===", path.display());
    println!("Sheets: {}", workbook.len());
    for sheet in &workbook.sheets {
        println!(
            "- {:<30} {} rows x {} cols",
            format!("{:?}", sheet.name),
            sheet.n_rows(),
            sheet.n_cols()
        );
    }
    println!();

    for sheet in &workbook.sheets {
        print_preview(sheet);
    }

    Ok(())
}

const PREVIEW_ROWS: usize = 10;
const PREVIEW_COLS: usize = 8;
const CELL_WIDTH: usize = 16;

fn print_preview(sheet: &RawSheet) {
    println!("=== Sheet {:?} ===", sheet.name);
    if sheet.grid.is_empty() {
        println!("(empty)");
        println!();
        return;
    }

    for (row_idx, row) in sheet.grid.iter().take(PREVIEW_ROWS).enumerate() {
        let rendered: Vec<String> = row
            .iter()
            .take(PREVIEW_COLS)
            .map(|cell| clip(&cell.as_text()))
            .collect();
        println!("{:>4} | {}", row_idx, rendered.join(" | "));
    }
    if sheet.n_rows() > PREVIEW_ROWS {
        println!("... {} more rows", sheet.n_rows() - PREVIEW_ROWS);
    }
    println!();
}

fn clip(text: &str) -> String {
    let mut out: String = text.chars().take(CELL_WIDTH).collect();
    if text.chars().count() > CELL_WIDTH {
        out.push('…');
    }
    format!("{:<width$}", out, width = CELL_WIDTH)
}
