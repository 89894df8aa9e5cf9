// src/workbook/mod.rs
pub mod load;

/// A single spreadsheet cell after decoding.
///
/// Loaders collapse every source-specific cell type down to these three
/// shapes; the locator and summarizer never see anything richer.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

static EMPTY: Cell = Cell::Empty;

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Cell content as display text. Whole numbers drop the trailing
    /// ".0" so a year cell holding `2024.0` reads as "2024".
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
        }
    }

    /// Numeric view of the cell. Text is trimmed and parsed, anything
    /// non-numeric is None. Spellings the float parser would accept as
    /// non-finite ("nan", "inf") also read as None.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Empty => None,
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }

    /// Case-insensitive substring test against the cell's text form.
    /// Empty cells match nothing.
    pub fn contains_ci(&self, needle: &str) -> bool {
        if self.is_empty() {
            return false;
        }
        self.as_text().to_lowercase().contains(&needle.to_lowercase())
    }
}

/// Cell at `idx` within a row, Empty when the row is too short.
/// Rows in a [`RawSheet`] may be ragged, so every column access goes
/// through this instead of indexing.
pub fn cell_at(row: &[Cell], idx: usize) -> &Cell {
    row.get(idx).unwrap_or(&EMPTY)
}

/// One worksheet as a 2-D grid in absolute coordinates. Loaders pad
/// leading empty rows and columns so `grid[row][col]` lines up with
/// the positions a user sees in their spreadsheet program.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSheet {
    pub name: String,
    pub grid: Vec<Vec<Cell>>,
}

impl RawSheet {
    pub fn new(name: impl Into<String>, grid: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            grid,
        }
    }

    /// Cell at the absolute position, Empty when out of bounds.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.grid.get(row).map(|r| cell_at(r, col)).unwrap_or(&EMPTY)
    }

    pub fn n_rows(&self) -> usize {
        self.grid.len()
    }

    /// Widest row in the grid.
    pub fn n_cols(&self) -> usize {
        self.grid.iter().map(|r| r.len()).max().unwrap_or(0)
    }
}

/// An ordered collection of sheets, as declared in the source file.
/// Immutable once loaded; both the local readers and the remote
/// fetcher produce this same shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawWorkbook {
    pub sheets: Vec<RawSheet>,
}

impl RawWorkbook {
    pub fn new(sheets: Vec<RawSheet>) -> Self {
        Self { sheets }
    }

    pub fn sheet(&self, name: &str) -> Option<&RawSheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn text_coerces_to_number_after_trimming() {
        assert_eq!(t("  500 ").as_number(), Some(500.0));
        assert_eq!(t("12.5").as_number(), Some(12.5));
        assert_eq!(t("pending").as_number(), None);
        assert_eq!(t("").as_number(), None);
    }

    #[test]
    fn numbers_and_empty_coerce_directly() {
        assert_eq!(Cell::Number(750.0).as_number(), Some(750.0));
        assert_eq!(Cell::Empty.as_number(), None);
    }

    #[test]
    fn non_finite_spellings_do_not_coerce() {
        assert_eq!(t("nan").as_number(), None);
        assert_eq!(t("NaN").as_number(), None);
        assert_eq!(t(" inf ").as_number(), None);
        assert_eq!(t("-infinity").as_number(), None);
    }

    #[test]
    fn whole_numbers_render_without_fraction() {
        assert_eq!(Cell::Number(2024.0).as_text(), "2024");
        assert_eq!(Cell::Number(10.5).as_text(), "10.5");
        assert_eq!(Cell::Empty.as_text(), "");
        assert_eq!(t("Alice").as_text(), "Alice");
    }

    #[test]
    fn contains_ci_ignores_case_and_skips_empty() {
        assert!(t("March 2024").contains_ci("march"));
        assert!(t("MONEY DISPENSED").contains_ci("Money Dispensed"));
        assert!(!t("February").contains_ci("march"));
        assert!(!Cell::Empty.contains_ci(""));
    }

    #[test]
    fn sheet_access_is_safe_out_of_bounds() {
        let sheet = RawSheet::new("2024", vec![vec![t("a")], vec![t("b"), t("c")]]);
        assert_eq!(sheet.cell(0, 0), &t("a"));
        assert_eq!(sheet.cell(0, 5), &Cell::Empty);
        assert_eq!(sheet.cell(9, 0), &Cell::Empty);
        assert_eq!(sheet.n_rows(), 2);
        assert_eq!(sheet.n_cols(), 2);
    }

    #[test]
    fn workbook_lookup_by_name() {
        let wb = RawWorkbook::new(vec![
            RawSheet::new("2023", vec![]),
            RawSheet::new("2024", vec![vec![t("x")]]),
        ]);
        assert_eq!(wb.len(), 2);
        assert_eq!(wb.sheet_names(), vec!["2023", "2024"]);
        assert!(wb.sheet("2024").is_some());
        assert!(wb.sheet("2025").is_none());
    }
}
