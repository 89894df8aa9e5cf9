// src/summary/mod.rs
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::workbook::{cell_at, Cell};

/// One member's line in the contribution table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionRow {
    pub name: String,
    /// None means no contribution recorded for the period.
    pub amount: Option<f64>,
}

/// Cleaned member rows plus the column indices they were read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionTable {
    pub rows: Vec<ContributionRow>,
    pub name_col: usize,
    pub month_col: usize,
}

/// Derived statistics over a cleaned table.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total_contributions: f64,
    pub num_contributors: usize,
    pub num_missing: usize,
    pub defaulters: Vec<String>,
}

/// Drop junk rows and coerce the month column to numbers.
///
/// A row is dropped when its name cell is empty, when the name text is
/// blank after trimming, or when the name mentions "total" (hand-kept
/// running totals share the table with member rows). Amounts that fail
/// coercion become missing contributions rather than errors. Surviving
/// rows keep their input order.
pub fn clean_rows(rows: &[Vec<Cell>], name_col: usize, month_col: usize) -> ContributionTable {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let name_cell = cell_at(row, name_col);
        if name_cell.is_empty() {
            continue;
        }
        let name = name_cell.as_text();
        if name.trim().is_empty() {
            continue;
        }
        if name.to_lowercase().contains("total") {
            continue;
        }

        let amount_cell = cell_at(row, month_col);
        let amount = amount_cell.as_number();
        if amount.is_none() && !amount_cell.is_empty() {
            warn!(
                name = %name.trim(),
                value = %amount_cell.as_text(),
                "amount cell is not numeric, treating as missing"
            );
        }

        out.push(ContributionRow { name, amount });
    }
    ContributionTable {
        rows: out,
        name_col,
        month_col,
    }
}

/// Totals and defaulter list for a cleaned table. A recorded amount of
/// zero still counts as a contribution; only absent amounts mark a
/// defaulter.
pub fn summarize(table: &ContributionTable) -> Summary {
    let total_contributions: f64 = table.rows.iter().filter_map(|r| r.amount).sum();
    let num_contributors = table.rows.iter().filter(|r| r.amount.is_some()).count();
    let defaulters: Vec<String> = table
        .rows
        .iter()
        .filter(|r| r.amount.is_none())
        .map(|r| r.name.clone())
        .collect();

    Summary {
        total_contributions,
        num_contributors,
        num_missing: defaulters.len(),
        defaulters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,welfare_reports::summary=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    fn t(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn n(v: f64) -> Cell {
        Cell::Number(v)
    }

    #[test]
    fn junk_rows_are_dropped() {
        let rows = vec![
            vec![t("Alice"), n(500.0)],
            vec![Cell::Empty, n(999.0)],
            vec![t("   "), n(1.0)],
            vec![t("TOTAL"), n(9999.0)],
            vec![t("Running total"), n(9999.0)],
            vec![t("Bob")],
        ];
        let table = clean_rows(&rows, 0, 1);

        let names: Vec<&str> = table.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob"]);
        assert_eq!(table.rows[0].amount, Some(500.0));
        assert_eq!(table.rows[1].amount, None);
        assert_eq!(table.name_col, 0);
        assert_eq!(table.month_col, 1);
    }

    #[test]
    fn unparseable_amounts_become_missing() {
        init_test_logging();
        let rows = vec![
            vec![t("Carol"), t("pending")],
            vec![t("Dave"), t("  750 ")],
        ];
        let table = clean_rows(&rows, 0, 1);
        assert_eq!(table.rows[0].amount, None);
        assert_eq!(table.rows[1].amount, Some(750.0));
    }

    #[test]
    fn non_finite_amounts_count_as_missing() {
        let rows = vec![
            vec![t("Alice"), n(500.0)],
            vec![t("Bob"), t("nan")],
            vec![t("Carol"), t("inf")],
        ];
        let table = clean_rows(&rows, 0, 1);
        let summary = summarize(&table);

        assert_eq!(summary.num_contributors, 1);
        assert_eq!(summary.defaulters, vec!["Bob", "Carol"]);
        assert!(summary.total_contributions.is_finite());
        assert_eq!(summary.total_contributions, 500.0);
    }

    #[test]
    fn counts_partition_the_rows() {
        let rows = vec![
            vec![t("Alice"), n(500.0)],
            vec![t("Bob")],
            vec![t("Carol"), n(0.0)],
            vec![t("Dan"), t("n/a")],
        ];
        let table = clean_rows(&rows, 0, 1);
        let summary = summarize(&table);

        assert_eq!(summary.num_contributors + summary.num_missing, table.rows.len());
        assert_eq!(summary.num_contributors, 2);
        assert_eq!(summary.num_missing, 2);
        assert_eq!(summary.defaulters, vec!["Bob", "Dan"]);
    }

    #[test]
    fn zero_amount_counts_as_contribution() {
        let rows = vec![vec![t("Alice"), n(0.0)], vec![t("Bob"), n(250.0)]];
        let summary = summarize(&clean_rows(&rows, 0, 1));
        assert_eq!(summary.total_contributions, 250.0);
        assert_eq!(summary.num_contributors, 2);
        assert!(summary.defaulters.is_empty());
    }

    #[test]
    fn empty_table_sums_to_zero() {
        let summary = summarize(&clean_rows(&[], 0, 1));
        assert_eq!(summary.total_contributions, 0.0);
        assert_eq!(summary.num_contributors, 0);
        assert_eq!(summary.num_missing, 0);
        assert!(summary.defaulters.is_empty());
    }

    #[test]
    fn cleaning_is_idempotent() {
        let rows = vec![
            vec![t("Alice"), n(500.0)],
            vec![Cell::Empty, n(1.0)],
            vec![t("total so far"), n(501.0)],
            vec![t("Bob"), t("later")],
        ];
        let once = clean_rows(&rows, 0, 1);

        // feed the cleaned rows back through as a grid
        let regrid: Vec<Vec<Cell>> = once
            .rows
            .iter()
            .map(|r| {
                vec![
                    Cell::Text(r.name.clone()),
                    r.amount.map(Cell::Number).unwrap_or(Cell::Empty),
                ]
            })
            .collect();
        let twice = clean_rows(&regrid, 0, 1);

        assert_eq!(once, twice);
    }

    #[test]
    fn missing_columns_read_as_empty() {
        // month column beyond the row ends: everyone is a defaulter
        let rows = vec![vec![t("Alice")], vec![t("Bob"), n(5.0)]];
        let table = clean_rows(&rows, 0, 7);
        let summary = summarize(&table);
        assert_eq!(summary.num_missing, 2);
        assert_eq!(summary.total_contributions, 0.0);
    }
}
