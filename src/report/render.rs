use chrono::{DateTime, Utc};

use super::ReportRecord;
use crate::locate::SideValue;

/// Compose the plain-text report the downstream renderers (PDF and
/// image exports) are fed. Layout mirrors the printed report: header,
/// summary statistics, paid members, defaulters, generation footer.
pub fn render_text(
    record: &ReportRecord,
    title: &str,
    currency: &str,
    generated_at: DateTime<Utc>,
) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push(title.to_string());
    lines.push(format!("Report for {} {}", record.month, record.year));
    lines.push(String::new());

    lines.push("SUMMARY STATISTICS".to_string());
    lines.push("-".repeat(40));
    lines.push(format!(
        "{:<24}{} {}",
        "Total Contributions:",
        currency,
        format_amount(record.total_contributions)
    ));
    lines.push(format!(
        "{:<24}{}",
        "Contributors:", record.num_contributors
    ));
    lines.push(format!("{:<24}{}", "Defaulters:", record.num_missing));
    if let Some(value) = &record.money_dispensed {
        lines.push(format!(
            "{:<24}{}",
            "Money Dispensed:",
            side_value_text(value, currency)
        ));
    }
    if let Some(value) = &record.total_book_balance {
        lines.push(format!(
            "{:<24}{}",
            "Total Book Balance:",
            side_value_text(value, currency)
        ));
    }
    lines.push(String::new());

    lines.push("PAID MEMBERS".to_string());
    lines.push("-".repeat(40));
    for row in &record.table.rows {
        if let Some(amount) = row.amount {
            lines.push(format!(
                "{:<28}{} {}",
                row.name,
                currency,
                format_amount(amount)
            ));
        }
    }

    if record.num_missing > 0 {
        lines.push(String::new());
        lines.push("DEFAULTERS".to_string());
        lines.push("-".repeat(40));
        for name in &record.defaulters {
            lines.push(name.clone());
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Generated on {}",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    lines.join("\n")
}

fn side_value_text(value: &SideValue, currency: &str) -> String {
    match value {
        SideValue::Number(n) => format!("{} {}", currency, format_amount(*n)),
        SideValue::Text(t) => t.clone(),
    }
}

/// Two decimal places with thousands separators, the way the printed
/// reports show amounts.
fn format_amount(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-{}.{:02}", grouped, frac)
    } else {
        format!("{}.{:02}", grouped, frac)
    }
}
