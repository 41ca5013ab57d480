//! Display formatting and table rows for snapshot records.
//!
//! Every monetary column (cash, NV, price) is shown with exactly two decimal
//! places. Positions and quantities are shown as integers when integral.

use crate::domain::{
    BondPositionRecord, CurrencyPositionRecord, DeskCashRecord, ExclusionRecord, PositionRecord,
};

/// `1234.5` → `"1234.50"`. Never renders a negative zero.
pub fn format_money(value: f64) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }
    let s = format!("{value:.2}");
    if s == "-0.00" {
        "0.00".to_string()
    } else {
        s
    }
}

/// Optional money column: empty cell when absent.
pub fn format_opt_money(value: Option<f64>) -> String {
    value.map(format_money).unwrap_or_default()
}

/// `40.0` → `"40"`, `2.5` → `"2.5"`.
pub fn format_quantity(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// A record that renders as one table row.
pub trait TableRow {
    /// Column headers, in cell order.
    const HEADERS: &'static [&'static str];

    /// Indices of columns holding monetary values (right-aligned, coloured by sign).
    const MONEY_COLUMNS: &'static [usize] = &[];

    fn cells(&self) -> Vec<String>;
}

impl TableRow for DeskCashRecord {
    const HEADERS: &'static [&'static str] = &["Desk", "Cash", "Updated"];
    const MONEY_COLUMNS: &'static [usize] = &[1];

    fn cells(&self) -> Vec<String> {
        vec![
            self.desk.clone(),
            format_money(self.cash),
            self.updated.to_string(),
        ]
    }
}

impl TableRow for PositionRecord {
    const HEADERS: &'static [&'static str] = &["Desk", "Trader", "Book", "Position", "NV"];
    const MONEY_COLUMNS: &'static [usize] = &[4];

    fn cells(&self) -> Vec<String> {
        vec![
            self.desk.clone(),
            self.trader.clone(),
            self.book.clone(),
            format_quantity(self.position),
            format_money(self.nv),
        ]
    }
}

impl TableRow for BondPositionRecord {
    const HEADERS: &'static [&'static str] =
        &["Desk", "Trader", "Book", "BondID", "Position", "NV"];
    const MONEY_COLUMNS: &'static [usize] = &[5];

    fn cells(&self) -> Vec<String> {
        vec![
            self.desk.clone(),
            self.trader.clone(),
            self.book.clone(),
            self.bond.clone(),
            format_quantity(self.position),
            format_money(self.nv),
        ]
    }
}

impl TableRow for CurrencyPositionRecord {
    const HEADERS: &'static [&'static str] = &["Desk", "Currency", "Position", "NV"];
    const MONEY_COLUMNS: &'static [usize] = &[3];

    fn cells(&self) -> Vec<String> {
        vec![
            self.desk.clone(),
            self.currency.clone(),
            format_quantity(self.position),
            format_money(self.nv),
        ]
    }
}

impl TableRow for ExclusionRecord {
    const HEADERS: &'static [&'static str] = &[
        "ID",
        "Desk",
        "Trader",
        "Book",
        "Buy/Sell",
        "Quantity",
        "BondID",
        "Price",
        "ExclusionType",
    ];
    const MONEY_COLUMNS: &'static [usize] = &[7];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.desk.clone(),
            self.trader.clone(),
            self.book.clone(),
            self.buy_sell.clone(),
            format_quantity(self.quantity),
            self.bond.clone(),
            format_opt_money(self.price),
            self.exclusion_type.clone(),
        ]
    }
}

/// One row of cells per record, in record order.
pub fn table_rows<T: TableRow>(records: &[T]) -> Vec<Vec<String>> {
    records.iter().map(TableRow::cells).collect()
}

/// Width of each column: the widest of header and cells.
pub fn column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }
    widths
}

/// Plain-text table with a header rule, for terminal output.
pub fn render_text_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let widths = column_widths(headers, rows);
    let mut out = String::new();

    let header_line: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| format!("{h:<w$}"))
        .collect();
    out.push_str(header_line.join("  ").trim_end());
    out.push('\n');

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("  "));
    out.push('\n');

    for row in rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{c:<w$}"))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out
}
