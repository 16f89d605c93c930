use chrono::NaiveDate;

use crate::report::{ReportColumn, ReportTable};

/// Extra characters added to every measured column.
pub const WIDTH_PADDING: usize = 4;

/// Columns never grow past this width.
pub const MAX_WIDTH: usize = 50;

pub const DATE_FORMAT: &str = "dd/mm/yyyy";

/// Office Open XML spreadsheet MIME type.
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Number format for currency cells, e.g. `"S/" #,##0.00`.
pub fn currency_format(symbol: &str) -> String {
    format!("\"{}\" #,##0.00", symbol.replace('"', "\"\""))
}

/// Longest rendered value or header, padded, capped at [`MAX_WIDTH`].
pub fn column_width(column: ReportColumn, table: &ReportTable) -> usize {
    let longest_value = table
        .iter()
        .map(|row| column.value(row).as_text().chars().count())
        .max()
        .unwrap_or(0);
    let header = column.header().chars().count();
    (longest_value.max(header) + WIDTH_PADDING).min(MAX_WIDTH)
}

/// `<prefix>_report_<YYYY-MM-DD>.xlsx`
pub fn report_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{}_report_{}.xlsx", prefix, date.format("%Y-%m-%d"))
}
