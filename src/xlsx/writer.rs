use chrono::{Datelike, NaiveDate};
use rust_xlsxwriter::{
    Color, DocProperties, ExcelDateTime, Format, FormatAlign, FormatBorder, Workbook, Worksheet,
};
use tracing::{info, warn};

use crate::error::{ReportError, Result};
use crate::report::{CellValue, ColumnKind, ReportColumn, ReportTable};
use crate::xlsx::layout::{column_width, currency_format, DATE_FORMAT};

pub const SHEET_NAME: &str = "Reporte Detallado";
pub const SUMMARY_LABEL: &str = "RESUMEN TOTAL";
pub const FALLBACK_LABEL: &str = "RESUMEN TOTAL (Columna no encontrada)";

const HEADER_FILL: u32 = 0x1E293B;
const SUMMARY_FILL: u32 = 0xF1F5F9;
const FONT_SIZE: u8 = 12;

/// What to export and how to label money.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub columns: Vec<ReportColumn>,
    pub currency_symbol: String,
    /// Stamped as the document's creation time so output is reproducible.
    pub report_date: NaiveDate,
}

impl ExportOptions {
    pub fn new(report_date: NaiveDate) -> Self {
        Self {
            columns: ReportColumn::ALL.to_vec(),
            currency_symbol: "S/".to_string(),
            report_date,
        }
    }

    pub fn with_columns(mut self, columns: Vec<ReportColumn>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_currency_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.currency_symbol = symbol.into();
        self
    }
}

struct Formats {
    header: Format,
    date: Format,
    currency: Format,
    label: Format,
    total: Format,
    fallback: Format,
}

impl Formats {
    fn new(currency_symbol: &str) -> Self {
        let money = currency_format(currency_symbol);
        Self {
            header: Format::new()
                .set_bold()
                .set_font_size(FONT_SIZE)
                .set_font_color(Color::White)
                .set_background_color(Color::RGB(HEADER_FILL))
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_border_bottom(FormatBorder::Medium),
            date: Format::new().set_num_format(DATE_FORMAT),
            currency: Format::new().set_num_format(&money),
            label: Format::new()
                .set_bold()
                .set_font_size(FONT_SIZE)
                .set_align(FormatAlign::Right),
            total: Format::new()
                .set_bold()
                .set_font_size(FONT_SIZE)
                .set_num_format(&money)
                .set_background_color(Color::RGB(SUMMARY_FILL))
                .set_align(FormatAlign::Right),
            fallback: Format::new().set_bold().set_font_size(FONT_SIZE),
        }
    }
}

fn excel_date(date: NaiveDate) -> Result<ExcelDateTime> {
    // Out-of-range years map to 0 so the writer reports its own range error.
    let year = u16::try_from(date.year()).unwrap_or(0);
    Ok(ExcelDateTime::from_ymd(year, date.month() as u8, date.day() as u8)?)
}

/// Position of the monetary total among the exported columns.
fn locate_total_column(columns: &[ReportColumn]) -> Result<usize> {
    columns
        .iter()
        .position(|c| *c == ReportColumn::LineTotal)
        .ok_or(ReportError::TotalColumnMissing)
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    column: ReportColumn,
    value: CellValue<'_>,
    formats: &Formats,
) -> Result<()> {
    match value {
        CellValue::Date(d) => {
            worksheet.write_datetime_with_format(row, col, &excel_date(d)?, &formats.date)?;
        }
        CellValue::Text(s) => {
            worksheet.write_string(row, col, s)?;
        }
        CellValue::Number(n) if column.kind() == ColumnKind::Currency => {
            worksheet.write_number_with_format(row, col, n, &formats.currency)?;
        }
        CellValue::Number(n) => {
            worksheet.write_number(row, col, n)?;
        }
        CellValue::Empty => {}
    }
    Ok(())
}

/// Label cells left of the total are merged into one; the total sits under
/// the monetary column. Without that column a fallback notice is written.
fn write_summary_row(
    worksheet: &mut Worksheet,
    row: u32,
    table: &ReportTable,
    columns: &[ReportColumn],
    formats: &Formats,
) -> Result<()> {
    let total_col = match locate_total_column(columns) {
        Ok(idx) => idx,
        Err(e) => {
            warn!(error = %e, "writing summary fallback notice");
            worksheet.write_string_with_format(row, 0, FALLBACK_LABEL, &formats.fallback)?;
            return Ok(());
        }
    };

    // f64 `Sum` over nothing yields -0.0; fold from +0.0 instead.
    let total = table.iter().fold(0.0, |acc, r| acc + r.line_total);

    match total_col {
        0 => {}
        1 => {
            worksheet.write_string_with_format(row, 0, SUMMARY_LABEL, &formats.label)?;
        }
        n => {
            worksheet.merge_range(row, 0, row, (n - 1) as u16, SUMMARY_LABEL, &formats.label)?;
        }
    }
    worksheet.write_number_with_format(row, total_col as u16, total, &formats.total)?;
    Ok(())
}

/// Serialize a report table into an xlsx document.
///
/// The sheet holds a styled header row, the rows in table order, and one
/// summary row. Identical input and options give identical bytes.
pub fn export(table: &ReportTable, options: &ExportOptions) -> Result<Vec<u8>> {
    let formats = Formats::new(&options.currency_symbol);
    let columns = &options.columns;

    let mut workbook = Workbook::new();
    let created = excel_date(options.report_date)?;
    workbook.set_properties(&DocProperties::new().set_creation_datetime(&created));

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, column) in columns.iter().enumerate() {
        let col = col as u16;
        worksheet.write_string_with_format(0, col, column.header(), &formats.header)?;
        worksheet.set_column_width(col, column_width(*column, table) as f64)?;
    }
    worksheet.set_freeze_panes(1, 0)?;

    for (idx, row) in table.iter().enumerate() {
        let r = (idx + 1) as u32;
        for (col, column) in columns.iter().enumerate() {
            write_cell(worksheet, r, col as u16, *column, column.value(row), &formats)?;
        }
    }

    let summary_row = (table.len() + 1) as u32;
    write_summary_row(worksheet, summary_row, table, columns, &formats)?;

    let bytes = workbook.save_to_buffer()?;
    info!(rows = table.len(), columns = columns.len(), bytes = bytes.len(), "report exported");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_total_column_by_identity() {
        assert_eq!(locate_total_column(&ReportColumn::ALL).unwrap(), 5);
        assert_eq!(
            locate_total_column(&[ReportColumn::LineTotal, ReportColumn::Date]).unwrap(),
            0
        );
        assert!(matches!(
            locate_total_column(&[ReportColumn::Date, ReportColumn::UnitPrice]),
            Err(ReportError::TotalColumnMissing)
        ));
    }

    #[test]
    fn options_default_to_every_column() {
        let options = ExportOptions::new(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(options.columns, ReportColumn::ALL.to_vec());
        assert_eq!(options.currency_symbol, "S/");
    }

    #[test]
    fn dates_before_excel_epoch_fail_cleanly() {
        let result = excel_date(NaiveDate::from_ymd_opt(1850, 1, 1).unwrap());
        assert!(matches!(result, Err(ReportError::Spreadsheet(_))));
    }
}
