mod layout;
mod writer;

pub use layout::{
    column_width, currency_format, report_file_name, DATE_FORMAT, MAX_WIDTH, WIDTH_PADDING,
    XLSX_MIME,
};
pub use writer::{export, ExportOptions, FALLBACK_LABEL, SHEET_NAME, SUMMARY_LABEL};

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::report::ReportTable;

/// Export a table and write the document to `path`, creating parent
/// directories as needed.
pub fn write_report(table: &ReportTable, options: &ExportOptions, path: &Path) -> Result<()> {
    let bytes = export(table, options)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}
