//! Sales ledger search and reporting.
//!
//! A search term and a lookback window are turned into a parameterized
//! ledger query, fetched through a short-lived cache, summarized, and
//! exported as a styled xlsx workbook with a grand-total row.

pub mod clock;
pub mod config;
pub mod error;
pub mod report;
pub mod store;
pub mod xlsx;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, Credentials, ReportSettings, StoreSettings};
pub use error::{ReportError, Result};
pub use report::{
    aggregate, ReportColumn, ReportFetcher, ReportMetrics, ReportRow, ReportTable, SearchRequest,
};
pub use store::{LedgerStore, PgLedgerStore};
pub use xlsx::{export, ExportOptions};
