use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Configuration error: {0} is not set. Export it or add it to .env")]
    MissingSecret(&'static str),

    #[error("Invalid value '{value}' for {name}")]
    InvalidSetting { name: &'static str, value: String },

    #[error("Invalid lookback window of {0} year(s): must be at least 1")]
    InvalidLookback(i64),

    #[error("Could not connect to the ledger store: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("Timed out after {0:?} connecting to the ledger store")]
    ConnectTimeout(Duration),

    #[error("Report query failed: {0}")]
    Query(#[source] sqlx::Error),

    #[error("Monetary total column is not part of the exported columns")]
    TotalColumnMissing,

    #[error("Failed to write spreadsheet: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    #[error("Unknown column '{0}'. Expected one of: {1}")]
    UnknownColumn(String, String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
