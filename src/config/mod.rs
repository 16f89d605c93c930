mod report;
mod store;

pub use report::ReportSettings;
pub use store::{Credentials, StoreSettings, PASSWORD_VAR};

use crate::error::{ReportError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub store: StoreSettings,
    pub report: ReportSettings,
}

impl Config {
    /// Apply PG_* environment overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.store.apply_env_with(|name| std::env::var(name).ok())
    }
}

/// Get the config directory path (~/.ledger-report/)
pub fn config_dir() -> Result<PathBuf> {
    // First try XDG-style directories
    if let Some(proj_dirs) = ProjectDirs::from("", "", "ledger-report") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    // Fallback to ~/.ledger-report/
    let home = dirs_home().ok_or_else(|| {
        ReportError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".ledger-report"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Expand ~ in paths
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_home() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Relative output directories are taken relative to the config directory.
pub fn resolve_output_dir(output_dir: &str, cfg_dir: &Path) -> PathBuf {
    let path = expand_path(output_dir);
    if path.is_absolute() {
        path
    } else {
        cfg_dir.join(path)
    }
}

/// Load config.toml (defaults if missing)
pub fn load_config(config_dir: &Path) -> Result<Config> {
    let path = config_dir.join("config.toml");
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| ReportError::ConfigParse { path, source: e })
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[store]
host = "localhost"
port = 5432
database = "upgradedb"
user = "postgres"
connect_timeout_secs = 5
# The password is read from PG_PASSWORD (environment or .env).
# PG_HOST, PG_PORT, PG_DB and PG_USER override the values above.

[report]
file_prefix = "expera"        # expera_report_2026-01-31.xlsx
currency_symbol = "S/"
cache_ttl_secs = 600
default_years = 5
output_dir = "output"         # relative to this directory, ~ is expanded
"#;
