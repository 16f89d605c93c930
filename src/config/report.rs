use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ReportSettings {
    /// Leading part of the exported file name
    pub file_prefix: String,
    pub currency_symbol: String,
    pub cache_ttl_secs: u64,
    pub default_years: u32,
    pub output_dir: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            file_prefix: "expera".to_string(),
            currency_symbol: "S/".to_string(),
            cache_ttl_secs: 600,
            default_years: 5,
            output_dir: "~/.ledger-report/output".to_string(),
        }
    }
}

impl ReportSettings {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
