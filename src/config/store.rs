use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ReportError, Result};

/// Environment variable holding the ledger store secret.
pub const PASSWORD_VAR: &str = "PG_PASSWORD";

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct StoreSettings {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    /// Prefer PG_PASSWORD over writing the secret to disk
    pub password: Option<String>,
    pub connect_timeout_secs: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "upgradedb".to_string(),
            user: "postgres".to_string(),
            password: None,
            connect_timeout_secs: 5,
        }
    }
}

/// Everything needed to open a connection, secret included.
#[derive(Clone)]
pub struct Credentials {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub connect_timeout: Duration,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"***")
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl StoreSettings {
    /// Apply PG_* overrides. Blank values are treated as unset.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("PG_HOST") {
            self.host = host;
        }
        if let Some(port) = get("PG_PORT") {
            self.port = port.trim().parse().map_err(|_| ReportError::InvalidSetting {
                name: "PG_PORT",
                value: port.clone(),
            })?;
        }
        if let Some(database) = get("PG_DB") {
            self.database = database;
        }
        if let Some(user) = get("PG_USER") {
            self.user = user;
        }
        if let Some(password) = get(PASSWORD_VAR) {
            self.password = Some(password);
        }
        Ok(())
    }

    /// Resolve connection credentials. A missing secret is a fatal
    /// configuration error, never something to retry.
    pub fn credentials(&self) -> Result<Credentials> {
        let password = self
            .password
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or(ReportError::MissingSecret(PASSWORD_VAR))?;

        Ok(Credentials {
            host: self.host.clone(),
            port: self.port,
            database: self.database.clone(),
            user: self.user.clone(),
            password: password.to_string(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        })
    }
}
