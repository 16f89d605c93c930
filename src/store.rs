//! Access to the ledger store.
//!
//! Every load opens its own connection and closes it before returning, so a
//! stalled query only ever blocks the request that issued it.

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;
use tracing::{debug, warn};

use crate::config::Credentials;
use crate::error::{ReportError, Result};
use crate::report::{BuiltQuery, QueryParam, ReportRow};

/// Anything that can run a built report query and hand back its rows.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn load(&self, query: &BuiltQuery) -> Result<Vec<ReportRow>>;
}

/// Open one connection to the ledger store, bounded by the connect timeout.
pub async fn connect(credentials: &Credentials) -> Result<PgConnection> {
    let options = PgConnectOptions::new()
        .host(&credentials.host)
        .port(credentials.port)
        .database(&credentials.database)
        .username(&credentials.user)
        .password(&credentials.password);

    let attempt = PgConnection::connect_with(&options);
    match tokio::time::timeout(credentials.connect_timeout, attempt).await {
        Ok(Ok(conn)) => {
            debug!(host = %credentials.host, port = credentials.port, "connected to ledger store");
            Ok(conn)
        }
        Ok(Err(e)) => Err(ReportError::Connection(e)),
        Err(_) => Err(ReportError::ConnectTimeout(credentials.connect_timeout)),
    }
}

/// Open and immediately close a connection.
pub async fn check_connection(credentials: &Credentials) -> Result<()> {
    let conn = connect(credentials).await?;
    conn.close().await.map_err(ReportError::Connection)
}

/// Postgres-backed ledger store.
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    credentials: Credentials,
}

impl PgLedgerStore {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn load(&self, query: &BuiltQuery) -> Result<Vec<ReportRow>> {
        let mut conn = connect(&self.credentials).await?;

        let mut statement = sqlx::query_as::<_, ReportRow>(&query.sql);
        for param in &query.params {
            statement = match param {
                QueryParam::Date(d) => statement.bind(*d),
                QueryParam::Text(s) => statement.bind(s.clone()),
            };
        }
        let result = statement.fetch_all(&mut conn).await;

        // Close on every path, whether or not the query succeeded.
        if let Err(e) = conn.close().await {
            warn!(error = %e, "failed to close ledger store connection");
        }

        result.map_err(ReportError::Query)
    }
}
