//! Database gateway.
//!
//! Every call runs exactly one parameterised statement on a connection that is
//! acquired for that call and released before the call returns.

use async_trait::async_trait;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr,
    QueryResult, Statement, Value,
};
use std::sync::Arc;

/// Error type for gateway calls.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// No connection could be opened.
    #[error("Failed to acquire a database connection: {0}")]
    Connect(#[source] DbErr),
    /// The statement was rejected by the database or the exchange failed.
    #[error("Statement failed: {0}")]
    Query(#[source] DbErr),
    /// The task driving the statement did not run to completion.
    #[error("Statement task aborted: {0}")]
    Aborted(#[from] tokio::task::JoinError),
}

/// Opens and closes database connections for the gateway.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Connector: Send + Sync {
    async fn acquire(&self) -> Result<DatabaseConnection, DbErr>;

    async fn release(&self, connection: DatabaseConnection) -> Result<(), DbErr>;
}

/// Connects to Postgres with a fresh single-connection pool for every call.
#[derive(Debug, Clone)]
pub struct PgConnector {
    url: String,
}

impl PgConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl Connector for PgConnector {
    async fn acquire(&self) -> Result<DatabaseConnection, DbErr> {
        let mut options = ConnectOptions::new(self.url.clone());
        options.max_connections(1).min_connections(0);
        Database::connect(options).await
    }

    async fn release(&self, connection: DatabaseConnection) -> Result<(), DbErr> {
        connection.close().await
    }
}

#[derive(Clone)]
pub struct Gateway {
    connector: Arc<dyn Connector>,
}

impl Gateway {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }

    /// Creates a gateway that opens a Postgres connection per call.
    pub fn postgres(url: impl Into<String>) -> Self {
        Self::new(Arc::new(PgConnector::new(url)))
    }

    /// Executes `sql` with `values` bound to its `$n` placeholders.
    ///
    /// The statement text is `'static` so that only constant SQL reaches the
    /// database; user input travels exclusively through `values`.
    ///
    /// The statement runs on its own task. If the caller goes away mid-call the
    /// exchange still completes and the connection is still released.
    ///
    /// # Returns
    ///
    /// The rows produced by the statement (empty for writes), or the error that
    /// stopped it.
    #[tracing::instrument(skip(self, values))]
    pub async fn execute(
        &self,
        sql: &'static str,
        values: Vec<Value>,
    ) -> Result<Vec<QueryResult>, GatewayError> {
        let connector = self.connector.clone();
        tokio::spawn(async move { run_statement(connector.as_ref(), sql, values).await }).await?
    }
}

async fn run_statement(
    connector: &dyn Connector,
    sql: &'static str,
    values: Vec<Value>,
) -> Result<Vec<QueryResult>, GatewayError> {
    let connection = connector.acquire().await.map_err(GatewayError::Connect)?;
    let statement = Statement::from_sql_and_values(DatabaseBackend::Postgres, sql, values);
    let rows = connection
        .query_all(statement)
        .await
        .map_err(GatewayError::Query);

    if let Err(err) = connector.release(connection).await {
        tracing::warn!("Failed to release database connection: {}", err);
    }

    rows
}
