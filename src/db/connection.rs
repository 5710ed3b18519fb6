//! Dedicated database connection.
//!
//! The runner holds exactly one connection for the whole run, so this module
//! uses backend-specific single connections (MySqlConnection, PgConnection,
//! SqliteConnection) rather than pools. Statements are sent as raw text
//! without preparation, which lets DDL that cannot be prepared go through.

use crate::db::session::session_statements;
use crate::db::{Connector, StatementExecutor};
use crate::error::{RunnerError, RunnerResult};
use crate::models::{DatabaseType, ServiceConfig};
use sqlx::{Connection, Executor, MySqlConnection, PgConnection, SqliteConnection};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Backend-specific dedicated connection.
#[derive(Debug)]
pub enum DbConnection {
    MySql(MySqlConnection),
    Postgres(PgConnection),
    SQLite(SqliteConnection),
}

impl DbConnection {
    /// Open a connection of the given type.
    pub async fn open(db_type: DatabaseType, url: &str) -> RunnerResult<Self> {
        let conn = match db_type {
            DatabaseType::MySQL => Self::MySql(MySqlConnection::connect(url).await?),
            DatabaseType::PostgreSQL => Self::Postgres(PgConnection::connect(url).await?),
            DatabaseType::SQLite => Self::SQLite(SqliteConnection::connect(url).await?),
        };
        Ok(conn)
    }

    /// Get the database type for this connection.
    pub fn db_type(&self) -> DatabaseType {
        match self {
            DbConnection::MySql(_) => DatabaseType::MySQL,
            DbConnection::Postgres(_) => DatabaseType::PostgreSQL,
            DbConnection::SQLite(_) => DatabaseType::SQLite,
        }
    }

    /// Execute one raw statement and return affected rows.
    pub async fn execute_raw(&mut self, sql: &str) -> RunnerResult<u64> {
        let rows_affected = match self {
            DbConnection::MySql(conn) => conn.execute(sql).await?.rows_affected(),
            DbConnection::Postgres(conn) => conn.execute(sql).await?.rows_affected(),
            DbConnection::SQLite(conn) => conn.execute(sql).await?.rows_affected(),
        };
        Ok(rows_affected)
    }

    /// Close the connection, consuming it.
    pub async fn close(self) -> RunnerResult<()> {
        match self {
            DbConnection::MySql(conn) => conn.close().await?,
            DbConnection::Postgres(conn) => conn.close().await?,
            DbConnection::SQLite(conn) => conn.close().await?,
        }
        Ok(())
    }
}

/// Opens the run's connection from an explicit [`ServiceConfig`].
#[derive(Debug, Clone)]
pub struct ServiceConnector {
    config: ServiceConfig,
}

impl ServiceConnector {
    /// Create a connector. Fails when the configuration is unusable.
    pub fn new(config: ServiceConfig) -> RunnerResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    async fn apply_session_context(&self, conn: &mut DbConnection) -> RunnerResult<()> {
        let statements = session_statements(
            conn.db_type(),
            &self.config.role,
            &self.config.compute_target,
        );
        if statements.is_empty() {
            warn!(
                db_type = %conn.db_type(),
                "Session context is not supported for this database type; ignoring role and compute target"
            );
            return Ok(());
        }

        for sql in &statements {
            debug!(sql = %sql, "Applying session context");
            conn.execute_raw(sql).await.map_err(|e| {
                RunnerError::connection(
                    format!("Failed to apply session context ({}): {}", sql, e),
                    "Check that the role and compute target exist and are granted to the user",
                )
            })?;
        }
        Ok(())
    }
}

impl Connector for ServiceConnector {
    type Connection = ServiceConnection;

    async fn connect(&self) -> RunnerResult<ServiceConnection> {
        let db_type = self.config.database_type()?;
        let url = self.config.connection_url()?;
        let connect_timeout = self.config.connect_timeout();

        info!(
            endpoint = %self.target(),
            db_type = %db_type,
            role = %self.config.role,
            "Connecting to database"
        );

        let mut conn = match timeout(connect_timeout, DbConnection::open(db_type, &url)).await {
            Ok(result) => result.map_err(into_connection_error)?,
            Err(_) => {
                return Err(RunnerError::timeout(
                    "connection establishment",
                    connect_timeout.as_secs(),
                ));
            }
        };

        if self.config.apply_session_context {
            if let Err(e) = self.apply_session_context(&mut conn).await {
                if let Err(close_err) = conn.close().await {
                    warn!(error = %close_err, "Failed to close connection after session setup error");
                }
                return Err(e);
            }
        }

        info!(db_type = %db_type, "Connected successfully");

        Ok(ServiceConnection {
            conn,
            statement_timeout: self.config.statement_timeout(),
        })
    }

    fn target(&self) -> String {
        self.config.masked_endpoint()
    }
}

/// Server-side rejections while connecting (bad credentials, unknown database)
/// are still connection failures.
fn into_connection_error(err: RunnerError) -> RunnerError {
    match err {
        RunnerError::Database { message, .. } => RunnerError::connection(
            message,
            "Check the credentials, role and database name",
        ),
        other => other,
    }
}

/// The run's live session with a per-statement timeout.
#[derive(Debug)]
pub struct ServiceConnection {
    conn: DbConnection,
    statement_timeout: Duration,
}

impl StatementExecutor for ServiceConnection {
    async fn execute(&mut self, sql: &str) -> RunnerResult<u64> {
        match timeout(self.statement_timeout, self.conn.execute_raw(sql)).await {
            Ok(result) => result,
            Err(_) => Err(RunnerError::timeout(
                "statement execution",
                self.statement_timeout.as_secs(),
            )),
        }
    }

    async fn close(self) -> RunnerResult<()> {
        self.conn.close().await
    }

    fn database_type(&self) -> Option<DatabaseType> {
        Some(self.conn.db_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connector_rejects_invalid_config() {
        let result = ServiceConnector::new(ServiceConfig::new(""));
        assert!(matches!(result, Err(RunnerError::Config { .. })));
    }

    #[test]
    fn test_connector_target_is_masked() {
        let connector =
            ServiceConnector::new(ServiceConfig::new("postgres://u:secret@db:5432/dw")).unwrap();
        assert!(!connector.target().contains("secret"));
    }

    #[test]
    fn test_database_error_while_connecting_becomes_connection_error() {
        let err = into_connection_error(RunnerError::database(
            "password authentication failed",
            Some("28P01".to_string()),
            "",
        ));
        assert!(matches!(err, RunnerError::Connection { .. }));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_sqlite_connect_execute_close() {
        let connector = ServiceConnector::new(ServiceConfig::new("sqlite::memory:")).unwrap();
        let mut conn = connector.connect().await.unwrap();
        assert_eq!(conn.database_type(), Some(DatabaseType::SQLite));

        conn.execute("CREATE TABLE hub (id INTEGER PRIMARY KEY)")
            .await
            .unwrap();
        let rows = conn.execute("INSERT INTO hub (id) VALUES (1)").await.unwrap();
        assert_eq!(rows, 1);

        let err = conn.execute("CREATE TABLE hub (id INTEGER)").await.unwrap_err();
        assert!(matches!(err, RunnerError::Database { .. }));

        conn.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_sqlite_session_context_is_ignored() {
        let mut config = ServiceConfig::new("sqlite::memory:");
        config.apply_session_context = true;
        let connector = ServiceConnector::new(config).unwrap();
        let conn = connector.connect().await.unwrap();
        conn.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_sqlite_missing_file_fails_to_connect() {
        let dir = tempfile::TempDir::new().unwrap();
        let url = format!("sqlite:{}", dir.path().join("absent.db").display());
        let connector = ServiceConnector::new(ServiceConfig::new(url)).unwrap();
        let err = connector.connect().await.unwrap_err();
        assert!(err.is_fatal());
    }
}
