//! Database abstraction layer.
//!
//! This module provides the run's single connection to the remote service:
//! - Backend-specific dedicated connections (no pooling)
//! - Session context setup (role, compute target)
//! - The `Connector` / `StatementExecutor` seams the runner is written against

pub mod connection;
pub mod session;

pub use connection::{DbConnection, ServiceConnection, ServiceConnector};

use crate::error::RunnerResult;
use crate::models::DatabaseType;
use std::future::Future;

/// A live session that executes one statement at a time.
///
/// Implementations are blocking from the runner's point of view: the runner
/// awaits each call before issuing the next statement.
pub trait StatementExecutor: Send {
    /// Execute a single statement and return the number of affected rows.
    fn execute(&mut self, sql: &str) -> impl Future<Output = RunnerResult<u64>> + Send;

    /// Release the session. Called exactly once per run.
    fn close(self) -> impl Future<Output = RunnerResult<()>> + Send
    where
        Self: Sized;

    /// Backend type, used to pick a SQL dialect for classification.
    fn database_type(&self) -> Option<DatabaseType> {
        None
    }
}

/// Factory for the run's session.
pub trait Connector: Send + Sync {
    type Connection: StatementExecutor;

    /// Establish the session. Failure here is fatal to the run.
    fn connect(&self) -> impl Future<Output = RunnerResult<Self::Connection>> + Send;

    /// Display-safe description of the target (credentials masked).
    fn target(&self) -> String;
}
