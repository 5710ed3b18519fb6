//! Statement classification.
//!
//! Uses [sqlparser](https://docs.rs/sqlparser/) to name the operation a
//! statement performs and to tell whether it can be applied twice without
//! failing. Classification is informational only: a statement that does not
//! parse is still executed.

use crate::models::DatabaseType;
use sqlparser::ast::Statement;
use sqlparser::dialect::{Dialect, GenericDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;

/// Broad category of a SQL statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementCategory {
    /// SELECT, SHOW, EXPLAIN
    Query,
    /// INSERT, UPDATE, DELETE, MERGE, COPY
    DmlWrite,
    /// CREATE, DROP, ALTER, TRUNCATE, COMMENT
    Ddl,
    /// BEGIN, COMMIT, ROLLBACK, SAVEPOINT
    Transaction,
    /// GRANT, REVOKE, SET, USE
    Administrative,
    /// Not recognised or not parseable
    Unknown,
}

/// Classification of one statement.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StatementInfo {
    pub category: StatementCategory,
    pub operation: &'static str,
    /// `Some(false)` when a second execution is expected to fail (e.g. CREATE
    /// TABLE without IF NOT EXISTS). `None` when it cannot be told.
    pub rerunnable: Option<bool>,
}

impl StatementInfo {
    fn new(category: StatementCategory, operation: &'static str) -> Self {
        Self {
            category,
            operation,
            rerunnable: None,
        }
    }

    fn unknown() -> Self {
        Self::new(StatementCategory::Unknown, "UNKNOWN")
    }

    fn with_rerunnable(mut self, rerunnable: bool) -> Self {
        self.rerunnable = Some(rerunnable);
        self
    }

    /// True when the statement is known to fail on a second run.
    pub fn is_not_rerunnable(&self) -> bool {
        self.rerunnable == Some(false)
    }

    /// Operator hint for a failed statement, if the classification suggests one.
    pub fn rerun_hint(&self) -> Option<String> {
        if !self.is_not_rerunnable() {
            return None;
        }
        let hint = match self.operation {
            "DROP" => "Object may already be gone from a previous run; use DROP ... IF EXISTS",
            _ => "Object may exist from a previous run; use CREATE ... IF NOT EXISTS or CREATE OR REPLACE",
        };
        Some(hint.to_string())
    }
}

/// Get the SQL dialect for the given database type (generic when unknown).
fn get_dialect(db_type: Option<DatabaseType>) -> Box<dyn Dialect> {
    match db_type {
        Some(DatabaseType::PostgreSQL) => Box::new(PostgreSqlDialect {}),
        Some(DatabaseType::MySQL) => Box::new(MySqlDialect {}),
        Some(DatabaseType::SQLite) => Box::new(SQLiteDialect {}),
        None => Box::new(GenericDialect {}),
    }
}

/// Classify a single statement's text.
///
/// # Examples
///
/// ```
/// use sql_script_runner::script::classify::{StatementCategory, classify};
///
/// let info = classify("CREATE TABLE hub_customer (id INT)", None);
/// assert_eq!(info.category, StatementCategory::Ddl);
/// assert_eq!(info.operation, "CREATE TABLE");
/// assert_eq!(info.rerunnable, Some(false));
/// ```
pub fn classify(sql: &str, db_type: Option<DatabaseType>) -> StatementInfo {
    let dialect = get_dialect(db_type);
    match Parser::parse_sql(dialect.as_ref(), sql) {
        Ok(statements) => statements
            .first()
            .map(classify_statement)
            .unwrap_or_else(StatementInfo::unknown),
        Err(_) => StatementInfo::unknown(),
    }
}

/// Classify a parsed statement.
fn classify_statement(stmt: &Statement) -> StatementInfo {
    use StatementCategory::*;

    match stmt {
        Statement::Query(_) => StatementInfo::new(Query, "SELECT"),
        Statement::ShowTables { .. } => StatementInfo::new(Query, "SHOW TABLES"),
        Statement::ShowColumns { .. } => StatementInfo::new(Query, "SHOW COLUMNS"),
        Statement::ShowCreate { .. } => StatementInfo::new(Query, "SHOW CREATE"),
        Statement::Explain { .. } => StatementInfo::new(Query, "EXPLAIN"),

        Statement::Insert(_) => StatementInfo::new(DmlWrite, "INSERT"),
        Statement::Update { .. } => StatementInfo::new(DmlWrite, "UPDATE"),
        Statement::Delete(_) => StatementInfo::new(DmlWrite, "DELETE"),
        Statement::Merge { .. } => StatementInfo::new(DmlWrite, "MERGE"),
        Statement::Copy { .. } => StatementInfo::new(DmlWrite, "COPY"),
        Statement::CopyIntoSnowflake { .. } => StatementInfo::new(DmlWrite, "COPY INTO"),

        Statement::CreateTable(create) => StatementInfo::new(Ddl, "CREATE TABLE")
            .with_rerunnable(create.if_not_exists || create.or_replace),
        Statement::CreateIndex(create) => {
            StatementInfo::new(Ddl, "CREATE INDEX").with_rerunnable(create.if_not_exists)
        }
        Statement::CreateView { .. } => StatementInfo::new(Ddl, "CREATE VIEW"),
        Statement::CreateSchema { .. } => StatementInfo::new(Ddl, "CREATE SCHEMA"),
        Statement::CreateDatabase { .. } => StatementInfo::new(Ddl, "CREATE DATABASE"),
        Statement::CreateSequence { .. } => StatementInfo::new(Ddl, "CREATE SEQUENCE"),
        Statement::CreateFunction { .. } => StatementInfo::new(Ddl, "CREATE FUNCTION"),
        Statement::CreateRole { .. } => StatementInfo::new(Ddl, "CREATE ROLE"),
        Statement::CreateStage { .. } => StatementInfo::new(Ddl, "CREATE STAGE"),
        Statement::AlterTable { .. } => StatementInfo::new(Ddl, "ALTER TABLE"),
        Statement::AlterView { .. } => StatementInfo::new(Ddl, "ALTER VIEW"),
        Statement::AlterIndex { .. } => StatementInfo::new(Ddl, "ALTER INDEX"),
        Statement::Drop { if_exists, .. } => {
            StatementInfo::new(Ddl, "DROP").with_rerunnable(*if_exists)
        }
        Statement::Truncate { .. } => StatementInfo::new(Ddl, "TRUNCATE"),
        Statement::Comment { .. } => StatementInfo::new(Ddl, "COMMENT"),

        Statement::StartTransaction { .. } => StatementInfo::new(Transaction, "BEGIN"),
        Statement::Commit { .. } => StatementInfo::new(Transaction, "COMMIT"),
        Statement::Rollback { .. } => StatementInfo::new(Transaction, "ROLLBACK"),
        Statement::Savepoint { .. } => StatementInfo::new(Transaction, "SAVEPOINT"),

        Statement::Grant { .. } => StatementInfo::new(Administrative, "GRANT"),
        Statement::Revoke { .. } => StatementInfo::new(Administrative, "REVOKE"),
        Statement::Set(_) => StatementInfo::new(Administrative, "SET"),
        Statement::Use(_) => StatementInfo::new(Administrative, "USE"),

        _ => StatementInfo::unknown(),
    }
}
