//! Connection-related data models.
//!
//! This module defines the database type detection and the explicit service
//! configuration handed to the connector.

use crate::error::{RunnerError, RunnerResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Role used when none is configured.
pub const DEFAULT_ROLE: &str = "ADMIN";

/// Compute target used when none is configured.
pub const DEFAULT_COMPUTE_TARGET: &str = "DEFAULT_WH";

pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_STATEMENT_TIMEOUT_SECS: u64 = 300;

const MASK: &str = "****";

/// Supported database types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    PostgreSQL,
    /// Includes MariaDB
    MySQL,
    SQLite,
}

impl DatabaseType {
    /// Parse database type from a connection string.
    pub fn from_connection_string(connection_string: &str) -> Option<Self> {
        let lower = connection_string.to_lowercase();
        if lower.starts_with("postgres://") || lower.starts_with("postgresql://") {
            Some(Self::PostgreSQL)
        } else if lower.starts_with("mysql://") || lower.starts_with("mariadb://") {
            Some(Self::MySQL)
        } else if lower.starts_with("sqlite://") || lower.starts_with("sqlite:") {
            Some(Self::SQLite)
        } else {
            None
        }
    }

    /// Get the display name for this database type.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::PostgreSQL => "PostgreSQL",
            Self::MySQL => "MySQL",
            Self::SQLite => "SQLite",
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Everything the connector needs to open the run's single connection.
#[derive(Clone)]
pub struct ServiceConfig {
    /// Connection URL. May contain credentials - never log it directly.
    pub endpoint: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub role: String,
    pub compute_target: String,
    /// Apply role and compute target to the session right after connecting.
    pub apply_session_context: bool,
    pub connect_timeout_secs: u64,
    pub statement_timeout_secs: u64,
}

impl ServiceConfig {
    /// Create a configuration for `endpoint` with default role, compute target and timeouts.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            user: None,
            password: None,
            role: DEFAULT_ROLE.to_string(),
            compute_target: DEFAULT_COMPUTE_TARGET.to_string(),
            apply_session_context: false,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            statement_timeout_secs: DEFAULT_STATEMENT_TIMEOUT_SECS,
        }
    }

    pub fn with_credentials(mut self, user: Option<String>, password: Option<String>) -> Self {
        self.user = user.filter(|u| !u.is_empty());
        self.password = password.filter(|p| !p.is_empty());
        self
    }

    /// Check the values the service mandates and return the detected database type.
    pub fn validate(&self) -> RunnerResult<DatabaseType> {
        if self.endpoint.trim().is_empty() {
            return Err(RunnerError::config(
                "Database URL is required (--database or SCRIPT_RUNNER_DATABASE_URL)",
            ));
        }
        if self.role.trim().is_empty() {
            return Err(RunnerError::config("Role cannot be empty"));
        }
        if self.compute_target.trim().is_empty() {
            return Err(RunnerError::config("Compute target cannot be empty"));
        }
        self.database_type()
    }

    /// Database type derived from the endpoint scheme.
    pub fn database_type(&self) -> RunnerResult<DatabaseType> {
        DatabaseType::from_connection_string(&self.endpoint).ok_or_else(|| {
            RunnerError::config(format!(
                "Unknown database type in URL: {}",
                self.masked_endpoint()
            ))
        })
    }

    /// Connection URL with the separately configured credentials merged in.
    pub fn connection_url(&self) -> RunnerResult<String> {
        let db_type = self.database_type()?;
        if db_type == DatabaseType::SQLite || (self.user.is_none() && self.password.is_none()) {
            return Ok(self.endpoint.clone());
        }

        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| RunnerError::config(format!("Invalid database URL: {e}")))?;
        if let Some(user) = self.user.as_deref() {
            url.set_username(user)
                .map_err(|_| RunnerError::config("Database URL cannot carry a user name"))?;
        }
        if let Some(password) = self.password.as_deref() {
            url.set_password(Some(password))
                .map_err(|_| RunnerError::config("Database URL cannot carry a password"))?;
        }
        Ok(url.to_string())
    }

    /// Display-safe endpoint (password masked).
    pub fn masked_endpoint(&self) -> String {
        match Url::parse(&self.endpoint) {
            Ok(mut url) if url.password().is_some() => {
                // Cannot fail: a URL that already has a password can carry one.
                let _ = url.set_password(Some(MASK));
                url.to_string()
            }
            _ => self.endpoint.clone(),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn statement_timeout(&self) -> Duration {
        Duration::from_secs(self.statement_timeout_secs)
    }
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("endpoint", &self.masked_endpoint())
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| MASK))
            .field("role", &self.role)
            .field("compute_target", &self.compute_target)
            .field("apply_session_context", &self.apply_session_context)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("statement_timeout_secs", &self.statement_timeout_secs)
            .finish()
    }
}
