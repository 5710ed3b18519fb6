//! Configuration handling for the SQL script runner.
//!
//! This module provides configuration management via CLI arguments and
//! environment variables. The runner itself never reads the environment: the
//! parsed [`Config`] is turned into an explicit [`ServiceConfig`].

use crate::models::{
    DEFAULT_COMPUTE_TARGET, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_ROLE,
    DEFAULT_STATEMENT_TIMEOUT_SECS, ServiceConfig,
};
use crate::script::ScriptSource;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

pub const DEFAULT_SCRIPT_DIR: &str = "snowflake/ddl";
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Scripts executed when none are named on the command line, in order.
pub const DEFAULT_SCRIPTS: &[&str] = &[
    "01_external_stages.sql",
    "02_hubs.sql",
    "03_links.sql",
    "04_satellites.sql",
];

/// Output format for the final report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Line-oriented progress and summary
    #[default]
    Text,
    /// Summary (or plan) as a JSON document; progress is suppressed
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Configuration for the SQL script runner.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sql-script-runner",
    about = "Execute SQL scripts statement by statement against a database and report per-script outcomes",
    version,
    author
)]
pub struct Config {
    /// Scripts to execute, in order, relative to --script-dir
    #[arg(value_name = "SCRIPT")]
    pub scripts: Vec<String>,

    /// Database connection URL (postgres://, mysql://, sqlite:)
    #[arg(
        short = 'd',
        long = "database",
        value_name = "URL",
        env = "SCRIPT_RUNNER_DATABASE_URL",
        hide_env_values = true
    )]
    pub database: Option<String>,

    /// User name merged into the connection URL
    #[arg(long, env = "SCRIPT_RUNNER_USER")]
    pub user: Option<String>,

    /// Password merged into the connection URL
    #[arg(long, env = "SCRIPT_RUNNER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Role for the session
    #[arg(long, default_value = DEFAULT_ROLE, env = "SCRIPT_RUNNER_ROLE")]
    pub role: String,

    /// Compute target (warehouse / schema) for the session
    #[arg(
        long,
        default_value = DEFAULT_COMPUTE_TARGET,
        env = "SCRIPT_RUNNER_COMPUTE_TARGET"
    )]
    pub compute_target: String,

    /// Apply role and compute target to the session after connecting
    #[arg(long, env = "SCRIPT_RUNNER_APPLY_SESSION_CONTEXT")]
    pub apply_session_context: bool,

    /// Directory the script names are resolved against
    #[arg(
        long,
        value_name = "DIR",
        default_value = DEFAULT_SCRIPT_DIR,
        env = "SCRIPT_RUNNER_SCRIPT_DIR"
    )]
    pub script_dir: PathBuf,

    /// Connection timeout in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS,
        env = "SCRIPT_RUNNER_CONNECT_TIMEOUT"
    )]
    pub connect_timeout: u64,

    /// Per-statement timeout in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_STATEMENT_TIMEOUT_SECS,
        env = "SCRIPT_RUNNER_STATEMENT_TIMEOUT"
    )]
    pub statement_timeout: u64,

    /// Parse and list statements without connecting
    #[arg(long)]
    pub dry_run: bool,

    /// Report format
    #[arg(long, value_enum, default_value = "text", env = "SCRIPT_RUNNER_FORMAT")]
    pub format: OutputFormat,

    /// Exit with status 2 when any statement failed or a script was unreadable
    #[arg(long, env = "SCRIPT_RUNNER_FAIL_ON_ERROR")]
    pub fail_on_error: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = DEFAULT_LOG_LEVEL, env = "SCRIPT_RUNNER_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "SCRIPT_RUNNER_JSON_LOGS")]
    pub json_logs: bool,
}

impl Config {
    /// Parse configuration from command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            scripts: Vec::new(),
            database: None,
            user: None,
            password: None,
            role: DEFAULT_ROLE.to_string(),
            compute_target: DEFAULT_COMPUTE_TARGET.to_string(),
            apply_session_context: false,
            script_dir: PathBuf::from(DEFAULT_SCRIPT_DIR),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT_SECS,
            statement_timeout: DEFAULT_STATEMENT_TIMEOUT_SECS,
            dry_run: false,
            format: OutputFormat::Text,
            fail_on_error: false,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            json_logs: false,
        }
    }

    /// Script names to run, falling back to the default list.
    pub fn script_names(&self) -> Vec<String> {
        if self.scripts.is_empty() {
            DEFAULT_SCRIPTS.iter().map(|s| s.to_string()).collect()
        } else {
            self.scripts.clone()
        }
    }

    /// Ordered sources resolved against the script directory.
    pub fn script_sources(&self) -> Vec<ScriptSource> {
        ScriptSource::from_dir(&self.script_dir, &self.script_names())
    }

    /// Explicit configuration for the connector.
    pub fn service_config(&self) -> ServiceConfig {
        let mut config = ServiceConfig::new(self.database.clone().unwrap_or_default())
            .with_credentials(self.user.clone(), self.password.clone());
        config.role = self.role.clone();
        config.compute_target = self.compute_target.clone();
        config.apply_session_context = self.apply_session_context;
        config.connect_timeout_secs = self.connect_timeout;
        config.statement_timeout_secs = self.statement_timeout;
        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RunnerError;
    use std::path::Path;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.role, "ADMIN");
        assert_eq!(config.compute_target, "DEFAULT_WH");
        assert_eq!(config.format, OutputFormat::Text);
        assert!(!config.dry_run);
    }

    #[test]
    fn test_default_script_list() {
        let config = Config::default();
        assert_eq!(
            config.script_names(),
            vec![
                "01_external_stages.sql",
                "02_hubs.sql",
                "03_links.sql",
                "04_satellites.sql"
            ]
        );
    }

    #[test]
    fn test_script_sources_resolve_against_dir() {
        let config = Config {
            scripts: vec!["b.sql".to_string(), "a.sql".to_string()],
            script_dir: PathBuf::from("/srv/ddl"),
            ..Config::default()
        };
        let sources = config.script_sources();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].name(), "b.sql");
        assert_eq!(sources[0].path(), Some(Path::new("/srv/ddl/b.sql")));
        assert_eq!(sources[1].name(), "a.sql");
    }

    #[test]
    fn test_service_config_from_cli() {
        let config = Config {
            database: Some("postgres://db:5432/dw".to_string()),
            user: Some("loader".to_string()),
            password: Some("pw".to_string()),
            role: "SYSADMIN".to_string(),
            connect_timeout: 3,
            apply_session_context: true,
            ..Config::default()
        };
        let service = config.service_config();
        assert_eq!(service.role, "SYSADMIN");
        assert_eq!(service.compute_target, "DEFAULT_WH");
        assert_eq!(service.connect_timeout_secs, 3);
        assert!(service.apply_session_context);
        assert_eq!(
            service.connection_url().unwrap(),
            "postgres://loader:pw@db:5432/dw"
        );
    }

    #[test]
    fn test_missing_database_fails_validation() {
        let service = Config::default().service_config();
        assert!(matches!(service.validate(), Err(RunnerError::Config { .. })));
    }

    #[test]
    fn test_parse_from_cli_arguments() {
        let config = Config::try_parse_from([
            "sql-script-runner",
            "--database",
            "sqlite:dw.db",
            "--script-dir",
            "ddl",
            "--format",
            "json",
            "--fail-on-error",
            "02_hubs.sql",
            "01_stages.sql",
        ])
        .unwrap();
        assert_eq!(config.database.as_deref(), Some("sqlite:dw.db"));
        assert_eq!(config.script_dir, PathBuf::from("ddl"));
        assert_eq!(config.format, OutputFormat::Json);
        assert!(config.fail_on_error);
        assert_eq!(config.scripts, vec!["02_hubs.sql", "01_stages.sql"]);
    }
}
