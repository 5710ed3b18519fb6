//! Data models for the SQL script runner.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;
pub mod outcome;

// Re-export commonly used types
pub use connection::{
    DEFAULT_COMPUTE_TARGET, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_ROLE,
    DEFAULT_STATEMENT_TIMEOUT_SECS, DatabaseType, ServiceConfig,
};
pub use outcome::{RunSummary, ScriptOutcome, ScriptReport, StatementFailure};
