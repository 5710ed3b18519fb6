//! SQL Script Runner Library
//!
//! This library executes ordered SQL scripts statement by statement against a
//! single database session, tolerating per-statement failures and reporting a
//! per-script outcome for every configured script.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod report;
pub mod runner;
pub mod script;

pub use config::Config;
pub use error::RunnerError;
pub use runner::ScriptRunner;
