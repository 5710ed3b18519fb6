//! End-to-end tests against a real SQLite database file.
//!
//! Tests verify that:
//! - Scripts are applied through the real connector in order
//! - A missing script is skipped and a bad statement does not block its script
//! - Statements that succeeded stay applied (no rollback)
//! - A re-run reports duplicate-object failures with a hint instead of aborting

use sql_script_runner::db::ServiceConnector;
use sql_script_runner::models::{ScriptOutcome, ServiceConfig};
use sql_script_runner::runner::ScriptRunner;
use sql_script_runner::script::ScriptSource;
use sqlx::{Connection, SqliteConnection};
use std::path::Path;
use tempfile::TempDir;

const HUBS_SQL: &str = "\
CREATE TABLE hub_customer (customer_hk TEXT PRIMARY KEY, customer_id TEXT NOT NULL);
CREATE TABLE hub_account (account_hk TEXT PRIMARY KEY, account_id TEXT NOT NULL);
";

const LINKS_SQL: &str = "\
CREATE TABLE link_customer_account (customer_hk TEXT, account_hk TEXT);
INSERT INTO missing_table VALUES (1);
";

/// Create the script directory and return (dir, database URL).
fn setup() -> (TempDir, String) {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("02_hubs.sql"), HUBS_SQL).unwrap();
    std::fs::write(dir.path().join("03_links.sql"), LINKS_SQL).unwrap();
    let url = format!("sqlite:{}?mode=rwc", dir.path().join("dw.db").display());
    (dir, url)
}

fn sources(dir: &Path) -> Vec<ScriptSource> {
    ScriptSource::from_dir(dir, &["02_hubs.sql", "01_missing.sql", "03_links.sql"])
}

async fn table_names(url: &str) -> Vec<String> {
    let mut conn = SqliteConnection::connect(url).await.unwrap();
    let names: Vec<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .fetch_all(&mut conn)
            .await
            .unwrap();
    conn.close().await.unwrap();
    names.into_iter().map(|(n,)| n).collect()
}

#[tokio::test]
async fn test_sqlite_run_applies_scripts_and_reports_tally() {
    let (dir, url) = setup();
    let connector = ServiceConnector::new(ServiceConfig::new(&url)).unwrap();
    let mut runner = ScriptRunner::new(connector, Vec::new());

    let summary = runner.run(&sources(dir.path())).await.unwrap();

    assert_eq!(summary.tally(), "2/3 scripts completed");
    assert_eq!(
        summary.scripts[0].outcome,
        ScriptOutcome::FullySucceeded { executed: 2 }
    );
    assert!(summary.scripts[1].outcome.is_skipped());
    assert_eq!(
        summary.scripts[2].outcome,
        ScriptOutcome::PartiallySucceeded {
            succeeded: 1,
            attempted: 2
        }
    );
    let failure = &summary.scripts[2].failures[0];
    assert_eq!(failure.position, 2);
    assert_eq!(failure.operation, "INSERT");
    assert!(failure.error.contains("missing_table"));

    assert_eq!(
        table_names(&url).await,
        vec!["hub_account", "hub_customer", "link_customer_account"]
    );

    let output = String::from_utf8(runner.into_output()).unwrap();
    assert!(output.contains("✓ Completed: 02_hubs.sql"));
    assert!(output.contains("⚠ Partially completed: 03_links.sql"));
    assert!(output.contains("Successfully executed: 2/3 scripts"));
}

#[tokio::test]
async fn test_sqlite_rerun_reports_duplicates_without_aborting() {
    let (dir, url) = setup();

    let connector = ServiceConnector::new(ServiceConfig::new(&url)).unwrap();
    ScriptRunner::new(connector, Vec::new())
        .run(&sources(dir.path()))
        .await
        .unwrap();

    let connector = ServiceConnector::new(ServiceConfig::new(&url)).unwrap();
    let mut runner = ScriptRunner::new(connector, Vec::new());
    let summary = runner.run(&sources(dir.path())).await.unwrap();

    // Every CREATE fails the second time, but each script still completes.
    assert_eq!(summary.completed(), 2);
    assert_eq!(
        summary.scripts[0].outcome,
        ScriptOutcome::PartiallySucceeded {
            succeeded: 0,
            attempted: 2
        }
    );
    let hint = summary.scripts[0].failures[0].hint.as_deref().unwrap();
    assert!(hint.contains("IF NOT EXISTS"));
    assert_eq!(summary.statements_failed(), 4);
}

#[tokio::test]
async fn test_sqlite_unreachable_database_is_fatal() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("02_hubs.sql"), HUBS_SQL).unwrap();
    // No mode=rwc: the database file must already exist.
    let url = format!("sqlite:{}", dir.path().join("absent.db").display());

    let connector = ServiceConnector::new(ServiceConfig::new(&url)).unwrap();
    let mut runner = ScriptRunner::new(connector, Vec::new());
    let result = runner
        .run(&ScriptSource::from_dir(dir.path(), &["02_hubs.sql"]))
        .await;

    let err = result.unwrap_err();
    assert!(err.is_fatal());
    assert!(!dir.path().join("absent.db").exists());
}

#[tokio::test]
async fn test_summary_serializes_to_json() {
    let (dir, url) = setup();
    let connector = ServiceConnector::new(ServiceConfig::new(&url)).unwrap();
    let summary = ScriptRunner::new(connector, std::io::sink())
        .run(&sources(dir.path()))
        .await
        .unwrap();

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["scripts"][0]["status"], "fully_succeeded");
    assert_eq!(json["scripts"][1]["status"], "skipped");
    assert_eq!(json["scripts"][2]["status"], "partially_succeeded");
    assert!(json["run_id"].is_string());
}
