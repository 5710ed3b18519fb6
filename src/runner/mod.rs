//! Sequential script runner.
//!
//! Executes an ordered list of scripts against a single session:
//! - the session is opened once before the first script and closed exactly
//!   once after the last one, however many statements failed
//! - statements run strictly in source order, one at a time
//! - a failing statement is recorded and the next one runs; nothing is rolled
//!   back or retried
//! - a missing script is skipped, not failed
//!
//! Only failing to open the session stops a run.

pub mod plan;

pub use plan::{PlanStatus, PlannedStatement, ScriptPlan, plan};

use crate::db::{Connector, StatementExecutor};
use crate::error::{RunnerError, RunnerResult};
use crate::models::{RunSummary, ScriptOutcome, ScriptReport, StatementFailure};
use crate::report::Console;
use crate::script::{ScriptSource, SourceText, StatementBatch, classify, preview};
use chrono::Utc;
use std::io::Write;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub struct ScriptRunner<C, W: Write> {
    connector: C,
    console: Console<W>,
}

impl<C: Connector, W: Write> ScriptRunner<C, W> {
    /// Create a runner that opens its session through `connector` and writes
    /// progress to `out`.
    pub fn new(connector: C, out: W) -> Self {
        Self {
            connector,
            console: Console::new(out),
        }
    }

    pub fn console(&mut self) -> &mut Console<W> {
        &mut self.console
    }

    pub fn into_output(self) -> W {
        self.console.into_inner()
    }

    /// Execute `sources` in order.
    ///
    /// Returns `Err` only when the session cannot be established; in that case
    /// no statement has run. Every other failure is recorded in the summary.
    pub async fn run(&mut self, sources: &[ScriptSource]) -> RunnerResult<RunSummary> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let start = Instant::now();
        let target = self.connector.target();

        info!(run_id = %run_id, scripts = sources.len(), "Starting script run");

        let mut conn = match self.connector.connect().await {
            Ok(conn) => conn,
            Err(e) => {
                error!(run_id = %run_id, error = %e, "Failed to connect; aborting run");
                self.console.connect_failed(&e);
                self.console.flush();
                return Err(e);
            }
        };
        self.console.connected(&target);
        self.console.scripts_start();

        let mut scripts = Vec::with_capacity(sources.len());
        for source in sources {
            let report = self.run_source(&mut conn, source).await;
            self.console.script_finished(&report);
            scripts.push(report);
        }

        self.console.scripts_end();

        let closed = conn.close().await;
        match &closed {
            Ok(()) => info!(run_id = %run_id, "Connection closed"),
            Err(e) => warn!(run_id = %run_id, error = %e, "Error while closing connection"),
        }
        self.console.connection_closed(&closed);

        let summary = RunSummary {
            run_id,
            started_at,
            elapsed_ms: start.elapsed().as_millis() as u64,
            scripts,
        };

        info!(
            run_id = %run_id,
            completed = summary.completed(),
            configured = summary.configured(),
            skipped = summary.skipped(),
            statements_failed = summary.statements_failed(),
            "Script run finished"
        );

        self.console.summary(&summary);
        self.console.flush();
        Ok(summary)
    }

    async fn run_source(
        &mut self,
        conn: &mut C::Connection,
        source: &ScriptSource,
    ) -> ScriptReport {
        let name = source.name();
        let start = Instant::now();
        self.console.script_start(name);

        let text = match source.load().await {
            SourceText::Loaded(text) => text,
            SourceText::Missing(path) => {
                warn!(script = %name, path = %path.display(), "Script not found; skipping");
                self.console.script_missing(&path);
                return ScriptReport {
                    name: name.to_string(),
                    outcome: ScriptOutcome::Skipped {
                        reason: format!("not found: {}", path.display()),
                    },
                    failures: Vec::new(),
                    elapsed_ms: start.elapsed().as_millis() as u64,
                };
            }
            SourceText::Unreadable(path, e) => {
                let err = RunnerError::source(path.display().to_string(), e.to_string());
                warn!(script = %name, error = %err, "Script could not be read");
                self.console.script_unreadable(&path, &e.to_string());
                return ScriptReport {
                    name: name.to_string(),
                    outcome: ScriptOutcome::Unreadable {
                        reason: err.to_string(),
                    },
                    failures: Vec::new(),
                    elapsed_ms: start.elapsed().as_millis() as u64,
                };
            }
        };

        let batch = StatementBatch::parse(&text);
        let total = batch.len();
        let db_type = conn.database_type();
        debug!(script = %name, statements = total, "Executing script");

        let mut succeeded = 0;
        let mut failures = Vec::new();
        for (idx, sql) in batch.iter().enumerate() {
            let position = idx + 1;
            match conn.execute(sql).await {
                Ok(rows_affected) => {
                    succeeded += 1;
                    debug!(script = %name, position, rows_affected, "Statement executed");
                    self.console.statement_ok(position, total);
                }
                Err(e) => {
                    let info = classify(sql, db_type);
                    let failure = StatementFailure {
                        position,
                        operation: info.operation.to_string(),
                        preview: preview(sql),
                        error: e.to_string(),
                        sql_state: e.sql_state().map(String::from),
                        hint: info.rerun_hint(),
                    };
                    warn!(
                        script = %name,
                        position,
                        operation = %failure.operation,
                        error = %e,
                        "Statement failed; continuing"
                    );
                    self.console.statement_failed(&failure);
                    failures.push(failure);
                }
            }
        }

        ScriptReport {
            name: name.to_string(),
            outcome: ScriptOutcome::from_counts(succeeded, total),
            failures,
            elapsed_ms: start.elapsed().as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DatabaseType;
    use std::sync::{Arc, Mutex};

    /// Records every call made through the seams.
    #[derive(Default)]
    struct Probe {
        executed: Vec<String>,
        closes: usize,
    }

    struct FakeConnection {
        probe: Arc<Mutex<Probe>>,
        fail_when: fn(&str) -> bool,
    }

    impl StatementExecutor for FakeConnection {
        async fn execute(&mut self, sql: &str) -> RunnerResult<u64> {
            self.probe.lock().unwrap().executed.push(sql.to_string());
            if (self.fail_when)(sql) {
                Err(RunnerError::database("boom", Some("42000".to_string()), "fix it"))
            } else {
                Ok(0)
            }
        }

        async fn close(self) -> RunnerResult<()> {
            self.probe.lock().unwrap().closes += 1;
            Ok(())
        }

        fn database_type(&self) -> Option<DatabaseType> {
            Some(DatabaseType::PostgreSQL)
        }
    }

    struct FakeConnector {
        probe: Arc<Mutex<Probe>>,
        fail_when: fn(&str) -> bool,
    }

    impl Connector for FakeConnector {
        type Connection = FakeConnection;

        async fn connect(&self) -> RunnerResult<FakeConnection> {
            Ok(FakeConnection {
                probe: self.probe.clone(),
                fail_when: self.fail_when,
            })
        }

        fn target(&self) -> String {
            "fake://warehouse".to_string()
        }
    }

    fn runner(
        fail_when: fn(&str) -> bool,
    ) -> (ScriptRunner<FakeConnector, Vec<u8>>, Arc<Mutex<Probe>>) {
        let probe = Arc::new(Mutex::new(Probe::default()));
        let connector = FakeConnector {
            probe: probe.clone(),
            fail_when,
        };
        (ScriptRunner::new(connector, Vec::new()), probe)
    }

    #[tokio::test]
    async fn test_failure_records_hint_and_sql_state() {
        let (mut runner, _probe) = runner(|sql| sql.starts_with("CREATE TABLE hub"));
        let sources = vec![ScriptSource::inline(
            "hubs.sql",
            "CREATE TABLE hub (id INT); INSERT INTO hub VALUES (1)",
        )];

        let summary = runner.run(&sources).await.unwrap();
        let failure = &summary.scripts[0].failures[0];
        assert_eq!(failure.position, 1);
        assert_eq!(failure.operation, "CREATE TABLE");
        assert_eq!(failure.sql_state.as_deref(), Some("42000"));
        assert!(failure.hint.as_deref().unwrap().contains("IF NOT EXISTS"));
        assert_eq!(
            summary.scripts[0].outcome,
            ScriptOutcome::PartiallySucceeded {
                succeeded: 1,
                attempted: 2
            }
        );
    }

    #[tokio::test]
    async fn test_empty_script_is_fully_succeeded() {
        let (mut runner, probe) = runner(|_| false);
        let sources = vec![ScriptSource::inline("empty.sql", "-- nothing here\n;")];

        let summary = runner.run(&sources).await.unwrap();
        assert_eq!(
            summary.scripts[0].outcome,
            ScriptOutcome::FullySucceeded { executed: 0 }
        );
        assert!(probe.lock().unwrap().executed.is_empty());
        assert_eq!(probe.lock().unwrap().closes, 1);
    }

    #[tokio::test]
    async fn test_output_ends_with_tally() {
        let (mut runner, _probe) = runner(|_| false);
        let sources = vec![ScriptSource::inline("a.sql", "SELECT 1")];
        runner.run(&sources).await.unwrap();

        let output = String::from_utf8(runner.into_output()).unwrap();
        assert!(output.contains("✓ Connected to fake://warehouse"));
        assert!(output.contains("Executing: a.sql"));
        assert!(output.contains("✓ Executed statement 1/1"));
        assert!(output.contains("✓ Connection closed"));
        assert!(output.contains("1/1 scripts completed"));
    }
}
