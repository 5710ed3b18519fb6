//! Human-facing console output.
//!
//! Progress and summary lines are written to any `Write` sink (stdout in the
//! binary, a buffer in tests). A failing sink never aborts a run: write errors
//! are logged once and further output is dropped.

use crate::error::RunnerError;
use crate::models::{RunSummary, ScriptOutcome, ScriptReport, StatementFailure};
use crate::runner::plan::{PlanStatus, ScriptPlan};
use std::fmt::Display;
use std::io::Write;
use std::path::Path;
use tracing::warn;

const RULE_WIDTH: usize = 60;

pub struct Console<W: Write> {
    out: W,
    broken: bool,
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Self {
        Self { out, broken: false }
    }

    /// Give back the underlying sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: impl Display) {
        if self.broken {
            return;
        }
        if let Err(e) = writeln!(self.out, "{}", text) {
            warn!(error = %e, "Console output failed; suppressing further progress output");
            self.broken = true;
        }
    }

    fn blank(&mut self) {
        self.line("");
    }

    fn heavy_rule(&mut self) {
        self.line("=".repeat(RULE_WIDTH));
    }

    fn light_rule(&mut self) {
        self.line("-".repeat(RULE_WIDTH));
    }

    pub fn flush(&mut self) {
        if !self.broken && self.out.flush().is_err() {
            self.broken = true;
        }
    }

    // =========================================================================
    // Run progress
    // =========================================================================

    pub fn banner(&mut self, title: &str, details: &[(&str, String)]) {
        self.heavy_rule();
        self.line(title);
        self.heavy_rule();
        for (label, value) in details {
            self.line(format_args!("{}: {}", label, value));
        }
        self.blank();
    }

    pub fn connected(&mut self, target: &str) {
        self.line(format_args!("✓ Connected to {}", target));
    }

    pub fn connect_failed(&mut self, err: &RunnerError) {
        self.line(format_args!("✗ Error connecting: {}", err));
        if let Some(suggestion) = err.suggestion() {
            self.line(format_args!("  Hint: {}", suggestion));
        }
        self.line("Failed to connect. Exiting.");
    }

    pub fn scripts_start(&mut self) {
        self.blank();
        self.line("Executing scripts...");
        self.light_rule();
    }

    pub fn script_start(&mut self, name: &str) {
        self.blank();
        self.line(format_args!("Executing: {}", name));
    }

    pub fn script_missing(&mut self, path: &Path) {
        self.line(format_args!(
            "  ⚠ Warning: Script not found: {}",
            path.display()
        ));
    }

    pub fn script_unreadable(&mut self, path: &Path, reason: &str) {
        self.line(format_args!(
            "  ✗ Error reading script {}: {}",
            path.display(),
            reason
        ));
    }

    pub fn statement_ok(&mut self, position: usize, total: usize) {
        self.line(format_args!(
            "  ✓ Executed statement {}/{}",
            position, total
        ));
    }

    pub fn statement_failed(&mut self, failure: &StatementFailure) {
        self.line(format_args!(
            "  ✗ Error executing statement {} ({}): {}",
            failure.position, failure.operation, failure.error
        ));
        self.line(format_args!("  Statement: {}", failure.preview));
        if let Some(hint) = &failure.hint {
            self.line(format_args!("  Hint: {}", hint));
        }
    }

    pub fn script_finished(&mut self, report: &ScriptReport) {
        match &report.outcome {
            ScriptOutcome::FullySucceeded { .. } => {
                self.line(format_args!("  ✓ Completed: {}", report.name));
            }
            ScriptOutcome::PartiallySucceeded {
                succeeded,
                attempted,
            } => {
                self.line(format_args!(
                    "  ⚠ Partially completed: {} ({}/{} statements succeeded)",
                    report.name, succeeded, attempted
                ));
            }
            ScriptOutcome::Skipped { .. } => {
                self.line(format_args!("  ⚠ Skipped: {}", report.name));
            }
            ScriptOutcome::Unreadable { .. } => {
                self.line(format_args!("  ✗ Failed: {}", report.name));
            }
        }
    }

    pub fn scripts_end(&mut self) {
        self.light_rule();
        self.blank();
    }

    pub fn connection_closed(&mut self, result: &Result<(), RunnerError>) {
        match result {
            Ok(()) => self.line("✓ Connection closed"),
            Err(e) => self.line(format_args!("⚠ Connection closed with error: {}", e)),
        }
    }

    pub fn summary(&mut self, summary: &RunSummary) {
        self.blank();
        self.heavy_rule();
        self.line("Setup Summary");
        self.heavy_rule();
        self.line(format_args!(
            "Successfully executed: {}/{} scripts",
            summary.completed(),
            summary.configured()
        ));
        for report in &summary.scripts {
            self.line(format_args!("  - {}: {}", report.name, report.outcome));
        }
        self.line(format_args!(
            "Statements: {} attempted, {} failed",
            summary.statements_attempted(),
            summary.statements_failed()
        ));
        if summary.skipped() > 0 {
            self.line(format_args!("Skipped scripts: {}", summary.skipped()));
        }
        self.line(summary.tally());
        self.heavy_rule();
    }

    // =========================================================================
    // Dry-run plan
    // =========================================================================

    pub fn plan(&mut self, plans: &[ScriptPlan]) {
        for plan in plans {
            self.blank();
            self.line(format_args!("Script: {}", plan.name));
            match &plan.status {
                PlanStatus::Missing { path } => {
                    self.line(format_args!("  ⚠ Warning: Script not found: {}", path));
                }
                PlanStatus::Unreadable { path, reason } => {
                    self.line(format_args!("  ✗ Error reading script {}: {}", path, reason));
                }
                PlanStatus::Ready { statements } => {
                    if statements.is_empty() {
                        self.line("  (no executable statements)");
                    }
                    for stmt in statements {
                        let flag = if stmt.info.is_not_rerunnable() {
                            "  [not re-runnable]"
                        } else {
                            ""
                        };
                        self.line(format_args!(
                            "  {:>3}. {:<14} {}{}",
                            stmt.position, stmt.info.operation, stmt.preview, flag
                        ));
                    }
                }
            }
        }
        let ready = plans.iter().filter(|p| p.is_ready()).count();
        let statements: usize = plans.iter().map(ScriptPlan::statement_count).sum();
        self.blank();
        self.line(format_args!(
            "Planned: {}/{} scripts readable, {} statements",
            ready,
            plans.len(),
            statements
        ));
    }
}
