//! Run outcome data models.
//!
//! This module defines the per-statement, per-script and per-run results the
//! runner produces. All of them serialize to JSON for `--format json`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A statement that failed while its script kept running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementFailure {
    /// 1-based position of the statement within its batch.
    pub position: usize,
    /// Operation name such as "CREATE TABLE", or "UNKNOWN".
    pub operation: String,
    /// First characters of the statement text.
    pub preview: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Outcome of one configured script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScriptOutcome {
    /// Every statement executed without error (vacuously true for an empty script).
    FullySucceeded { executed: usize },
    /// All statements were attempted but some failed.
    PartiallySucceeded { succeeded: usize, attempted: usize },
    /// The script file does not exist; nothing was attempted.
    Skipped { reason: String },
    /// The script file exists but could not be read; nothing was attempted.
    Unreadable { reason: String },
}

impl ScriptOutcome {
    /// Derive the outcome of a script whose statements were all attempted.
    pub fn from_counts(succeeded: usize, attempted: usize) -> Self {
        if succeeded == attempted {
            Self::FullySucceeded {
                executed: succeeded,
            }
        } else {
            Self::PartiallySucceeded {
                succeeded,
                attempted,
            }
        }
    }

    /// True when the script ran to the end, regardless of statement failures.
    pub fn is_completed(&self) -> bool {
        matches!(
            self,
            Self::FullySucceeded { .. } | Self::PartiallySucceeded { .. }
        )
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    pub fn statements_attempted(&self) -> usize {
        match self {
            Self::FullySucceeded { executed } => *executed,
            Self::PartiallySucceeded { attempted, .. } => *attempted,
            Self::Skipped { .. } | Self::Unreadable { .. } => 0,
        }
    }

    pub fn statements_succeeded(&self) -> usize {
        match self {
            Self::FullySucceeded { executed } => *executed,
            Self::PartiallySucceeded { succeeded, .. } => *succeeded,
            Self::Skipped { .. } | Self::Unreadable { .. } => 0,
        }
    }
}

impl std::fmt::Display for ScriptOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FullySucceeded { executed } => {
                write!(f, "fully succeeded ({executed}/{executed})")
            }
            Self::PartiallySucceeded {
                succeeded,
                attempted,
            } => write!(f, "partially succeeded ({succeeded}/{attempted})"),
            Self::Skipped { reason } => write!(f, "skipped: {reason}"),
            Self::Unreadable { reason } => write!(f, "unreadable: {reason}"),
        }
    }
}

/// Result of one configured script.
#[derive(Debug, Clone, Serialize)]
pub struct ScriptReport {
    pub name: String,
    #[serde(flatten)]
    pub outcome: ScriptOutcome,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<StatementFailure>,
    pub elapsed_ms: u64,
}

/// Result of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub scripts: Vec<ScriptReport>,
}

impl RunSummary {
    /// Number of configured scripts.
    pub fn configured(&self) -> usize {
        self.scripts.len()
    }

    /// Number of scripts that ran to the end (fully or partially succeeded).
    pub fn completed(&self) -> usize {
        self.scripts
            .iter()
            .filter(|s| s.outcome.is_completed())
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.scripts.iter().filter(|s| s.outcome.is_skipped()).count()
    }

    pub fn unreadable(&self) -> usize {
        self.scripts
            .iter()
            .filter(|s| matches!(s.outcome, ScriptOutcome::Unreadable { .. }))
            .count()
    }

    pub fn statements_attempted(&self) -> usize {
        self.scripts
            .iter()
            .map(|s| s.outcome.statements_attempted())
            .sum()
    }

    pub fn statements_failed(&self) -> usize {
        self.scripts.iter().map(|s| s.failures.len()).sum()
    }

    /// True when no statement failed and no existing script was unreadable.
    pub fn is_clean(&self) -> bool {
        self.statements_failed() == 0 && self.unreadable() == 0
    }

    /// Final tally, e.g. "2/3 scripts completed".
    pub fn tally(&self) -> String {
        format!(
            "{}/{} scripts completed",
            self.completed(),
            self.configured()
        )
    }
}
