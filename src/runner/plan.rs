//! Dry-run planning.
//!
//! Loads and parses every configured script without connecting anywhere, so
//! an operator can see exactly which statements a run would send and which of
//! them would fail if the run were repeated.

use crate::models::DatabaseType;
use crate::script::{ScriptSource, SourceText, StatementBatch, StatementInfo, classify, preview};
use serde::Serialize;

/// One statement a run would execute.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedStatement {
    pub position: usize,
    pub preview: String,
    #[serde(flatten)]
    pub info: StatementInfo,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlanStatus {
    Ready { statements: Vec<PlannedStatement> },
    Missing { path: String },
    Unreadable { path: String, reason: String },
}

/// Plan for one configured script.
#[derive(Debug, Clone, Serialize)]
pub struct ScriptPlan {
    pub name: String,
    #[serde(flatten)]
    pub status: PlanStatus,
}

impl ScriptPlan {
    pub fn is_ready(&self) -> bool {
        matches!(self.status, PlanStatus::Ready { .. })
    }

    pub fn statement_count(&self) -> usize {
        match &self.status {
            PlanStatus::Ready { statements } => statements.len(),
            _ => 0,
        }
    }

    /// Statements expected to fail when the script is applied a second time.
    pub fn non_rerunnable(&self) -> Vec<&PlannedStatement> {
        match &self.status {
            PlanStatus::Ready { statements } => statements
                .iter()
                .filter(|s| s.info.is_not_rerunnable())
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Build the plan for `sources` in order.
pub async fn plan(sources: &[ScriptSource], db_type: Option<DatabaseType>) -> Vec<ScriptPlan> {
    let mut plans = Vec::with_capacity(sources.len());
    for source in sources {
        let status = match source.load().await {
            SourceText::Loaded(text) => PlanStatus::Ready {
                statements: StatementBatch::parse(&text)
                    .iter()
                    .enumerate()
                    .map(|(idx, sql)| PlannedStatement {
                        position: idx + 1,
                        preview: preview(sql),
                        info: classify(sql, db_type),
                    })
                    .collect(),
            },
            SourceText::Missing(path) => PlanStatus::Missing {
                path: path.display().to_string(),
            },
            SourceText::Unreadable(path, e) => PlanStatus::Unreadable {
                path: path.display().to_string(),
                reason: e.to_string(),
            },
        };
        plans.push(ScriptPlan {
            name: source.name().to_string(),
            status,
        });
    }
    plans
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_plan_lists_statements_in_order() {
        let sources = vec![ScriptSource::inline(
            "hubs.sql",
            "CREATE TABLE hub_a (id INT);\nCREATE TABLE IF NOT EXISTS hub_b (id INT);",
        )];
        let plans = plan(&sources, None).await;

        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].statement_count(), 2);
        let non_rerunnable = plans[0].non_rerunnable();
        assert_eq!(non_rerunnable.len(), 1);
        assert_eq!(non_rerunnable[0].position, 1);
    }

    #[tokio::test]
    async fn test_plan_marks_missing() {
        let dir = TempDir::new().unwrap();
        let sources = ScriptSource::from_dir(dir.path(), &["absent.sql"]);
        let plans = plan(&sources, None).await;
        assert!(matches!(plans[0].status, PlanStatus::Missing { .. }));
        assert!(!plans[0].is_ready());
        assert_eq!(plans[0].statement_count(), 0);
    }

    #[tokio::test]
    async fn test_plan_serializes() {
        let sources = vec![ScriptSource::inline("a.sql", "DROP TABLE x;")];
        let plans = plan(&sources, None).await;
        let json = serde_json::to_value(&plans).unwrap();
        assert_eq!(json[0]["name"], "a.sql");
        assert_eq!(json[0]["status"], "ready");
        assert_eq!(json[0]["statements"][0]["operation"], "DROP");
        assert_eq!(json[0]["statements"][0]["rerunnable"], false);
    }
}
