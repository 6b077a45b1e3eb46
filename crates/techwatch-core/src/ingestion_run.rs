//! IngestionRun — the authoritative telemetry record for one orchestrator run.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Success,
    PartialSuccess,
    Failed,
    Skipped,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunStatus::Running => "running",
            RunStatus::Success => "success",
            RunStatus::PartialSuccess => "partial_success",
            RunStatus::Failed => "failed",
            RunStatus::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Per-source outcome within a run, returned alongside the `IngestionRun` itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceRunResult {
    pub source_name: String,
    pub status: RunStatus,
    pub articles_scraped: i64,
    pub articles_saved: i64,
    pub duration_ms: i64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestionRun {
    pub task_id: String,
    pub source_type: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub status: RunStatus,
    pub articles_scraped: i64,
    pub articles_saved: i64,
    pub error_message: Option<String>,
}

impl IngestionRun {
    pub fn start(task_id: impl Into<String>, source_type: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            source_type: source_type.into(),
            started_at: chrono::Utc::now(),
            completed_at: None,
            status: RunStatus::Running,
            articles_scraped: 0,
            articles_saved: 0,
            error_message: None,
        }
    }

    /// Immutable once `completed_at` is set.
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn complete(&mut self, status: RunStatus, error_message: Option<String>) {
        debug_assert!(!self.is_complete(), "IngestionRun completed twice");
        self.status = status;
        self.error_message = error_message;
        self.completed_at = Some(chrono::Utc::now());
    }
}
