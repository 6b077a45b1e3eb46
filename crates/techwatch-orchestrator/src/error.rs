//! Orchestrator error type. Per-source scrape/persist failures are contained
//! inside `IngestionRun`/`SourceRunResult` and never surface here — this enum
//! is for failures that abort the run itself (storage unavailable, the run
//! already in flight).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("storage error: {0}")]
    Storage(#[from] techwatch_storage::StorageError),

    #[error("scoring error: {0}")]
    Scoring(#[from] techwatch_scoring::ScoringError),

    #[error("a run is already in progress for task {0}")]
    AlreadyRunning(String),

    #[error("invalid cron schedule for {job}: {reason}")]
    InvalidSchedule { job: String, reason: String },
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
