//! Wire contracts for the inbound HTTP surface.
//!
//! These are plain request/response shapes. The façade that serves them is
//! explicitly out of scope — handlers just call the orchestrator
//! and telemetry APIs and serialize these types.

use crate::ingestion_run::{IngestionRun, RunStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerScrapingRequest {
    pub keywords: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerScrapingResponse {
    pub status: String,
    pub task_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunHistoryResponse {
    pub runs: Vec<IngestionRun>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapingStatsResponse {
    pub total_runs: i64,
    pub success_count: i64,
    pub partial_success_count: i64,
    pub failed_count: i64,
    pub success_rate: f64,
}

impl ScrapingStatsResponse {
    pub fn from_runs(runs: &[IngestionRun]) -> Self {
        let total_runs = runs.len() as i64;
        let success_count = runs.iter().filter(|r| r.status == RunStatus::Success).count() as i64;
        let partial_success_count = runs
            .iter()
            .filter(|r| r.status == RunStatus::PartialSuccess)
            .count() as i64;
        let failed_count = runs.iter().filter(|r| r.status == RunStatus::Failed).count() as i64;
        let success_rate = if total_runs == 0 {
            0.0
        } else {
            (success_count + partial_success_count) as f64 / total_runs as f64
        };
        Self {
            total_runs,
            success_count,
            partial_success_count,
            failed_count,
            success_rate,
        }
    }
}
