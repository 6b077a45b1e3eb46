//! Application state and the scraping HTTP surface (SPEC_FULL §6): handlers
//! are thin wrappers that call the orchestrator and telemetry APIs and
//! serialize the result, with no auth, CRUD, or migration logic.

use std::sync::{Arc, RwLock};

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use techwatch_core::contracts::{
    RunHistoryResponse, ScrapingStatsResponse, TriggerScrapingRequest, TriggerScrapingResponse,
};
use techwatch_observability::{ReadinessChecker, SourceStatus};
use techwatch_orchestrator::Orchestrator;
use techwatch_storage::Storage;

const HISTORY_LIMIT: i64 = 50;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub storage: Arc<Storage>,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, storage: Arc<Storage>) -> Self {
        Self { orchestrator, storage }
    }
}

pub fn scraping_router(state: AppState) -> Router {
    Router::new()
        .route("/scraping/trigger", post(trigger_scraping))
        .route("/scraping/status/{task_id}", get(scraping_status))
        .route("/scraping/history", get(scraping_history))
        .route("/scraping/stats", get(scraping_stats))
        .with_state(state)
}

async fn trigger_scraping(
    State(state): State<AppState>,
    Json(req): Json<TriggerScrapingRequest>,
) -> Response {
    let orchestrator = state.orchestrator.clone();
    let keywords = req.keywords;
    // Fire-and-forget: the orchestrator persists the run as it progresses,
    // so the caller polls /scraping/status/{task_id} rather than blocking
    // on a request that can take up to the 30-minute hard deadline.
    tokio::spawn(async move {
        if let Err(e) = orchestrator.ingest_all(keywords).await {
            tracing::error!(error = %e, "triggered scraping run failed to start");
        }
    });

    Json(TriggerScrapingResponse {
        status: "accepted".to_string(),
        task_id: "all".to_string(),
        message: "scraping run started".to_string(),
    })
    .into_response()
}

async fn scraping_status(State(state): State<AppState>, Path(task_id): Path<String>) -> Response {
    match state.storage.run_by_task_id(&task_id).await {
        Ok(Some(run)) => Json(run).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, format!("no run with task_id `{task_id}`")).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn scraping_history(State(state): State<AppState>) -> Response {
    match state.storage.recent_runs(HISTORY_LIMIT).await {
        Ok(runs) => Json(RunHistoryResponse { runs }).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn scraping_stats(State(state): State<AppState>) -> Response {
    match state.storage.recent_runs(HISTORY_LIMIT).await {
        Ok(runs) => Json(ScrapingStatsResponse::from_runs(&runs)).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// Readiness snapshot refreshed periodically from storage rather than
/// queried inline, since [`ReadinessChecker`] is a synchronous trait and
/// `sqlx` access is async.
pub struct StorageReadinessChecker {
    cache: RwLock<Vec<SourceStatus>>,
}

impl StorageReadinessChecker {
    pub fn new() -> Self {
        Self { cache: RwLock::new(Vec::new()) }
    }

    pub fn refresh(&self, sources: Vec<SourceStatus>) {
        *self.cache.write().expect("readiness cache lock poisoned") = sources;
    }
}

impl Default for StorageReadinessChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadinessChecker for StorageReadinessChecker {
    fn is_ready(&self) -> bool {
        true
    }

    fn get_source_statuses(&self) -> Vec<SourceStatus> {
        self.cache.read().expect("readiness cache lock poisoned").clone()
    }
}

/// Refresh `checker`'s cache from the active sources table. Spawned as a
/// periodic background task from `main`.
pub async fn refresh_readiness_once(storage: &Storage, checker: &StorageReadinessChecker) {
    match storage.active_sources().await {
        Ok(sources) => {
            let statuses = sources
                .into_iter()
                .map(|s| SourceStatus {
                    name: s.name,
                    status: "active".to_string(),
                    success_rate: None,
                })
                .collect();
            checker.refresh(statuses);
        }
        Err(e) => tracing::warn!(error = %e, "failed to refresh readiness snapshot"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readiness_checker_starts_with_no_sources() {
        let checker = StorageReadinessChecker::new();
        assert!(checker.is_ready());
        assert!(checker.get_source_statuses().is_empty());
    }

    #[test]
    fn readiness_checker_reflects_latest_refresh() {
        let checker = StorageReadinessChecker::new();
        checker.refresh(vec![SourceStatus {
            name: "hackernews".to_string(),
            status: "active".to_string(),
            success_rate: Some(1.0),
        }]);
        let statuses = checker.get_source_statuses();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].name, "hackernews");
    }
}
