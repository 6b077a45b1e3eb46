//! Integration tests for observability
//!
//! These tests verify that metrics and health checks work correctly when
//! integrated together.

use std::sync::Arc;
use techwatch_observability::{health_router, HealthState, Metrics, ReadinessChecker, SourceStatus};

struct ControllableReadinessChecker {
    ready: std::sync::atomic::AtomicBool,
    sources: Arc<std::sync::Mutex<Vec<SourceStatus>>>,
}

impl ControllableReadinessChecker {
    fn new(ready: bool) -> Self {
        Self {
            ready: std::sync::atomic::AtomicBool::new(ready),
            sources: Arc::new(std::sync::Mutex::new(vec![])),
        }
    }

    fn set_ready(&self, ready: bool) {
        self.ready.store(ready, std::sync::atomic::Ordering::SeqCst);
    }

    fn add_source(&self, status: SourceStatus) {
        self.sources.lock().unwrap().push(status);
    }
}

impl ReadinessChecker for ControllableReadinessChecker {
    fn is_ready(&self) -> bool {
        self.ready.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn get_source_statuses(&self) -> Vec<SourceStatus> {
        self.sources.lock().unwrap().clone()
    }
}

#[tokio::test]
async fn test_metrics_recording_workflow() {
    let metrics = Arc::new(Metrics::new().unwrap());

    metrics.record_ingestion_run("hackernews", "success", 30, 28, 5.0);
    metrics.record_ingestion_run("reddit", "partial_success", 20, 15, 8.0);
    metrics.record_ingestion_run("arxiv", "failed", 0, 0, 2.0);

    metrics.record_http_request("hackernews", "ok");
    metrics.record_http_retry("reddit");
    metrics.record_cache_lookup("devto", true);

    metrics.update_youtube_quota("youtube_trending", 4200);
    metrics.record_youtube_quota_exhausted("youtube_trending");

    metrics.record_scoring_pass("global", 500, 3.1);

    let gathered = metrics.registry().gather();

    let runs = gathered.iter().find(|m| m.get_name() == "techwatch_ingestion_runs_total").unwrap();
    let total_runs: f64 = runs.get_metric().iter().map(|m| m.get_counter().get_value()).sum();
    assert_eq!(total_runs, 3.0);

    let quota = gathered.iter().find(|m| m.get_name() == "techwatch_youtube_quota_used").unwrap();
    assert_eq!(quota.get_metric()[0].get_gauge().get_value(), 4200.0);

    let exhausted = gathered.iter().find(|m| m.get_name() == "techwatch_youtube_quota_exhausted_total").unwrap();
    assert_eq!(exhausted.get_metric()[0].get_counter().get_value(), 1.0);

    let scored = gathered.iter().find(|m| m.get_name() == "techwatch_items_scored_total").unwrap();
    assert_eq!(scored.get_metric()[0].get_counter().get_value(), 500.0);
}

#[tokio::test]
async fn test_health_and_metrics_integration() {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    let metrics = Arc::new(Metrics::new().unwrap());
    let checker = Arc::new(ControllableReadinessChecker::new(true));

    checker.add_source(SourceStatus {
        name: "hackernews".to_string(),
        status: "healthy".to_string(),
        success_rate: Some(0.98),
    });
    checker.add_source(SourceStatus {
        name: "reddit".to_string(),
        status: "healthy".to_string(),
        success_rate: Some(0.95),
    });

    let health_state = HealthState::with_readiness_checker(metrics.clone(), checker.clone());
    let app = health_router(health_state);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    checker.set_ready(false);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "text/plain; version=0.0.4");
}

#[tokio::test]
async fn test_concurrent_metrics_recording() {
    let metrics = Arc::new(Metrics::new().unwrap());

    let mut handles = vec![];
    for i in 0..50 {
        let metrics_clone = metrics.clone();
        let handle = tokio::spawn(async move {
            let source = if i % 2 == 0 { "hackernews" } else { "reddit" };
            metrics_clone.record_ingestion_run(source, "success", 10, 8, 1.0);
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.await.unwrap();
    }

    let gathered = metrics.registry().gather();
    let runs = gathered.iter().find(|m| m.get_name() == "techwatch_ingestion_runs_total").unwrap();
    let total: f64 = runs.get_metric().iter().map(|m| m.get_counter().get_value()).sum();
    assert_eq!(total, 50.0);
}

#[tokio::test]
async fn test_sources_separated_by_label() {
    let metrics = Arc::new(Metrics::new().unwrap());

    metrics.record_ingestion_run("hackernews", "success", 10, 10, 1.0);
    metrics.record_ingestion_run("hackernews", "success", 5, 5, 1.0);
    metrics.record_ingestion_run("reddit", "success", 8, 6, 1.0);

    let gathered = metrics.registry().gather();
    let saved = gathered.iter().find(|m| m.get_name() == "techwatch_articles_saved_total").unwrap();

    for metric in saved.get_metric() {
        let source = metric.get_label().iter().find(|l| l.get_name() == "source_type").unwrap();
        let count = metric.get_counter().get_value();
        match source.get_value() {
            "hackernews" => assert_eq!(count, 15.0),
            "reddit" => assert_eq!(count, 6.0),
            other => panic!("unexpected source_type label {other}"),
        }
    }
}

#[tokio::test]
async fn test_ingestion_duration_histogram_buckets() {
    let metrics = Arc::new(Metrics::new().unwrap());

    metrics.record_ingestion_run("hackernews", "success", 10, 10, 5.0);
    metrics.record_ingestion_run("hackernews", "success", 10, 10, 60.0);
    metrics.record_ingestion_run("hackernews", "success", 10, 10, 600.0);

    let gathered = metrics.registry().gather();
    let duration = gathered.iter().find(|m| m.get_name() == "techwatch_ingestion_duration_seconds").unwrap();

    let histogram = duration.get_metric()[0].get_histogram();
    assert_eq!(histogram.get_sample_count(), 3);

    let expected_sum = 5.0 + 60.0 + 600.0;
    assert!((histogram.get_sample_sum() - expected_sum).abs() < 0.001);
}
