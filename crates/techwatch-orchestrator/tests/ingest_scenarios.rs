//! End-to-end orchestrator scenarios against fake plugins and an in-memory
//! sqlite store — the concrete scenarios a careful reviewer would want
//! exercised beyond the per-module unit tests: a clean pass, a mixed
//! success/failure pass, and dedup stability across repeated runs.

use std::sync::Arc;

use async_trait::async_trait;
use techwatch_core::{IngestionRun, NormalizedItem, RunStatus, ScoredKeyword, Settings};
use techwatch_orchestrator::Orchestrator;
use techwatch_scrapers::{PluginError, ScrapeConfig, ScraperPlugin, ScraperRegistry};
use techwatch_storage::Storage;

async fn test_storage() -> Storage {
    let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
    sqlx::migrate!("../techwatch-storage/migrations").run(&pool).await.unwrap();
    Storage::from_pool(pool)
}

struct FakeOkPlugin {
    name: &'static str,
    items: Vec<&'static str>,
}

#[async_trait]
impl ScraperPlugin for FakeOkPlugin {
    fn name(&self) -> &'static str {
        self.name
    }
    fn display_name(&self) -> &'static str {
        self.name
    }
    async fn scrape(&self, _config: &ScrapeConfig, _keywords: &[ScoredKeyword]) -> techwatch_scrapers::Result<Vec<NormalizedItem>> {
        Ok(self
            .items
            .iter()
            .enumerate()
            .map(|(i, url)| {
                let mut item = NormalizedItem::new(format!("item {i}"), *url, self.name);
                item.external_id = i.to_string();
                item
            })
            .collect())
    }
}

struct FakeFailingPlugin {
    name: &'static str,
}

#[async_trait]
impl ScraperPlugin for FakeFailingPlugin {
    fn name(&self) -> &'static str {
        self.name
    }
    fn display_name(&self) -> &'static str {
        self.name
    }
    async fn scrape(&self, _config: &ScrapeConfig, _keywords: &[ScoredKeyword]) -> techwatch_scrapers::Result<Vec<NormalizedItem>> {
        Err(PluginError::Parse("upstream returned malformed payload after exhausting retries".to_string()))
    }
}

async fn seed_source(storage: &Storage, name: &str, source_type: &str) {
    sqlx::query("INSERT INTO sources (name, type) VALUES (?, ?)")
        .bind(name)
        .bind(source_type)
        .execute(&storage.pool)
        .await
        .unwrap();
}

/// Scenario 1 (spec §8): a single well-behaved source saves all its items
/// and the run closes out `success`.
#[tokio::test]
async fn happy_path_single_source_succeeds() {
    ScraperRegistry::register("fake_happy", || {
        Box::new(FakeOkPlugin {
            name: "fake_happy",
            items: vec!["https://example.com/happy/1", "https://example.com/happy/2"],
        })
    });

    let storage = Arc::new(test_storage().await);
    seed_source(&storage, "happy-source", "fake_happy").await;

    let orchestrator = Orchestrator::new(storage.clone(), Arc::new(Settings::default()));
    let report = orchestrator.ingest_all(Some(vec![])).await.unwrap();

    assert_eq!(report.run.status, RunStatus::Success);
    assert_eq!(report.run.articles_saved, 2);
    assert_eq!(storage.item_count().await.unwrap(), 2);
    assert_eq!(report.per_source.len(), 1);
    assert_eq!(report.per_source[0].status, RunStatus::Success);
}

/// Scenario 2 (spec §8): one source fails outright, another succeeds ⇒ the
/// aggregate run is `partial_success` with exactly one error recorded.
#[tokio::test]
async fn mixed_sources_yield_partial_success() {
    ScraperRegistry::register("fake_fails", || Box::new(FakeFailingPlugin { name: "fake_fails" }));
    ScraperRegistry::register("fake_one_item", || {
        Box::new(FakeOkPlugin {
            name: "fake_one_item",
            items: vec!["https://example.com/partial/1"],
        })
    });

    let storage = Arc::new(test_storage().await);
    seed_source(&storage, "failing-source", "fake_fails").await;
    seed_source(&storage, "ok-source", "fake_one_item").await;

    let orchestrator = Orchestrator::new(storage.clone(), Arc::new(Settings::default()));
    let report = orchestrator.ingest_all(Some(vec![])).await.unwrap();

    assert_eq!(report.run.status, RunStatus::PartialSuccess);
    assert_eq!(report.run.articles_saved, 1);

    let failed = report.per_source.iter().filter(|r| r.status == RunStatus::Failed).count();
    let succeeded = report.per_source.iter().filter(|r| r.status == RunStatus::Success).count();
    assert_eq!(failed, 1);
    assert_eq!(succeeded, 1);
}

/// Scenario 3 (spec §8): re-running the same source twice with an unchanged
/// URL leaves the item count unchanged — dedup is idempotent across runs.
#[tokio::test]
async fn rerunning_the_same_source_does_not_duplicate_items() {
    ScraperRegistry::register("fake_stable", || {
        Box::new(FakeOkPlugin {
            name: "fake_stable",
            items: vec!["https://example.com/stable/1"],
        })
    });

    let storage = Arc::new(test_storage().await);
    seed_source(&storage, "stable-source", "fake_stable").await;

    let orchestrator = Orchestrator::new(storage.clone(), Arc::new(Settings::default()));

    let first = orchestrator.ingest_all(Some(vec![])).await.unwrap();
    assert_eq!(first.run.articles_saved, 1);
    assert_eq!(storage.item_count().await.unwrap(), 1);

    let second = orchestrator.ingest_all(Some(vec![])).await.unwrap();
    assert_eq!(second.run.articles_saved, 1);
    assert_eq!(storage.item_count().await.unwrap(), 1);
}

/// No active sources at all closes the run as `skipped` rather than
/// pretending a pass happened.
#[tokio::test]
async fn no_active_sources_closes_run_as_skipped() {
    let storage = Arc::new(test_storage().await);
    let orchestrator = Orchestrator::new(storage.clone(), Arc::new(Settings::default()));

    let report = orchestrator.ingest_all(Some(vec![])).await.unwrap();
    assert_eq!(report.run.status, RunStatus::Skipped);
    assert!(report.run.is_complete());
}

/// A source whose `type` has no registered plugin is recorded as a failed
/// source rather than aborting the whole run.
#[tokio::test]
async fn unregistered_plugin_type_fails_just_that_source() {
    let storage = Arc::new(test_storage().await);
    seed_source(&storage, "mystery-source", "does_not_exist_as_a_plugin").await;

    let orchestrator = Orchestrator::new(storage.clone(), Arc::new(Settings::default()));
    let report = orchestrator.ingest_all(Some(vec![])).await.unwrap();

    assert_eq!(report.run.status, RunStatus::Failed);
    assert_eq!(report.per_source[0].status, RunStatus::Failed);
    assert!(report.per_source[0].error.as_deref().unwrap().contains("no registered plugin"));
}

#[tokio::test]
async fn ingestion_run_start_and_complete_transition_cleanly() {
    let mut run = IngestionRun::start("task-1", "all");
    assert!(!run.is_complete());
    run.complete(RunStatus::Success, None);
    assert!(run.is_complete());
    assert_eq!(run.status, RunStatus::Success);
}
