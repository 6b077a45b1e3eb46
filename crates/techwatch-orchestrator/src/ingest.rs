//! The ingestion orchestrator (C7): fans out over active sources, bounded to
//! at most 8 concurrent scrapes, records one `IngestionRun` per source plus
//! an aggregate "all" run for the whole pass, and contains per-source
//! failures so one bad plugin never takes down the rest.

use std::sync::Arc;
use std::time::{Duration, Instant};

use techwatch_core::{IngestionRun, RunStatus, ScoredKeyword, Settings, SourceRunResult};
use techwatch_http::cache::ResultCache;
use techwatch_observability::Metrics;
use techwatch_scoring::{GlobalScorer, StaticEmbeddingBackend};
use techwatch_scrapers::{ScrapeConfig, ScraperRegistry};
use techwatch_storage::Storage;
use tokio::sync::Semaphore;

use crate::Result;

const MAX_CONCURRENT_SOURCES: usize = 8;
const SOFT_DEADLINE: Duration = Duration::from_secs(25 * 60);
const HARD_DEADLINE: Duration = Duration::from_secs(30 * 60);

/// Outcome of one orchestrator pass over every active source.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run: IngestionRun,
    pub per_source: Vec<SourceRunResult>,
}

pub struct Orchestrator {
    storage: Arc<Storage>,
    settings: Arc<Settings>,
    cache: Option<Arc<ResultCache>>,
    metrics: Option<Arc<Metrics>>,
    run_scoring: bool,
}

impl Orchestrator {
    pub fn new(storage: Arc<Storage>, settings: Arc<Settings>) -> Self {
        let cache = ResultCache::new(&settings.redis_url, Duration::from_secs(3600)).ok().map(Arc::new);
        Self {
            storage,
            settings,
            cache,
            metrics: None,
            run_scoring: true,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Whether a successful pass with `articles_saved > 0` chains the global
    /// scoring job (SPEC_FULL §4.7 step 7). Defaults to `true`; the scheduler
    /// also runs scoring on its own hourly cadence, so callers that want to
    /// avoid double-scoring a manual trigger can disable this.
    pub fn with_run_scoring(mut self, run_scoring: bool) -> Self {
        self.run_scoring = run_scoring;
        self
    }

    /// Run every active source once, optionally overriding the global
    /// keyword set with an ad-hoc list (the manual-trigger case). Bounds
    /// fan-out to [`MAX_CONCURRENT_SOURCES`] and enforces the soft/hard
    /// deadlines on the aggregate run.
    pub async fn ingest_all(&self, keywords_override: Option<Vec<String>>) -> Result<RunReport> {
        let task_id = uuid::Uuid::new_v4().to_string();
        let mut run = IngestionRun::start(task_id.clone(), "all");
        self.storage.insert_run(&run).await?;

        let keywords = resolve_scored_keywords(&self.storage, keywords_override).await?;

        let sources = self.storage.active_sources().await?;
        let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_SOURCES));
        let started = Instant::now();

        let scrape_pass = async {
            let mut handles = Vec::with_capacity(sources.len());
            for source in sources {
                let semaphore = semaphore.clone();
                let storage = self.storage.clone();
                let cache = self.cache.clone();
                let metrics = self.metrics.clone();
                let keywords = keywords.clone();
                let settings = self.settings.clone();

                handles.push(tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
                    run_one_source(&storage, &settings, cache.as_deref(), metrics.as_deref(), &source, &keywords).await
                }));
            }

            let mut results = Vec::with_capacity(handles.len());
            for handle in handles {
                match handle.await {
                    Ok(result) => results.push(result),
                    Err(join_err) => results.push(SourceRunResult {
                        source_name: "unknown".to_string(),
                        status: RunStatus::Failed,
                        articles_scraped: 0,
                        articles_saved: 0,
                        duration_ms: 0,
                        error: Some(format!("task panicked: {join_err}")),
                    }),
                }
            }
            results
        };

        let soft_deadline_task_id = task_id.clone();
        let soft_deadline_warning = tokio::spawn(async move {
            tokio::time::sleep(SOFT_DEADLINE).await;
            tracing::warn!(task_id = %soft_deadline_task_id, "ingestion run exceeded soft deadline of {:?}", SOFT_DEADLINE);
        });

        let per_source = match tokio::time::timeout(HARD_DEADLINE, scrape_pass).await {
            Ok(results) => results,
            Err(_) => {
                tracing::error!(task_id, "ingestion run exceeded hard deadline of {:?}", HARD_DEADLINE);
                Vec::new()
            }
        };
        soft_deadline_warning.abort();

        let articles_scraped: i64 = per_source.iter().map(|r| r.articles_scraped).sum();
        let articles_saved: i64 = per_source.iter().map(|r| r.articles_saved).sum();
        let failed = per_source.iter().filter(|r| r.status == RunStatus::Failed).count();
        let succeeded = per_source.iter().filter(|r| r.status == RunStatus::Success).count();

        let status = if per_source.is_empty() {
            RunStatus::Skipped
        } else if failed == 0 {
            RunStatus::Success
        } else if succeeded > 0 {
            RunStatus::PartialSuccess
        } else {
            RunStatus::Failed
        };

        run.articles_scraped = articles_scraped;
        run.articles_saved = articles_saved;
        let error_message = (status == RunStatus::Failed).then(|| format!("{failed} of {} sources failed", per_source.len()));
        run.complete(status, error_message);
        self.storage.complete_run(&run).await?;

        if let Some(metrics) = &self.metrics {
            metrics.record_ingestion_run("all", &status.to_string(), articles_scraped, articles_saved, started.elapsed().as_secs_f64());
        }

        if self.run_scoring && articles_saved > 0 {
            self.enqueue_scoring();
        }

        Ok(RunReport { run, per_source })
    }

    /// Run a single source by its registered type, bypassing the fan-out and
    /// deadlines that govern a full pass — used by triggers that only care
    /// about one source, such as the YouTube trending refresh.
    pub async fn ingest_source(
        &self,
        source_type: &str,
        keywords_override: Option<Vec<String>>,
    ) -> Result<SourceRunResult> {
        let Some(source) = self.storage.source_by_type(source_type).await? else {
            return Ok(SourceRunResult {
                source_name: source_type.to_string(),
                status: RunStatus::Skipped,
                articles_scraped: 0,
                articles_saved: 0,
                duration_ms: 0,
                error: Some(format!("no source configured for type `{source_type}`")),
            });
        };

        let keywords = resolve_scored_keywords(&self.storage, keywords_override).await?;

        let result = run_one_source(
            &self.storage,
            &self.settings,
            self.cache.as_deref(),
            self.metrics.as_deref(),
            &source,
            &keywords,
        )
        .await;

        if let Some(metrics) = &self.metrics {
            metrics.record_ingestion_run(
                source_type,
                &result.status.to_string(),
                result.articles_scraped,
                result.articles_saved,
                result.duration_ms as f64 / 1000.0,
            );
        }

        Ok(result)
    }

    /// Fire the global scoring pass in the background so `ingest_all`
    /// doesn't block its own return on re-scoring every saved item.
    fn enqueue_scoring(&self) {
        let storage = self.storage.clone();
        tokio::spawn(async move {
            let backend = StaticEmbeddingBackend;
            let scorer = GlobalScorer::new(&storage, &backend);
            match scorer.score_unscored(None).await {
                Ok(scored) => tracing::info!(scored, "chained global scoring pass complete"),
                Err(e) => tracing::warn!(error = %e, "chained global scoring pass failed"),
            }
        });
    }
}

async fn run_one_source(
    storage: &Storage,
    settings: &Settings,
    cache: Option<&ResultCache>,
    metrics: Option<&Metrics>,
    source: &techwatch_core::Source,
    keywords: &[ScoredKeyword],
) -> SourceRunResult {
    let started = Instant::now();
    let source_run = IngestionRun::start(uuid::Uuid::new_v4().to_string(), source.r#type.clone());
    let _ = storage.insert_run(&source_run).await;

    let Some(plugin) = ScraperRegistry::get(&source.r#type) else {
        return SourceRunResult {
            source_name: source.name.clone(),
            status: RunStatus::Failed,
            articles_scraped: 0,
            articles_saved: 0,
            duration_ms: started.elapsed().as_millis() as i64,
            error: Some(format!("no registered plugin for source type `{}`", source.r#type)),
        };
    };

    let config = build_scrape_config(source, settings);
    if !plugin.validate_config(&config) {
        return SourceRunResult {
            source_name: source.name.clone(),
            status: RunStatus::Failed,
            articles_scraped: 0,
            articles_saved: 0,
            duration_ms: started.elapsed().as_millis() as i64,
            error: Some(format!("missing required config for `{}`", source.r#type)),
        };
    }

    let outcome = plugin.scrape_with_cache(&config, keywords, cache).await;

    if let Some(metrics) = metrics {
        metrics.record_http_request(&source.r#type, if outcome.is_ok() { "ok" } else { "error" });
    }

    match outcome {
        Ok(items) => {
            let scraped = items.len() as i64;

            // One transaction per source: commit once at the end, roll the
            // whole batch back on the first DB error rather than leaving a
            // partially-applied source behind.
            match storage.persist_items(&items, source.id, source.produces_video()).await {
                Ok(saved) => {
                    let _ = storage.touch_last_scraped(source.id).await;
                    SourceRunResult {
                        source_name: source.name.clone(),
                        status: RunStatus::Success,
                        articles_scraped: scraped,
                        articles_saved: saved,
                        duration_ms: started.elapsed().as_millis() as i64,
                        error: None,
                    }
                }
                Err(e) => {
                    tracing::warn!(source = %source.name, error = %e, "failed to persist source batch, rolled back");
                    SourceRunResult {
                        source_name: source.name.clone(),
                        status: RunStatus::Failed,
                        articles_scraped: scraped,
                        articles_saved: 0,
                        duration_ms: started.elapsed().as_millis() as i64,
                        error: Some(e.to_string()),
                    }
                }
            }
        }
        Err(e) => {
            tracing::warn!(source = %source.name, error = %e, "source scrape failed");
            SourceRunResult {
                source_name: source.name.clone(),
                status: RunStatus::Failed,
                articles_scraped: 0,
                articles_saved: 0,
                duration_ms: started.elapsed().as_millis() as i64,
                error: Some(e.to_string()),
            }
        }
    }
}

/// Resolve the keyword set a scrape pass runs against, carrying each
/// keyword's weight through to the plugin boundary rather than flattening
/// to bare text — plugins that compute a weight-sensitive relevance score
/// (e.g. `youtube_trending`'s Σ weight_i) depend on it.
///
/// An ad-hoc override (the manual-trigger case) is matched case-insensitively
/// against the active keyword set to recover its weight/category; anything
/// that isn't a known keyword defaults to `weight: 1.0, category: "other"`.
async fn resolve_scored_keywords(storage: &Storage, keywords_override: Option<Vec<String>>) -> Result<Vec<ScoredKeyword>> {
    let active = storage.active_keywords().await?;
    Ok(match keywords_override {
        Some(words) => words
            .into_iter()
            .map(|word| {
                active
                    .iter()
                    .find(|k| k.keyword.eq_ignore_ascii_case(&word))
                    .map(ScoredKeyword::from)
                    .unwrap_or(ScoredKeyword { keyword: word, weight: 1.0, category: "other".to_string() })
            })
            .collect(),
        None => active.iter().map(ScoredKeyword::from).collect(),
    })
}

/// Merge the source's stored config with secrets from app [`Settings`] that
/// never live in the `sources` table (API keys, the shared Redis URL for the
/// YouTube quota manager).
fn build_scrape_config(source: &techwatch_core::Source, settings: &Settings) -> ScrapeConfig {
    let mut values = source.config.clone();
    values.entry("redis_url".to_string()).or_insert_with(|| serde_json::json!(settings.redis_url));

    match source.r#type.as_str() {
        "reddit" => {
            if let Some(id) = &settings.reddit_client_id {
                values.insert("client_id".to_string(), serde_json::json!(id));
            }
            if let Some(secret) = &settings.reddit_client_secret {
                values.insert("client_secret".to_string(), serde_json::json!(secret));
            }
        }
        "youtube_rss" | "youtube_trending" => {
            if let Some(key) = &settings.youtube_api_key {
                values.insert("api_key".to_string(), serde_json::json!(key));
            }
        }
        "devto" => {
            if let Some(key) = &settings.devto_api_key {
                values.insert("api_key".to_string(), serde_json::json!(key));
            }
        }
        _ => {}
    }

    let max_articles = values.get("max_articles").and_then(|v| v.as_u64()).unwrap_or(30) as usize;
    ScrapeConfig { max_articles, values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use techwatch_core::Source;

    fn sample_source(source_type: &str) -> Source {
        Source {
            id: 1,
            name: source_type.to_string(),
            r#type: source_type.to_string(),
            base_url: None,
            is_active: true,
            scrape_frequency_hours: 6,
            last_scraped_at: None,
            config: HashMap::new(),
        }
    }

    #[test]
    fn build_scrape_config_injects_reddit_secrets() {
        let mut settings = Settings::default();
        settings.reddit_client_id = Some("id123".to_string());
        settings.reddit_client_secret = Some("secret456".to_string());

        let config = build_scrape_config(&sample_source("reddit"), &settings);
        assert_eq!(config.get_str("client_id"), Some("id123"));
        assert_eq!(config.get_str("client_secret"), Some("secret456"));
    }

    #[test]
    fn build_scrape_config_leaves_unrelated_sources_untouched() {
        let settings = Settings::default();
        let config = build_scrape_config(&sample_source("hackernews"), &settings);
        assert!(config.get_str("client_id").is_none());
        assert!(config.get_str("api_key").is_none());
    }

    #[test]
    fn build_scrape_config_defaults_max_articles_to_thirty() {
        let settings = Settings::default();
        let config = build_scrape_config(&sample_source("hackernews"), &settings);
        assert_eq!(config.max_articles, 30);
    }
}
