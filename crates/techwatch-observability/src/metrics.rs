//! Prometheus metrics for the ingestion pipeline:
//! - Ingestion run counts and duration, by source and outcome
//! - Articles scraped/saved per source
//! - HTTP requests, retries, and cache hits for outbound scraper traffic
//! - YouTube Data API quota consumption
//! - Scoring pass duration (global + per-user)

use prometheus::{CounterVec, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry};
use std::sync::Arc;

#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,

    /// Ingestion runs by source type and terminal status.
    pub ingestion_runs_total: CounterVec,
    /// Run wall-clock time, by source type.
    pub ingestion_duration_seconds: HistogramVec,
    /// Articles returned by a plugin's `scrape`, before dedup.
    pub articles_scraped_total: CounterVec,
    /// Articles actually persisted (new rows or lifecycle-preserving updates).
    pub articles_saved_total: CounterVec,

    /// Outbound HTTP requests, by plugin and outcome.
    pub http_requests_total: CounterVec,
    /// Retry attempts consumed by the backoff wrapper, by plugin.
    pub http_retries_total: CounterVec,
    /// Result cache hit/miss, by plugin.
    pub cache_lookups_total: CounterVec,

    /// YouTube Data API quota units spent today.
    pub youtube_quota_used: GaugeVec,
    /// Times the YouTube quota guard skipped a scrape for being exhausted.
    pub youtube_quota_exhausted_total: CounterVec,

    /// Relevance/personalization scoring pass duration, by kind (`global`, `user`, `trend`).
    pub scoring_duration_seconds: HistogramVec,
    /// Items scored per pass, by kind.
    pub items_scored_total: CounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let ingestion_runs_total = CounterVec::new(
            Opts::new("techwatch_ingestion_runs_total", "Ingestion runs completed, by source and status"),
            &["source_type", "status"],
        )?;

        let ingestion_duration_seconds = HistogramVec::new(
            HistogramOpts::new("techwatch_ingestion_duration_seconds", "Ingestion run duration in seconds")
                .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1500.0, 1800.0]),
            &["source_type"],
        )?;

        let articles_scraped_total = CounterVec::new(
            Opts::new("techwatch_articles_scraped_total", "Articles returned by a plugin scrape"),
            &["source_type"],
        )?;

        let articles_saved_total = CounterVec::new(
            Opts::new("techwatch_articles_saved_total", "Articles persisted after dedup"),
            &["source_type"],
        )?;

        let http_requests_total = CounterVec::new(
            Opts::new("techwatch_http_requests_total", "Outbound scraper HTTP requests"),
            &["plugin", "outcome"],
        )?;

        let http_retries_total = CounterVec::new(
            Opts::new("techwatch_http_retries_total", "Outbound HTTP retry attempts"),
            &["plugin"],
        )?;

        let cache_lookups_total = CounterVec::new(
            Opts::new("techwatch_cache_lookups_total", "Result cache lookups"),
            &["plugin", "outcome"],
        )?;

        let youtube_quota_used = GaugeVec::new(
            Opts::new("techwatch_youtube_quota_used", "YouTube Data API quota units used today"),
            &["source_type"],
        )?;

        let youtube_quota_exhausted_total = CounterVec::new(
            Opts::new("techwatch_youtube_quota_exhausted_total", "Times a YouTube scrape was skipped for quota exhaustion"),
            &["source_type"],
        )?;

        let scoring_duration_seconds = HistogramVec::new(
            HistogramOpts::new("techwatch_scoring_duration_seconds", "Scoring pass duration in seconds")
                .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0]),
            &["kind"],
        )?;

        let items_scored_total = CounterVec::new(
            Opts::new("techwatch_items_scored_total", "Items scored per pass"),
            &["kind"],
        )?;

        registry.register(Box::new(ingestion_runs_total.clone()))?;
        registry.register(Box::new(ingestion_duration_seconds.clone()))?;
        registry.register(Box::new(articles_scraped_total.clone()))?;
        registry.register(Box::new(articles_saved_total.clone()))?;
        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_retries_total.clone()))?;
        registry.register(Box::new(cache_lookups_total.clone()))?;
        registry.register(Box::new(youtube_quota_used.clone()))?;
        registry.register(Box::new(youtube_quota_exhausted_total.clone()))?;
        registry.register(Box::new(scoring_duration_seconds.clone()))?;
        registry.register(Box::new(items_scored_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            ingestion_runs_total,
            ingestion_duration_seconds,
            articles_scraped_total,
            articles_saved_total,
            http_requests_total,
            http_retries_total,
            cache_lookups_total,
            youtube_quota_used,
            youtube_quota_exhausted_total,
            scoring_duration_seconds,
            items_scored_total,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record a completed source run: status plus scraped/saved counts and duration.
    pub fn record_ingestion_run(&self, source_type: &str, status: &str, scraped: i64, saved: i64, duration_secs: f64) {
        self.ingestion_runs_total.with_label_values(&[source_type, status]).inc();
        self.ingestion_duration_seconds.with_label_values(&[source_type]).observe(duration_secs);
        self.articles_scraped_total.with_label_values(&[source_type]).inc_by(scraped.max(0) as f64);
        self.articles_saved_total.with_label_values(&[source_type]).inc_by(saved.max(0) as f64);
    }

    pub fn record_http_request(&self, plugin: &str, outcome: &str) {
        self.http_requests_total.with_label_values(&[plugin, outcome]).inc();
    }

    pub fn record_http_retry(&self, plugin: &str) {
        self.http_retries_total.with_label_values(&[plugin]).inc();
    }

    pub fn record_cache_lookup(&self, plugin: &str, hit: bool) {
        let outcome = if hit { "hit" } else { "miss" };
        self.cache_lookups_total.with_label_values(&[plugin, outcome]).inc();
    }

    pub fn update_youtube_quota(&self, source_type: &str, units_used: i64) {
        self.youtube_quota_used.with_label_values(&[source_type]).set(units_used as f64);
    }

    pub fn record_youtube_quota_exhausted(&self, source_type: &str) {
        self.youtube_quota_exhausted_total.with_label_values(&[source_type]).inc();
    }

    pub fn record_scoring_pass(&self, kind: &str, items: usize, duration_secs: f64) {
        self.scoring_duration_seconds.with_label_values(&[kind]).observe(duration_secs);
        self.items_scored_total.with_label_values(&[kind]).inc_by(items as f64);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("failed to construct prometheus registry")
    }
}
