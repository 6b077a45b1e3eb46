//! The declarative schedule (C8): six triggers wired to the ingestion
//! orchestrator and scoring engine. Built on the `cron` crate's six-field
//! expressions (sec min hour day-of-month month day-of-week) plus a
//! `DashMap` guard so a job still running when its next tick arrives is
//! skipped rather than doubled up.

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use cron::Schedule;
use dashmap::DashMap;
use techwatch_scoring::{GlobalScorer, StaticEmbeddingBackend, TrendDetector};
use techwatch_storage::Storage;

use crate::ingest::Orchestrator;
use crate::summarizer::{NoopSummarizer, Summarizer, summarize_pending};

struct Job {
    name: &'static str,
    cron_expr: &'static str,
}

const JOBS: &[Job] = &[
    Job { name: "full_ingest", cron_expr: "0 0 */6 * * *" },
    Job { name: "youtube_trending", cron_expr: "0 30 */6 * * *" },
    Job { name: "global_scoring", cron_expr: "0 15 * * * *" },
    Job { name: "summarization", cron_expr: "0 0 9 * * *" },
    Job { name: "trend_detection", cron_expr: "0 0 10 * * *" },
    Job { name: "trend_cleanup", cron_expr: "0 0 3 * * Sun" },
];

pub struct Scheduler {
    orchestrator: Arc<Orchestrator>,
    storage: Arc<Storage>,
    summarizer: Arc<dyn Summarizer>,
    running: Arc<DashMap<&'static str, ()>>,
}

impl Scheduler {
    pub fn new(orchestrator: Arc<Orchestrator>, storage: Arc<Storage>) -> Self {
        Self::with_summarizer(orchestrator, storage, Arc::new(NoopSummarizer))
    }

    pub fn with_summarizer(
        orchestrator: Arc<Orchestrator>,
        storage: Arc<Storage>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            orchestrator,
            storage,
            summarizer,
            running: Arc::new(DashMap::new()),
        }
    }

    /// Spawn one background task per declared trigger. Returns their join
    /// handles so a caller (the server/cli binary) can hold the process open
    /// and abort them on shutdown.
    pub fn spawn_all(&self) -> Vec<tokio::task::JoinHandle<()>> {
        JOBS.iter().map(|job| self.spawn_one(job)).collect()
    }

    fn spawn_one(&self, job: &'static Job) -> tokio::task::JoinHandle<()> {
        let schedule = Schedule::from_str(job.cron_expr).expect("static cron expression must parse");
        let orchestrator = self.orchestrator.clone();
        let storage = self.storage.clone();
        let summarizer = self.summarizer.clone();
        let running = self.running.clone();

        tokio::spawn(async move {
            loop {
                let Some(next) = schedule.upcoming(Utc).next() else {
                    tracing::error!(job = job.name, "cron schedule produced no upcoming time, stopping");
                    return;
                };
                let delay = (next - Utc::now()).to_std().unwrap_or(std::time::Duration::ZERO);
                tokio::time::sleep(delay).await;

                if running.insert(job.name, ()).is_some() {
                    tracing::warn!(job = job.name, "previous run still in flight, skipping this tick");
                    continue;
                }

                if let Err(e) = run_job(job.name, &orchestrator, &storage, summarizer.as_ref()).await {
                    tracing::error!(job = job.name, error = %e, "scheduled job failed");
                }

                running.remove(job.name);
            }
        })
    }
}

async fn run_job(
    name: &str,
    orchestrator: &Orchestrator,
    storage: &Storage,
    summarizer: &dyn Summarizer,
) -> crate::Result<()> {
    match name {
        "full_ingest" => {
            let report = orchestrator.ingest_all(None).await?;
            tracing::info!(job = name, sources = report.per_source.len(), "full ingest pass complete");
        }
        "youtube_trending" => {
            let result = orchestrator.ingest_source("youtube_trending", None).await?;
            tracing::info!(job = name, status = %result.status, "youtube trending refresh complete");
        }
        "global_scoring" => {
            let backend = StaticEmbeddingBackend;
            let scorer = GlobalScorer::new(storage, &backend);
            let scored = scorer.score_unscored(None).await?;
            tracing::info!(job = name, scored, "global scoring pass complete");
        }
        "summarization" => {
            let outcome = summarize_pending(storage, summarizer).await?;
            tracing::info!(job = name, ?outcome, "summarization pass complete");
        }
        "trend_detection" => {
            let detector = TrendDetector::new(storage);
            let stats = detector.detect_trends().await?;
            tracing::info!(job = name, ?stats, "trend detection pass complete");
        }
        "trend_cleanup" => {
            let detector = TrendDetector::new(storage);
            let deleted = detector.cleanup(None).await?;
            tracing::info!(job = name, deleted, "trend cleanup complete");
        }
        _ => unreachable!("unregistered job name `{name}`"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_declared_job_has_a_valid_cron_expression() {
        for job in JOBS {
            Schedule::from_str(job.cron_expr)
                .unwrap_or_else(|e| panic!("job `{}` has an invalid cron expression: {e}", job.name));
        }
    }

    #[test]
    fn job_names_are_unique() {
        let mut names: Vec<&str> = JOBS.iter().map(|j| j.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), JOBS.len());
    }
}
