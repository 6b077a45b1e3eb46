//! IngestionRun telemetry storage.

use crate::{Result, Storage};
use sqlx::FromRow;
use techwatch_core::{IngestionRun, RunStatus};

#[derive(FromRow)]
struct RunRow {
    task_id: String,
    source_type: String,
    started_at: String,
    completed_at: Option<String>,
    status: String,
    articles_scraped: i64,
    articles_saved: i64,
    error_message: Option<String>,
}

fn parse_status(s: &str) -> RunStatus {
    match s {
        "success" => RunStatus::Success,
        "partial_success" => RunStatus::PartialSuccess,
        "failed" => RunStatus::Failed,
        "skipped" => RunStatus::Skipped,
        _ => RunStatus::Running,
    }
}

fn parse_dt(s: &str) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .unwrap_or_else(|_| chrono::Utc::now())
}

impl From<RunRow> for IngestionRun {
    fn from(row: RunRow) -> Self {
        IngestionRun {
            task_id: row.task_id,
            source_type: row.source_type,
            started_at: parse_dt(&row.started_at),
            completed_at: row.completed_at.as_deref().map(parse_dt),
            status: parse_status(&row.status),
            articles_scraped: row.articles_scraped,
            articles_saved: row.articles_saved,
            error_message: row.error_message,
        }
    }
}

impl Storage {
    pub async fn insert_run(&self, run: &IngestionRun) -> Result<()> {
        sqlx::query(
            "INSERT INTO ingestion_runs (task_id, source_type, started_at, status, articles_scraped, articles_saved) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&run.task_id)
        .bind(&run.source_type)
        .bind(run.started_at.to_rfc3339())
        .bind(run.status.to_string())
        .bind(run.articles_scraped)
        .bind(run.articles_saved)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn complete_run(&self, run: &IngestionRun) -> Result<()> {
        sqlx::query(
            "UPDATE ingestion_runs SET completed_at = ?, status = ?, articles_scraped = ?, \
             articles_saved = ?, error_message = ? WHERE task_id = ?",
        )
        .bind(run.completed_at.map(|t| t.to_rfc3339()))
        .bind(run.status.to_string())
        .bind(run.articles_scraped)
        .bind(run.articles_saved)
        .bind(&run.error_message)
        .bind(&run.task_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn run_by_task_id(&self, task_id: &str) -> Result<Option<IngestionRun>> {
        let row = sqlx::query_as::<_, RunRow>(
            "SELECT task_id, source_type, started_at, completed_at, status, articles_scraped, \
             articles_saved, error_message FROM ingestion_runs WHERE task_id = ?",
        )
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(IngestionRun::from))
    }

    pub async fn recent_runs(&self, limit: i64) -> Result<Vec<IngestionRun>> {
        let rows = sqlx::query_as::<_, RunRow>(
            "SELECT task_id, source_type, started_at, completed_at, status, articles_scraped, \
             articles_saved, error_message FROM ingestion_runs ORDER BY started_at DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(IngestionRun::from).collect())
    }
}
