//! Article summarization (C8's daily job). The original Celery task calls out
//! to Claude for a short abstractive summary of each unsummarized article;
//! wiring a live model client is out of scope here, so [`Summarizer`] is a
//! trait with a single [`NoopSummarizer`] implementation that mirrors the
//! original's `{"status": "skipped", "reason": "no_api_key"}` branch.

use async_trait::async_trait;
use techwatch_core::Item;

const BATCH_LIMIT: i64 = 50;
const SUMMARY_MAX_CHARS: usize = 200;

/// Outcome of one summarization pass, shaped like the original task's return
/// payload so a future real implementation can report it the same way.
#[derive(Debug, Clone, PartialEq)]
pub enum SummarizeOutcome {
    Skipped { reason: &'static str },
    Completed { articles_summarized: usize },
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Produce a summary for one article's content, truncated to a target
    /// length. Returns `None` when no summarization backend is configured.
    async fn summarize(&self, title: &str, content: &str) -> Option<String>;
}

/// No API client configured: every call reports the absence rather than
/// fabricating a summary.
pub struct NoopSummarizer;

#[async_trait]
impl Summarizer for NoopSummarizer {
    async fn summarize(&self, _title: &str, _content: &str) -> Option<String> {
        None
    }
}

/// Truncate `content` to a naive first-`SUMMARY_MAX_CHARS`-chars summary.
/// Stands in for a real model call; a future [`Summarizer`] backed by the
/// Anthropic API replaces just this function's caller, not the job shape.
fn truncate_summary(content: &str) -> String {
    content.chars().take(SUMMARY_MAX_CHARS).collect()
}

/// Run the daily summarization pass: fetch up to [`BATCH_LIMIT`] articles
/// with content but no summary, summarize each via `summarizer`, and persist
/// the result. Mirrors the original's no-op when no API key is configured —
/// callers pass [`NoopSummarizer`] in that case and every article is skipped.
pub async fn summarize_pending(
    storage: &techwatch_storage::Storage,
    summarizer: &dyn Summarizer,
) -> techwatch_storage::Result<SummarizeOutcome> {
    let pending: Vec<Item> = storage.items_unsummarized(BATCH_LIMIT).await?;
    if pending.is_empty() {
        return Ok(SummarizeOutcome::Completed { articles_summarized: 0 });
    }

    let mut summarized = 0usize;
    for item in &pending {
        let Some(content) = &item.content else { continue };
        match summarizer.summarize(&item.title, content).await {
            Some(summary) => {
                let summary = truncate_summary(&summary);
                storage.set_item_summary(item.id, &summary).await?;
                summarized += 1;
            }
            None => {
                return Ok(SummarizeOutcome::Skipped { reason: "no_api_key" });
            }
        }
    }

    Ok(SummarizeOutcome::Completed { articles_summarized: summarized })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoSummarizer;

    #[async_trait]
    impl Summarizer for EchoSummarizer {
        async fn summarize(&self, title: &str, _content: &str) -> Option<String> {
            Some(format!("summary of {title}"))
        }
    }

    #[test]
    fn truncate_summary_caps_length() {
        let long = "x".repeat(SUMMARY_MAX_CHARS * 2);
        assert_eq!(truncate_summary(&long).chars().count(), SUMMARY_MAX_CHARS);
    }

    #[tokio::test]
    async fn noop_summarizer_never_produces_a_summary() {
        let summarizer = NoopSummarizer;
        assert!(summarizer.summarize("title", "content").await.is_none());
    }

    #[tokio::test]
    async fn summarize_pending_skips_when_no_unsummarized_items() {
        let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::migrate!("../techwatch-storage/migrations").run(&pool).await.unwrap();
        let storage = techwatch_storage::Storage::from_pool(pool);

        let outcome = summarize_pending(&storage, &NoopSummarizer).await.unwrap();
        assert_eq!(outcome, SummarizeOutcome::Completed { articles_summarized: 0 });
    }

    #[tokio::test]
    async fn summarize_pending_reports_no_api_key_when_summarizer_abstains() {
        let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::migrate!("../techwatch-storage/migrations").run(&pool).await.unwrap();
        let storage = techwatch_storage::Storage::from_pool(pool);

        let source_id = storage.insert_source("hn", "hackernews").await.unwrap();

        let mut item = techwatch_core::NormalizedItem::new("A title", "https://example.com/a", "hackernews");
        item.content = Some("body text".to_string());
        storage.upsert_item(&item, source_id, false).await.unwrap();

        let outcome = summarize_pending(&storage, &NoopSummarizer).await.unwrap();
        assert_eq!(outcome, SummarizeOutcome::Skipped { reason: "no_api_key" });
    }

    #[tokio::test]
    async fn summarize_pending_persists_summaries_when_summarizer_available() {
        let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::migrate!("../techwatch-storage/migrations").run(&pool).await.unwrap();
        let storage = techwatch_storage::Storage::from_pool(pool);

        let source_id = storage.insert_source("hn", "hackernews").await.unwrap();

        let mut item = techwatch_core::NormalizedItem::new("A title", "https://example.com/b", "hackernews");
        item.content = Some("body text".to_string());
        storage.upsert_item(&item, source_id, false).await.unwrap();

        let outcome = summarize_pending(&storage, &EchoSummarizer).await.unwrap();
        assert_eq!(outcome, SummarizeOutcome::Completed { articles_summarized: 1 });

        let reloaded = storage.item_by_url("https://example.com/b").await.unwrap().unwrap();
        assert_eq!(reloaded.summary.as_deref(), Some("summary of A title"));
    }
}
