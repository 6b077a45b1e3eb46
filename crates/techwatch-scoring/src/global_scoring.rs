//! Wires the pure relevance scorer (C9) to storage: loads active keywords
//! and unscored items, scores each, and writes `score`/`category` back.

use crate::Result;
use crate::backend::TextScoringBackend;
use crate::relevance;
use techwatch_core::ScoredKeyword;
use techwatch_storage::Storage;

const DEFAULT_BATCH_LIMIT: i64 = 500;

pub struct GlobalScorer<'a> {
    storage: &'a Storage,
    backend: &'a dyn TextScoringBackend,
}

impl<'a> GlobalScorer<'a> {
    pub fn new(storage: &'a Storage, backend: &'a dyn TextScoringBackend) -> Self {
        Self { storage, backend }
    }

    /// Score up to `limit` (default 500) unscored items against the active
    /// global keyword set. Returns the number of items scored.
    pub async fn score_unscored(&self, limit: Option<i64>) -> Result<usize> {
        let keywords: Vec<ScoredKeyword> = self
            .storage
            .active_keywords()
            .await?
            .iter()
            .map(ScoredKeyword::from)
            .collect();

        if keywords.is_empty() {
            tracing::warn!("no active keywords — skipping global scoring pass");
            return Ok(0);
        }

        let items = self.storage.unscored_items(limit.unwrap_or(DEFAULT_BATCH_LIMIT)).await?;
        for item in &items {
            let text = format!("{} {}", item.title, item.content.as_deref().unwrap_or(""));
            let result = relevance::score(&text, &keywords, self.backend);
            self.storage
                .set_item_score(item.id, result.overall_score, Some(&result.category))
                .await?;
        }

        Ok(items.len())
    }
}
