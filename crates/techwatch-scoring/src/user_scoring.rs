//! Per-user scoring service (C10): personalized relevance over a user's own
//! keyword set, blended with the item's global score.

use crate::Result;
use techwatch_core::{Item, UserKeyword};
use techwatch_storage::Storage;

/// Personalized score plus the number of user keywords that matched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersonalizedScore {
    pub score: f64,
    pub matches: i32,
}

/// Score a single item for a user who has at least one active keyword.
/// Falls back to the global score untouched when the user has none.
pub fn score_item_for_user(item: &Item, user_keywords: &[UserKeyword]) -> PersonalizedScore {
    let global_score = item.score.unwrap_or(0.0);
    if user_keywords.is_empty() {
        return PersonalizedScore {
            score: global_score,
            matches: 0,
        };
    }

    let title_lower = item.title.to_lowercase();
    let tags_lower = item.tags.join(" ").to_lowercase();
    let full_text = format!(
        "{} {} {} {}",
        title_lower,
        item.content.as_deref().unwrap_or("").to_lowercase(),
        item.summary.as_deref().unwrap_or("").to_lowercase(),
        tags_lower,
    );

    let mut total_score = 0.0;
    let mut total_weight = 0.0;
    let mut matches = 0;

    for kw in user_keywords {
        let keyword_lower = kw.keyword.to_lowercase();
        total_weight += kw.weight;

        if !full_text.contains(&keyword_lower) {
            continue;
        }

        let boost = if title_lower.contains(&keyword_lower) {
            2.0
        } else if tags_lower.contains(&keyword_lower) {
            1.5
        } else {
            1.0
        };
        total_score += kw.weight * boost * 20.0;
        matches += 1;
    }

    if matches == 0 {
        return PersonalizedScore {
            score: (global_score * 0.3).max(0.0),
            matches: 0,
        };
    }

    let match_bonus = (matches as f64 * 5.0).min(25.0);
    let raw = (total_score / total_weight) + match_bonus;
    let final_score = (raw * 0.8) + (global_score * 0.2);

    PersonalizedScore {
        score: final_score.clamp(0.0, 100.0),
        matches,
    }
}

/// Storage-backed orchestration of [`score_item_for_user`] — the batch
/// `score_for_user`/`rescore_user` operations the spec describes as a
/// stateful service rather than a pure function.
pub struct PersonalizedScoringService<'a> {
    storage: &'a Storage,
}

impl<'a> PersonalizedScoringService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Score `item_ids` (or, when `None`, the user's unscored items newest
    /// first bounded by `limit`) and upsert the results. Returns the count
    /// scored.
    pub async fn score_for_user(&self, user_id: i64, item_ids: Option<Vec<i64>>, limit: i64) -> Result<usize> {
        let user_keywords = self.storage.active_user_keywords(user_id).await?;

        let items = match item_ids {
            Some(ids) => self.storage.items_by_ids(&ids).await?,
            None => self.storage.items_unscored_for_user(user_id, limit).await?,
        };

        for item in &items {
            let result = score_item_for_user(item, &user_keywords);
            self.storage
                .upsert_user_item_score(user_id, item.id, result.score, result.matches)
                .await?;
        }

        Ok(items.len())
    }

    /// Wipe a user's scores and recompute over the most recent `limit` items
    /// (typically 1000) — called after the user's keyword set changes.
    pub async fn rescore_user(&self, user_id: i64, limit: i64) -> Result<usize> {
        self.storage.delete_user_item_scores(user_id).await?;
        let user_keywords = self.storage.active_user_keywords(user_id).await?;
        let items = self.storage.recent_items(limit).await?;

        for item in &items {
            let result = score_item_for_user(item, &user_keywords);
            self.storage
                .upsert_user_item_score(user_id, item.id, result.score, result.matches)
                .await?;
        }

        Ok(items.len())
    }
}
