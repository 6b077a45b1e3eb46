//! Trend detector (C11): daily keyword frequency × weight × average score.
//!
//! The original matches keyword substrings against titles only, which is
//! known to over-count generic keywords ("python" inside "pythonic"). Per
//! the spec's optional upgrade, this implementation uses word-boundary
//! regex matching while preserving the daily upsert semantics.

use crate::Result;
use chrono::{Duration, NaiveDate, Utc};
use regex::Regex;
use techwatch_core::Item;
use techwatch_storage::Storage;

const LOOKBACK_DAYS: i64 = 7;
const DEFAULT_DAYS_TO_KEEP: i64 = 90;

/// `count · weight · avg_score / 10`.
pub fn trend_score(article_count: i64, weight: f64, avg_score: f64) -> f64 {
    article_count as f64 * weight * avg_score / 10.0
}

/// Word-boundary, case-insensitive match of `keyword` in `title`.
pub fn title_matches_keyword(title: &str, keyword: &str) -> bool {
    let pattern = format!(r"(?i)\b{}\b", regex::escape(keyword));
    Regex::new(&pattern).is_ok_and(|re| re.is_match(title))
}

#[derive(Debug, Clone, Default)]
pub struct TrendDetectionStats {
    pub keywords_analyzed: usize,
    pub trends_upserted: usize,
}

/// Storage-backed daily aggregation over active keywords.
pub struct TrendDetector<'a> {
    storage: &'a Storage,
}

impl<'a> TrendDetector<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Aggregate today's trend for every active keyword over the last
    /// `LOOKBACK_DAYS`, upserting `Trend(keyword, date)`.
    pub async fn detect_trends(&self) -> Result<TrendDetectionStats> {
        let keywords = self.storage.active_keywords().await?;
        let since = Utc::now() - Duration::days(LOOKBACK_DAYS);
        let items = self.storage.items_published_since(since).await?;
        let today = Utc::now().date_naive();

        let mut stats = TrendDetectionStats {
            keywords_analyzed: keywords.len(),
            trends_upserted: 0,
        };

        for keyword in &keywords {
            let matching: Vec<&Item> = items
                .iter()
                .filter(|item| title_matches_keyword(&item.title, &keyword.keyword))
                .collect();

            if matching.is_empty() {
                continue;
            }

            let article_count = matching.len() as i64;
            let avg_score = matching.iter().map(|item| item.score.unwrap_or(0.0)).sum::<f64>() / article_count as f64;
            let score = trend_score(article_count, keyword.weight, avg_score);

            self.storage
                .upsert_trend(&keyword.keyword, &keyword.category, today, score, article_count)
                .await?;
            stats.trends_upserted += 1;
        }

        Ok(stats)
    }

    /// Drop trends older than `days_to_keep` (default 90) — the weekly
    /// cleanup job.
    pub async fn cleanup(&self, days_to_keep: Option<i64>) -> Result<u64> {
        let days = days_to_keep.unwrap_or(DEFAULT_DAYS_TO_KEEP);
        let cutoff: NaiveDate = Utc::now().date_naive() - Duration::days(days);
        Ok(self.storage.delete_trends_older_than(cutoff).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_score_matches_the_spec_formula() {
        // 5 items, keyword weight 5, mean score 60 -> 150.
        assert_eq!(trend_score(5, 5.0, 60.0), 150.0);
    }

    #[test]
    fn word_boundary_match_excludes_substrings() {
        assert!(title_matches_keyword("Learning Python this week", "python"));
        assert!(!title_matches_keyword("A pythonic approach to typing", "python"));
    }

    #[test]
    fn word_boundary_match_is_case_insensitive() {
        assert!(title_matches_keyword("RUST in production", "rust"));
    }
}
