//! The scraper plugin contract and the cache-wrapping default
//! method every plugin gets for free.

use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use techwatch_core::{NormalizedItem, ScoredKeyword};
use techwatch_http::cache::ResultCache;

/// Plugin-specific configuration plus the universal `max_articles` cap.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub max_articles: usize,
    pub values: HashMap<String, serde_json::Value>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            max_articles: 30,
            values: HashMap::new(),
        }
    }
}

impl ScrapeConfig {
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|v| v.as_str())
    }

    pub fn get_str_list(&self, key: &str) -> Vec<String> {
        self.values
            .get(key)
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
            .unwrap_or_default()
    }

    /// Sorted `key=value` pairs for cache key hashing.
    pub fn cache_fingerprint(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect();
        pairs.sort();
        pairs
    }
}

/// Bare keyword text from a weighted keyword set, for plugins/helpers that
/// only need substring matching and never the weight itself.
pub fn keyword_strings(keywords: &[ScoredKeyword]) -> Vec<String> {
    keywords.iter().map(|k| k.keyword.clone()).collect()
}

/// Quick title pre-filter shared by every plugin: empty keyword list accepts
/// everything, otherwise case-insensitive substring match.
pub fn title_matches_keywords(title: &str, keywords: &[ScoredKeyword]) -> bool {
    if keywords.is_empty() {
        return true;
    }
    let lower = title.to_lowercase();
    keywords.iter().any(|k| lower.contains(&k.keyword.to_lowercase()))
}

#[async_trait]
pub trait ScraperPlugin: Send + Sync {
    fn name(&self) -> &'static str;
    fn display_name(&self) -> &'static str;
    fn version(&self) -> &'static str {
        "1.0.0"
    }
    fn required_config(&self) -> &'static [&'static str] {
        &[]
    }

    fn validate_config(&self, config: &ScrapeConfig) -> bool {
        self.required_config()
            .iter()
            .all(|key| config.values.contains_key(*key))
    }

    /// Best-effort: individual item failures are absorbed; only a total
    /// source failure returns `Err`. `keywords` carries each keyword's
    /// weight/category, not just its text, so plugins whose relevance
    /// formula is weight-sensitive (e.g. `youtube_trending`) can compute it
    /// faithfully rather than falling back to a match-count proxy.
    async fn scrape(&self, config: &ScrapeConfig, keywords: &[ScoredKeyword]) -> Result<Vec<NormalizedItem>>;

    /// Cache-consulting wrapper.
    async fn scrape_with_cache(
        &self,
        config: &ScrapeConfig,
        keywords: &[ScoredKeyword],
        cache: Option<&ResultCache>,
    ) -> Result<Vec<NormalizedItem>> {
        let Some(cache) = cache else {
            return self.scrape(config, keywords).await;
        };

        let key = ResultCache::key(self.name(), &keyword_strings(keywords), &config.cache_fingerprint());
        if let Some(cached) = cache.get::<Vec<NormalizedItem>>(&key).await {
            return Ok(cached);
        }

        let items = self.scrape(config, keywords).await?;
        cache.set(&key, &items).await;
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw(keyword: &str) -> ScoredKeyword {
        ScoredKeyword {
            keyword: keyword.to_string(),
            weight: 1.0,
            category: "other".to_string(),
        }
    }

    #[test]
    fn empty_keywords_accepts_everything() {
        assert!(title_matches_keywords("anything", &[]));
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        let keywords = vec![kw("Rust")];
        assert!(title_matches_keywords("Learning rust in a week", &keywords));
        assert!(!title_matches_keywords("Learning cobol", &keywords));
    }

    #[test]
    fn cache_fingerprint_is_sorted() {
        let mut config = ScrapeConfig::default();
        config.values.insert("b".to_string(), serde_json::json!(2));
        config.values.insert("a".to_string(), serde_json::json!(1));
        let fp = config.cache_fingerprint();
        assert_eq!(fp[0].0, "a");
        assert_eq!(fp[1].0, "b");
    }

    #[test]
    fn keyword_strings_extracts_bare_text() {
        let keywords = vec![kw("rust"), kw("llm")];
        assert_eq!(keyword_strings(&keywords), vec!["rust".to_string(), "llm".to_string()]);
    }
}
