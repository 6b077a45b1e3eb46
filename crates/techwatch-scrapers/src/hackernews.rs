//! HackerNews via the public Firebase-backed item API. No auth, no config.

use crate::plugin::{ScrapeConfig, ScraperPlugin, title_matches_keywords};
use crate::{PluginError, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use techwatch_core::{NormalizedItem, ScoredKeyword};
use techwatch_http::{RateLimiter, create_client, with_retry, HttpClientConfig, HttpError};

const BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";

#[derive(Deserialize)]
struct Story {
    #[serde(rename = "type")]
    item_type: Option<String>,
    #[serde(default)]
    deleted: bool,
    title: Option<String>,
    url: Option<String>,
    time: i64,
    #[serde(default)]
    by: Option<String>,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    descendants: i64,
}

pub struct HackerNewsPlugin;

impl HackerNewsPlugin {
    async fn top_story_ids(client: &reqwest::Client) -> Result<Vec<i64>> {
        let resp = with_retry(3, || async {
            client
                .get(format!("{BASE_URL}/topstories.json"))
                .send()
                .await
                .map_err(HttpError::from)?
                .error_for_status()
                .map_err(HttpError::from)
        })
        .await?;
        resp.json::<Vec<i64>>().await.map_err(|e| PluginError::Parse(e.to_string()))
    }

    async fn fetch_story(client: &reqwest::Client, id: i64) -> Result<Option<Story>> {
        let resp = with_retry(3, || async {
            client
                .get(format!("{BASE_URL}/item/{id}.json"))
                .send()
                .await
                .map_err(HttpError::from)?
                .error_for_status()
                .map_err(HttpError::from)
        })
        .await?;
        resp.json::<Option<Story>>().await.map_err(|e| PluginError::Parse(e.to_string()))
    }
}

#[async_trait]
impl ScraperPlugin for HackerNewsPlugin {
    fn name(&self) -> &'static str {
        "hackernews"
    }

    fn display_name(&self) -> &'static str {
        "HackerNews"
    }

    async fn scrape(&self, config: &ScrapeConfig, keywords: &[ScoredKeyword]) -> Result<Vec<NormalizedItem>> {
        let limit = config.max_articles;
        let client = create_client(&HttpClientConfig::default())?;
        let limiter = RateLimiter::new(120);

        limiter.acquire().await;
        let story_ids = Self::top_story_ids(&client).await?;

        let mut items = Vec::with_capacity(limit);
        for story_id in story_ids.into_iter().take(limit * 2) {
            if items.len() >= limit {
                break;
            }

            limiter.acquire().await;
            let story = match Self::fetch_story(&client, story_id).await {
                Ok(Some(s)) => s,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(story_id, error = %e, "failed to fetch HackerNews story, skipping");
                    continue;
                }
            };

            if story.deleted || story.item_type.as_deref().is_some_and(|t| t != "story") {
                continue;
            }

            let Some(title) = story.title else { continue };
            if !title_matches_keywords(&title, keywords) {
                continue;
            }

            let mut item = NormalizedItem::new(
                title,
                story.url.unwrap_or_else(|| format!("https://news.ycombinator.com/item?id={story_id}")),
                "hackernews",
            );
            item.external_id = story_id.to_string();
            item.published_at = Utc.timestamp_opt(story.time, 0).single().unwrap_or_else(Utc::now);
            item.author = story.by;
            item.upvotes = story.score;
            item.comments_count = story.descendants;
            item.tags = vec!["hackernews".to_string()];
            items.push(item);
        }

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn story_deserializes_and_defaults_missing_fields() {
        let raw = r#"{"type": "story", "title": "Show HN: a thing", "time": 1700000000, "score": 42}"#;
        let story: Story = serde_json::from_str(raw).unwrap();
        assert_eq!(story.title.as_deref(), Some("Show HN: a thing"));
        assert_eq!(story.score, 42);
        assert!(!story.deleted);
        assert_eq!(story.descendants, 0);
    }

    #[test]
    fn story_deserializes_null_item_as_none() {
        let story: Option<Story> = serde_json::from_str("null").unwrap();
        assert!(story.is_none());
    }
}
