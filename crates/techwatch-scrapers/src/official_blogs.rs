//! Official AI-lab blog RSS feeds. Feed URLs come from config (`feeds`:
//! array of `{name, url}`); falls back to a small built-in default list.

use crate::plugin::{ScrapeConfig, ScraperPlugin};
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use techwatch_core::{NormalizedItem, ScoredKeyword};
use techwatch_http::{HttpClientConfig, HttpError, create_client, with_retry};

struct Feed {
    name: String,
    url: String,
}

fn default_feeds() -> Vec<Feed> {
    vec![
        Feed { name: "OpenAI".to_string(), url: "https://openai.com/blog/rss.xml".to_string() },
        Feed { name: "DeepMind".to_string(), url: "https://deepmind.google/blog/rss.xml".to_string() },
    ]
}

fn configured_feeds(config: &ScrapeConfig) -> Vec<Feed> {
    let Some(raw) = config.values.get("feeds").and_then(|v| v.as_array()) else {
        return default_feeds();
    };
    let feeds: Vec<Feed> = raw
        .iter()
        .filter_map(|entry| {
            let name = entry.get("name")?.as_str()?.to_string();
            let url = entry.get("url")?.as_str()?.to_string();
            Some(Feed { name, url })
        })
        .collect();
    if feeds.is_empty() { default_feeds() } else { feeds }
}

pub struct OfficialBlogsPlugin;

impl OfficialBlogsPlugin {
    async fn fetch_feed(client: &reqwest::Client, url: &str) -> Result<feed_rs::model::Feed> {
        let resp = with_retry(3, || async {
            client
                .get(url)
                .send()
                .await
                .map_err(HttpError::from)?
                .error_for_status()
                .map_err(HttpError::from)
        })
        .await?;
        let bytes = resp.bytes().await.map_err(HttpError::from)?;
        feed_rs::parser::parse(&bytes[..]).map_err(|e| crate::PluginError::Parse(e.to_string()))
    }
}

#[async_trait]
impl ScraperPlugin for OfficialBlogsPlugin {
    fn name(&self) -> &'static str {
        "official_blogs"
    }

    fn display_name(&self) -> &'static str {
        "Official AI Blogs"
    }

    async fn scrape(&self, config: &ScrapeConfig, keywords: &[ScoredKeyword]) -> Result<Vec<NormalizedItem>> {
        let feeds = configured_feeds(config);
        let keywords = crate::plugin::keyword_strings(keywords);
        let client = create_client(&HttpClientConfig::default())?;
        let mut items = Vec::new();

        for feed in feeds {
            let parsed = match Self::fetch_feed(&client, &feed.url).await {
                Ok(f) => f,
                Err(e) => {
                    tracing::warn!(feed = %feed.name, error = %e, "failed to fetch official blog feed");
                    continue;
                }
            };

            for entry in parsed.entries {
                let Some(title) = entry.title.map(|t| t.content) else { continue };
                let Some(link) = entry.links.first().map(|l| l.href.clone()) else { continue };
                let summary_text = entry.summary.as_ref().map(|s| s.content.as_str()).unwrap_or("");
                if !keywords.is_empty() {
                    let haystack = format!("{title} {summary_text}").to_lowercase();
                    if !keywords.iter().any(|k| haystack.contains(&k.to_lowercase())) {
                        continue;
                    }
                }

                let mut item = NormalizedItem::new(title, link, "official_blogs");
                item.external_id = entry.id;
                item.content = entry.summary.map(|s| s.content).or_else(|| {
                    entry.content.and_then(|c| c.body)
                });
                item.author = entry.authors.first().map(|a| a.name.clone()).or_else(|| Some(feed.name.clone()));
                item.published_at = entry.published.unwrap_or_else(Utc::now);
                item.tags = vec![feed.name.clone()];
                items.push(item);
            }
        }

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(values: serde_json::Value) -> ScrapeConfig {
        let map: HashMap<String, serde_json::Value> = values.as_object().unwrap().clone().into_iter().collect();
        ScrapeConfig { max_articles: 20, values: map }
    }

    #[test]
    fn configured_feeds_falls_back_to_defaults_when_unset() {
        let config = config_with(serde_json::json!({}));
        let feeds = configured_feeds(&config);
        assert_eq!(feeds.len(), default_feeds().len());
    }

    #[test]
    fn configured_feeds_reads_operator_supplied_list() {
        let config = config_with(serde_json::json!({
            "feeds": [{"name": "Anthropic", "url": "https://www.anthropic.com/rss.xml"}]
        }));
        let feeds = configured_feeds(&config);
        assert_eq!(feeds.len(), 1);
        assert_eq!(feeds[0].name, "Anthropic");
    }

    #[test]
    fn configured_feeds_falls_back_when_entries_are_malformed() {
        let config = config_with(serde_json::json!({ "feeds": [{"name": "Missing URL"}] }));
        let feeds = configured_feeds(&config);
        assert_eq!(feeds.len(), default_feeds().len());
    }
}
