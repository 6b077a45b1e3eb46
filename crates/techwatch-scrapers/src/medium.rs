//! Medium via public per-tag RSS feeds — no API key, no auth.

use crate::plugin::{ScrapeConfig, ScraperPlugin};
use crate::{PluginError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use techwatch_core::{NormalizedItem, ScoredKeyword};
use techwatch_http::{HttpClientConfig, HttpError, create_client, with_retry};

const DEFAULT_TAGS: &[&str] = &[
    "programming",
    "software-engineering",
    "artificial-intelligence",
    "machine-learning",
    "python",
    "javascript",
    "rust",
    "devops",
    "kubernetes",
    "web-development",
];

pub struct MediumPlugin;

impl MediumPlugin {
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
        feed_rs::parser::parse(&bytes[..]).map_err(|e| PluginError::Parse(e.to_string()))
    }

    fn strip_html(raw: &str) -> String {
        let fragment = scraper::Html::parse_fragment(raw);
        fragment.root_element().text().collect::<String>()
    }

    async fn scrape_feed(
        client: &reqwest::Client,
        feed_url: &str,
        keywords: &[String],
        source_tag: &str,
    ) -> Vec<NormalizedItem> {
        let parsed = match Self::fetch_feed(client, feed_url).await {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(feed_url, error = %e, "failed to fetch Medium feed");
                return Vec::new();
            }
        };

        let mut items = Vec::new();
        for entry in parsed.entries {
            let Some(title) = entry.title.map(|t| t.content) else { continue };
            let Some(link) = entry.links.first().map(|l| l.href.clone()) else { continue };
            let url = link.split('?').next().unwrap_or(&link).to_string();

            let raw_content = entry
                .content
                .and_then(|c| c.body)
                .or_else(|| entry.summary.map(|s| s.content))
                .unwrap_or_default();
            let text_content = Self::strip_html(&raw_content);

            let haystack = format!("{title} {text_content}").to_lowercase();
            if !keywords.is_empty() && !keywords.iter().any(|k| haystack.contains(&k.to_lowercase())) {
                continue;
            }

            let author = entry.authors.first().map(|a| a.name.clone()).unwrap_or_else(|| "unknown".to_string());

            let mut tags = vec![source_tag.to_string()];
            for category in entry.categories.iter().take(5) {
                if !tags.iter().any(|t| t.eq_ignore_ascii_case(&category.term)) {
                    tags.push(category.term.clone());
                }
            }
            tags.truncate(5);

            let word_count = text_content.split_whitespace().count();
            let read_time_minutes = (word_count / 200).max(1) as i64;

            let mut item = NormalizedItem::new(title, url.clone(), "medium");
            item.external_id = url.rsplit('/').next().and_then(|s| s.rsplit('-').next()).unwrap_or_default().to_string();
            item.content = Some(text_content.chars().take(5000).collect());
            item.author = Some(author);
            item.published_at = entry.published.unwrap_or_else(Utc::now);
            item.tags = tags;
            item.raw_data.insert("read_time_minutes".to_string(), serde_json::json!(read_time_minutes));
            item.raw_data.insert("source_tag".to_string(), serde_json::json!(source_tag));
            items.push(item);
        }
        items
    }
}

#[async_trait]
impl ScraperPlugin for MediumPlugin {
    fn name(&self) -> &'static str {
        "medium"
    }

    fn display_name(&self) -> &'static str {
        "Medium"
    }

    async fn scrape(&self, config: &ScrapeConfig, keywords: &[ScoredKeyword]) -> Result<Vec<NormalizedItem>> {
        let max_articles = config.max_articles;
        let mut tags = config.get_str_list("tags");
        if tags.is_empty() {
            tags = DEFAULT_TAGS.iter().map(|t| t.to_string()).collect();
        }
        let publications = config.get_str_list("publications");
        let users = config.get_str_list("users");
        let keywords = crate::plugin::keyword_strings(keywords);

        let client = create_client(&HttpClientConfig::default())?;
        let mut seen = HashSet::new();
        let mut items = Vec::new();

        for tag in &tags {
            if items.len() >= max_articles {
                break;
            }
            let url = format!("https://medium.com/feed/tag/{tag}");
            for item in Self::scrape_feed(&client, &url, &keywords, tag).await {
                if seen.insert(item.url.clone()) {
                    items.push(item);
                }
            }
        }
        for pub_name in &publications {
            if items.len() >= max_articles {
                break;
            }
            let url = format!("https://medium.com/feed/{pub_name}");
            for item in Self::scrape_feed(&client, &url, &keywords, pub_name).await {
                if seen.insert(item.url.clone()) {
                    items.push(item);
                }
            }
        }
        for user in &users {
            if items.len() >= max_articles {
                break;
            }
            let url = format!("https://medium.com/feed/@{user}");
            let source_tag = format!("@{user}");
            for item in Self::scrape_feed(&client, &url, &keywords, &source_tag).await {
                if seen.insert(item.url.clone()) {
                    items.push(item);
                }
            }
        }

        items.truncate(max_articles);
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_html_removes_tags_and_keeps_text() {
        let stripped = MediumPlugin::strip_html("<p>Hello <b>world</b></p>");
        assert_eq!(stripped, "Hello world");
    }

    #[test]
    fn strip_html_on_plain_text_is_unchanged() {
        assert_eq!(MediumPlugin::strip_html("just text"), "just text");
    }
}
