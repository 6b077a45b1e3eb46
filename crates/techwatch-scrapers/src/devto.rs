//! Dev.to via the public Forem REST API. No auth; tag search doubles as the
//! keyword mechanism when keywords are supplied, otherwise latest articles.

use crate::plugin::{ScrapeConfig, ScraperPlugin};
use crate::{PluginError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use techwatch_core::{NormalizedItem, ScoredKeyword};
use techwatch_http::{HttpClientConfig, HttpError, RateLimiter, create_client, with_retry};

const BASE_URL: &str = "https://dev.to/api";

#[derive(Deserialize)]
struct DevToUser {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    username: Option<String>,
}

#[derive(Deserialize)]
struct DevToArticle {
    id: i64,
    title: String,
    url: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    user: Option<DevToUser>,
    #[serde(default)]
    tag_list: Vec<String>,
    #[serde(default)]
    positive_reactions_count: i64,
    #[serde(default)]
    comments_count: i64,
}

impl DevToArticle {
    fn into_item(self) -> NormalizedItem {
        let published_at = self
            .published_at
            .or(self.created_at)
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        let author = self
            .user
            .and_then(|u| u.name.or(u.username))
            .unwrap_or_else(|| "unknown".to_string());

        let mut item = NormalizedItem::new(self.title, self.url, "devto");
        item.external_id = self.id.to_string();
        item.content = self.description;
        item.author = Some(author);
        item.published_at = published_at;
        item.tags = self.tag_list;
        item.upvotes = self.positive_reactions_count;
        item.comments_count = self.comments_count;
        item
    }
}

pub struct DevToPlugin;

impl DevToPlugin {
    async fn fetch(client: &reqwest::Client, tag: Option<&str>, per_page: usize) -> Result<Vec<DevToArticle>> {
        let per_page = per_page.to_string();
        let tag = tag.map(|t| t.to_lowercase().replace(' ', ""));

        let resp = with_retry(3, || async {
            let mut req = client.get(format!("{BASE_URL}/articles")).query(&[
                ("per_page", per_page.as_str()),
                ("state", "fresh"),
            ]);
            if let Some(tag) = &tag {
                req = req.query(&[("tag", tag.as_str())]);
            }
            req.send()
                .await
                .map_err(HttpError::from)?
                .error_for_status()
                .map_err(HttpError::from)
        })
        .await?;

        resp.json::<Vec<DevToArticle>>().await.map_err(|e| PluginError::Parse(e.to_string()))
    }
}

#[async_trait]
impl ScraperPlugin for DevToPlugin {
    fn name(&self) -> &'static str {
        "devto"
    }

    fn display_name(&self) -> &'static str {
        "Dev.to"
    }

    async fn scrape(&self, config: &ScrapeConfig, keywords: &[ScoredKeyword]) -> Result<Vec<NormalizedItem>> {
        let max_articles = config.max_articles;
        let per_page = max_articles.min(100);
        let client = create_client(&HttpClientConfig::default())?;
        let limiter = RateLimiter::new(20);

        let mut articles = Vec::new();

        if keywords.is_empty() {
            limiter.acquire().await;
            articles.extend(Self::fetch(&client, None, per_page).await?);
        } else {
            for keyword in keywords.iter().map(|k| &k.keyword).take(5) {
                if articles.len() >= max_articles {
                    break;
                }
                limiter.acquire().await;
                match Self::fetch(&client, Some(keyword), per_page).await {
                    Ok(fetched) => articles.extend(fetched),
                    Err(e) => {
                        tracing::warn!(keyword, error = %e, "failed to fetch Dev.to articles for tag");
                        continue;
                    }
                }
            }
        }

        let mut seen = HashSet::new();
        let items: Vec<NormalizedItem> = articles
            .into_iter()
            .map(DevToArticle::into_item)
            .filter(|item| seen.insert(item.url.clone()))
            .take(max_articles)
            .collect();

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_article() -> DevToArticle {
        DevToArticle {
            id: 42,
            title: "Async Rust in Practice".to_string(),
            url: "https://dev.to/example/async-rust".to_string(),
            description: Some("a tour of tokio".to_string()),
            published_at: Some("2025-07-01T10:00:00Z".to_string()),
            created_at: None,
            user: Some(DevToUser { name: Some("Jane Dev".to_string()), username: Some("janedev".to_string()) }),
            tag_list: vec!["rust".to_string(), "async".to_string()],
            positive_reactions_count: 12,
            comments_count: 3,
        }
    }

    #[test]
    fn into_item_maps_fields_and_prefers_published_over_created() {
        let item = sample_article().into_item();
        assert_eq!(item.title, "Async Rust in Practice");
        assert_eq!(item.external_id, "42");
        assert_eq!(item.author.as_deref(), Some("Jane Dev"));
        assert_eq!(item.tags, vec!["rust".to_string(), "async".to_string()]);
        assert_eq!(item.upvotes, 12);
        assert_eq!(item.comments_count, 3);
    }

    #[test]
    fn into_item_falls_back_to_username_when_name_absent() {
        let mut article = sample_article();
        article.user = Some(DevToUser { name: None, username: Some("janedev".to_string()) });
        let item = article.into_item();
        assert_eq!(item.author.as_deref(), Some("janedev"));
    }

    #[test]
    fn into_item_falls_back_to_created_at_when_published_at_missing() {
        let mut article = sample_article();
        article.published_at = None;
        article.created_at = Some("2025-01-01T00:00:00Z".to_string());
        let item = article.into_item();
        assert_eq!(item.published_at.to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }
}
