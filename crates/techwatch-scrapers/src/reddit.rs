//! Reddit via OAuth2 client-credentials, scoped to a configurable set of
//! subreddits. Requires `client_id` and `client_secret` in plugin config.

use crate::plugin::{ScrapeConfig, ScraperPlugin};
use crate::{PluginError, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use tokio::sync::Mutex;
use techwatch_core::{NormalizedItem, ScoredKeyword};
use techwatch_http::{HttpClientConfig, HttpError, RateLimiter, create_client, with_retry};

const DEFAULT_SUBREDDITS: &[&str] = &["programming", "technology", "python"];
const USER_AGENT: &str = "techwatch/1.0 (ingestion bot)";

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Deserialize)]
struct Child {
    data: Post,
}

#[derive(Deserialize)]
struct Post {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    created_utc: f64,
    #[serde(default)]
    ups: i64,
    #[serde(default)]
    num_comments: i64,
    #[serde(default)]
    link_flair_text: Option<String>,
}

struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

pub struct RedditPlugin {
    token: Mutex<Option<CachedToken>>,
}

impl RedditPlugin {
    pub fn new() -> Self {
        Self { token: Mutex::new(None) }
    }

    async fn access_token(&self, client: &reqwest::Client, client_id: &str, client_secret: &str) -> Result<String> {
        {
            let cached = self.token.lock().await;
            if let Some(t) = cached.as_ref()
                && Utc::now() < t.expires_at
            {
                return Ok(t.token.clone());
            }
        }

        let resp = with_retry(3, || async {
            client
                .post("https://www.reddit.com/api/v1/access_token")
                .basic_auth(client_id, Some(client_secret))
                .header("User-Agent", USER_AGENT)
                .form(&[("grant_type", "client_credentials")])
                .send()
                .await
                .map_err(HttpError::from)?
                .error_for_status()
                .map_err(HttpError::from)
        })
        .await?;

        let parsed: TokenResponse = resp.json().await.map_err(|e| PluginError::Parse(e.to_string()))?;
        let mut cached = self.token.lock().await;
        *cached = Some(CachedToken {
            token: parsed.access_token.clone(),
            expires_at: Utc::now() + chrono::Duration::minutes(55),
        });
        Ok(parsed.access_token)
    }

    async fn fetch_subreddit(
        client: &reqwest::Client,
        subreddit: &str,
        token: &str,
        keywords: &[String],
        limit: usize,
    ) -> Result<Vec<NormalizedItem>> {
        let limit = limit.min(50).to_string();
        let resp = with_retry(3, || async {
            client
                .get(format!("https://oauth.reddit.com/r/{subreddit}/hot"))
                .bearer_auth(token)
                .header("User-Agent", USER_AGENT)
                .query(&[("limit", limit.as_str())])
                .send()
                .await
                .map_err(HttpError::from)?
                .error_for_status()
                .map_err(HttpError::from)
        })
        .await?;

        let listing: Listing = resp.json().await.map_err(|e| PluginError::Parse(e.to_string()))?;

        let mut items = Vec::new();
        for child in listing.data.children {
            let post = child.data;
            let haystack = format!("{} {}", post.title, post.selftext).to_lowercase();
            if !keywords.is_empty() && !keywords.iter().any(|k| haystack.contains(&k.to_lowercase())) {
                continue;
            }

            let mut tags = vec![subreddit.to_string()];
            if let Some(flair) = post.link_flair_text {
                tags.push(flair);
            }

            let url = if post.url.is_empty() {
                format!("https://reddit.com/comments/{}", post.id)
            } else {
                post.url
            };

            let mut item = NormalizedItem::new(post.title, url, "reddit");
            item.external_id = post.id;
            item.content = if post.selftext.is_empty() { None } else { Some(post.selftext) };
            item.author = Some(post.author.unwrap_or_else(|| "unknown".to_string()));
            item.published_at = Utc.timestamp_opt(post.created_utc as i64, 0).single().unwrap_or_else(Utc::now);
            item.tags = tags;
            item.upvotes = post.ups;
            item.comments_count = post.num_comments;
            items.push(item);
        }

        Ok(items)
    }
}

impl Default for RedditPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScraperPlugin for RedditPlugin {
    fn name(&self) -> &'static str {
        "reddit"
    }

    fn display_name(&self) -> &'static str {
        "Reddit"
    }

    fn required_config(&self) -> &'static [&'static str] {
        &["client_id", "client_secret"]
    }

    async fn scrape(&self, config: &ScrapeConfig, keywords: &[ScoredKeyword]) -> Result<Vec<NormalizedItem>> {
        let keywords = crate::plugin::keyword_strings(keywords);
        let Some(client_id) = config.get_str("client_id") else {
            return Err(PluginError::Config("reddit requires `client_id`".to_string()));
        };
        let Some(client_secret) = config.get_str("client_secret") else {
            return Err(PluginError::Config("reddit requires `client_secret`".to_string()));
        };

        let mut subreddits = config.get_str_list("subreddits");
        if subreddits.is_empty() {
            subreddits = DEFAULT_SUBREDDITS.iter().map(|s| s.to_string()).collect();
        }
        let max_articles = config.max_articles;

        let client = create_client(&HttpClientConfig::default())?;
        let limiter = RateLimiter::new(60);

        limiter.acquire().await;
        let token = self.access_token(&client, client_id, client_secret).await?;

        let mut articles = Vec::new();
        for subreddit in &subreddits {
            if articles.len() >= max_articles {
                break;
            }
            limiter.acquire().await;
            match Self::fetch_subreddit(&client, subreddit, &token, &keywords, max_articles).await {
                Ok(fetched) => articles.extend(fetched),
                Err(e) => {
                    tracing::warn!(subreddit, error = %e, "failed to fetch subreddit");
                    continue;
                }
            }
        }

        let mut seen = HashSet::new();
        let items: Vec<NormalizedItem> = articles.into_iter().filter(|item| seen.insert(item.url.clone())).take(max_articles).collect();

        Ok(items)
    }
}
