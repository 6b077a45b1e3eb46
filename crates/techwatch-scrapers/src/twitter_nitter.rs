//! Twitter/X via public Nitter RSS mirrors — these instances are unreliable,
//! so the plugin probes a short list and remembers the first one that works
//! for the lifetime of this scrape.

use crate::plugin::{ScrapeConfig, ScraperPlugin};
use crate::{PluginError, Result};
use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tokio::sync::Mutex;
use techwatch_core::{NormalizedItem, ScoredKeyword};
use techwatch_http::{HttpClientConfig, HttpError, create_client, with_retry};

const NITTER_INSTANCES: &[&str] = &[
    "nitter.cz",
    "nitter.privacydev.net",
    "nitter.poast.org",
    "nitter.1d4.us",
    "nitter.kavin.rocks",
];

const DEFAULT_ACCOUNTS: &[&str] = &[
    "github",
    "ThePrimeagen",
    "levelsio",
    "OpenAI",
    "AnthropicAI",
    "rustlang",
    "golang",
    "typescript",
    "nodejs",
    "reactjs",
    "vuejs",
    "docker",
];

static STATUS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/([^/]+)/status/(\d+)").unwrap());
static HASHTAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"#(\w+)").unwrap());

pub struct TwitterNitterPlugin {
    working_instance: Mutex<Option<String>>,
}

impl TwitterNitterPlugin {
    pub fn new() -> Self {
        Self { working_instance: Mutex::new(None) }
    }

    async fn find_working_instance(&self, client: &reqwest::Client) -> Option<String> {
        {
            let cached = self.working_instance.lock().await;
            if let Some(instance) = cached.as_ref() {
                return Some(instance.clone());
            }
        }

        for instance in NITTER_INSTANCES {
            let url = format!("https://{instance}/github/rss");
            let ok = with_retry(1, || async {
                client.get(&url).send().await.map_err(HttpError::from)?.error_for_status().map_err(HttpError::from)
            })
            .await
            .is_ok();

            if ok {
                *self.working_instance.lock().await = Some((*instance).to_string());
                return Some((*instance).to_string());
            }
        }
        None
    }

    fn nitter_to_twitter_url(nitter_url: &str) -> Option<String> {
        if nitter_url.is_empty() {
            return None;
        }
        for instance in NITTER_INSTANCES {
            if let Some(idx) = nitter_url.find(instance) {
                let path = &nitter_url[idx + instance.len()..];
                return Some(format!("https://twitter.com{path}"));
            }
        }
        STATUS_RE.captures(nitter_url).map(|caps| format!("https://twitter.com/{}/status/{}", &caps[1], &caps[2]))
    }

    async fn fetch_feed(client: &reqwest::Client, feed_url: &str) -> Result<feed_rs::model::Feed> {
        let resp = with_retry(2, || async {
            client.get(feed_url).send().await.map_err(HttpError::from)?.error_for_status().map_err(HttpError::from)
        })
        .await?;
        let bytes = resp.bytes().await.map_err(HttpError::from)?;
        feed_rs::parser::parse(&bytes[..]).map_err(|e| PluginError::Parse(e.to_string()))
    }

    fn parse_entry(entry: feed_rs::model::Entry, keywords: &[String], source_tag: &str) -> Option<NormalizedItem> {
        let raw_content = entry
            .title
            .map(|t| t.content)
            .or_else(|| entry.summary.map(|s| s.content))?;
        let text_content = scraper::Html::parse_fragment(&raw_content).root_element().text().collect::<String>();
        if text_content.is_empty() {
            return None;
        }

        let lower = text_content.to_lowercase();
        if !keywords.is_empty() && !keywords.iter().any(|k| lower.contains(&k.to_lowercase())) {
            return None;
        }

        let nitter_url = entry.links.first().map(|l| l.href.clone()).unwrap_or_default();
        let twitter_url = Self::nitter_to_twitter_url(&nitter_url)?;

        let author = entry
            .authors
            .first()
            .map(|a| a.name.clone())
            .or_else(|| STATUS_RE.captures(&nitter_url).map(|c| c[1].to_string()))
            .unwrap_or_else(|| "unknown".to_string());

        let mut tags = vec![source_tag.to_string()];
        for caps in HASHTAG_RE.captures_iter(&text_content).take(4) {
            let tag = caps[1].to_string();
            if !tags.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
                tags.push(tag);
            }
        }
        tags.truncate(5);

        let tweet_id = STATUS_RE.captures(&twitter_url).map(|c| c[2].to_string()).unwrap_or_default();
        let title: String = text_content.chars().take(150).collect();

        let mut item = NormalizedItem::new(format!("@{author}: {title}"), twitter_url, "twitter");
        item.external_id = if tweet_id.is_empty() { nitter_url.clone() } else { tweet_id };
        item.content = Some(text_content);
        item.author = Some(author);
        item.published_at = entry.published.unwrap_or_else(Utc::now);
        item.tags = tags;
        item.raw_data.insert("nitter_url".to_string(), serde_json::json!(nitter_url));
        Some(item)
    }
}

impl Default for TwitterNitterPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScraperPlugin for TwitterNitterPlugin {
    fn name(&self) -> &'static str {
        "twitter"
    }

    fn display_name(&self) -> &'static str {
        "Twitter/X"
    }

    async fn scrape(&self, config: &ScrapeConfig, keywords: &[ScoredKeyword]) -> Result<Vec<NormalizedItem>> {
        let max_articles = config.max_articles;
        let keywords = crate::plugin::keyword_strings(keywords);
        let mut accounts = config.get_str_list("accounts");
        if accounts.is_empty() {
            accounts = DEFAULT_ACCOUNTS.iter().map(|s| s.to_string()).collect();
        }
        let search_queries = config.get_str_list("search_queries");
        let include_replies = config
            .values
            .get("include_replies")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        let client = create_client(&HttpClientConfig::default())?;
        let Some(nitter_base) = self.find_working_instance(&client).await else {
            return Err(PluginError::Parse("no working Nitter instance found among the configured mirrors".to_string()));
        };

        let mut seen = HashSet::new();
        let mut items = Vec::new();
        let suffix = if include_replies { "/with_replies/rss" } else { "/rss" };

        for account in &accounts {
            if items.len() >= max_articles {
                break;
            }
            let feed_url = format!("https://{nitter_base}/{account}{suffix}");
            let feed = match Self::fetch_feed(&client, &feed_url).await {
                Ok(f) => f,
                Err(e) => {
                    tracing::warn!(account, error = %e, "failed to fetch Nitter feed");
                    continue;
                }
            };
            for entry in feed.entries.into_iter().take(20) {
                if let Some(item) = Self::parse_entry(entry, &keywords, account)
                    && seen.insert(item.url.clone())
                {
                    items.push(item);
                }
            }
        }

        for query in &search_queries {
            if items.len() >= max_articles {
                break;
            }
            let encoded = query.replace(' ', "+");
            let feed_url = format!("https://{nitter_base}/search/rss?f=tweets&q={encoded}");
            let source_tag = format!("search:{query}");
            let feed = match Self::fetch_feed(&client, &feed_url).await {
                Ok(f) => f,
                Err(e) => {
                    tracing::warn!(query, error = %e, "failed to fetch Nitter search feed");
                    continue;
                }
            };
            for entry in feed.entries.into_iter().take(20) {
                if let Some(item) = Self::parse_entry(entry, &keywords, &source_tag)
                    && seen.insert(item.url.clone())
                {
                    items.push(item);
                }
            }
        }

        items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        items.truncate(max_articles);
        Ok(items)
    }
}
