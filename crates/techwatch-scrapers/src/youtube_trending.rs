//! YouTube trending videos via the Data API v3 `videos?chart=mostPopular`
//! endpoint. Quota-aware: each call costs 1 unit against the shared daily
//! budget tracked by [`techwatch_http::quota::YouTubeQuotaManager`].

use crate::plugin::{ScrapeConfig, ScraperPlugin};
use crate::{PluginError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use techwatch_core::{NormalizedItem, ScoredKeyword, VideoAttrs};
use techwatch_http::quota::{YouTubeQuotaGate, YouTubeQuotaManager};
use techwatch_http::{HttpClientConfig, HttpError, create_client, with_retry};

const API_URL: &str = "https://www.googleapis.com/youtube/v3/videos";
const DEFAULT_CATEGORY_IDS: &[&str] = &["28", "27"];

#[derive(Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoResource>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoResource {
    id: String,
    snippet: Snippet,
    #[serde(default)]
    statistics: Statistics,
    #[serde(default)]
    content_details: ContentDetails,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    channel_id: String,
    #[serde(default)]
    channel_title: String,
    published_at: String,
    #[serde(default)]
    thumbnails: Thumbnails,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Deserialize, Default)]
struct Thumbnails {
    #[serde(default)]
    high: Option<Thumbnail>,
}

#[derive(Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    #[serde(default, deserialize_with = "parse_numeric_string")]
    view_count: Option<i64>,
    #[serde(default, deserialize_with = "parse_numeric_string")]
    like_count: Option<i64>,
    #[serde(default, deserialize_with = "parse_numeric_string")]
    comment_count: Option<i64>,
}

#[derive(Deserialize, Default)]
struct ContentDetails {
    #[serde(default)]
    duration: Option<String>,
}

fn parse_numeric_string<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

/// Parses an ISO-8601 duration like `PT4M13S` into whole seconds.
fn parse_iso8601_duration(s: &str) -> Option<i64> {
    let rest = s.strip_prefix("PT")?;
    let mut seconds = 0i64;
    let mut number = String::new();
    for c in rest.chars() {
        if c.is_ascii_digit() {
            number.push(c);
        } else {
            let value: i64 = number.parse().ok()?;
            number.clear();
            seconds += match c {
                'H' => value * 3600,
                'M' => value * 60,
                'S' => value,
                _ => 0,
            };
        }
    }
    Some(seconds)
}

/// Σ weight_i over keywords matched in `haystack` (case-insensitive
/// substring), plus the number of distinct keywords matched.
fn relevance_and_match_count(haystack: &str, keywords: &[ScoredKeyword]) -> (f64, usize) {
    let lower = haystack.to_lowercase();
    let matched: Vec<&ScoredKeyword> = keywords.iter().filter(|k| lower.contains(&k.keyword.to_lowercase())).collect();
    let relevance = matched.iter().map(|k| k.weight).sum();
    (relevance, matched.len())
}

pub struct YouTubeTrendingPlugin;

impl YouTubeTrendingPlugin {
    async fn fetch(client: &reqwest::Client, api_key: &str, category_id: &str, max_results: usize) -> Result<VideosResponse> {
        let max_results = max_results.min(50).to_string();
        let resp = with_retry(2, || async {
            client
                .get(API_URL)
                .query(&[
                    ("part", "snippet,statistics,contentDetails"),
                    ("chart", "mostPopular"),
                    ("videoCategoryId", category_id),
                    ("maxResults", max_results.as_str()),
                    ("key", api_key),
                ])
                .send()
                .await
                .map_err(HttpError::from)?
                .error_for_status()
                .map_err(HttpError::from)
        })
        .await?;
        resp.json().await.map_err(|e| PluginError::Parse(e.to_string()))
    }

    /// The actual scrape logic, parameterized over the quota gate so it can
    /// be driven by [`techwatch_http::quota::FakeQuotaGate`] in tests instead
    /// of a live Redis-backed [`YouTubeQuotaManager`].
    async fn scrape_with_quota_gate(
        &self,
        config: &ScrapeConfig,
        keywords: &[ScoredKeyword],
        quota: Option<&dyn YouTubeQuotaGate>,
    ) -> Result<Vec<NormalizedItem>> {
        let Some(api_key) = config.get_str("api_key") else {
            return Err(PluginError::Config("youtube_trending requires `api_key`".to_string()));
        };

        if let Some(quota) = quota
            && !quota.check_quota().await
        {
            tracing::warn!("YouTube API quota exhausted, skipping trending scrape");
            return Ok(Vec::new());
        }

        let mut category_ids = config.get_str_list("category_ids");
        if category_ids.is_empty() {
            category_ids = DEFAULT_CATEGORY_IDS.iter().map(|s| s.to_string()).collect();
        }
        let max_articles = config.max_articles;
        let include_shorts = config.values.get("include_shorts").and_then(|v| v.as_bool()).unwrap_or(true);
        let min_view_count = config.values.get("min_view_count").and_then(|v| v.as_i64()).unwrap_or(0);
        let min_keyword_matches = config.values.get("min_keyword_matches").and_then(|v| v.as_u64()).unwrap_or(0) as usize;

        let client = create_client(&HttpClientConfig::default())?;
        let mut scored: Vec<(f64, NormalizedItem)> = Vec::new();

        for category_id in category_ids {
            let response = match Self::fetch(&client, api_key, &category_id, max_articles).await {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(category_id, error = %e, "failed to fetch YouTube trending category");
                    continue;
                }
            };
            // Recorded only on a successful call — 100 quota units per `videos.list`.
            if let Some(quota) = quota {
                quota.record_usage(100).await;
            }

            for video in response.items {
                let view_count = video.statistics.view_count.unwrap_or(0);
                if view_count < min_view_count {
                    continue;
                }

                let duration_seconds = video.content_details.duration.as_deref().and_then(parse_iso8601_duration);
                if !include_shorts && duration_seconds.is_some_and(|d| d > 0 && d <= 60) {
                    continue;
                }

                let haystack = format!(
                    "{} {} {}",
                    video.snippet.title,
                    video.snippet.description,
                    video.snippet.tags.join(" ")
                );
                let (relevance, match_count) = relevance_and_match_count(&haystack, keywords);

                if !keywords.is_empty() && match_count < min_keyword_matches {
                    continue;
                }

                let published_at = DateTime::parse_from_rfc3339(&video.snippet.published_at)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now());

                let mut tags = video.snippet.tags.clone();
                tags.truncate(10);

                let mut item = NormalizedItem::new(
                    video.snippet.title,
                    format!("https://www.youtube.com/watch?v={}", video.id),
                    "youtube_trending",
                );
                item.external_id = video.id.clone();
                item.content = Some(video.snippet.description);
                item.author = Some(video.snippet.channel_title.clone());
                item.published_at = published_at;
                item.tags = tags;
                item.upvotes = video.statistics.like_count.unwrap_or(0);
                item.comments_count = video.statistics.comment_count.unwrap_or(0);
                item.video = Some(VideoAttrs {
                    video_id: video.id,
                    channel_id: if video.snippet.channel_id.is_empty() { "unknown".to_string() } else { video.snippet.channel_id },
                    channel_name: video.snippet.channel_title,
                    thumbnail_url: video.snippet.thumbnails.high.map(|t| t.url),
                    duration_seconds,
                    view_count: video.statistics.view_count,
                });
                scored.push((relevance, item));
            }
        }

        // Sort by Σ weight_i over matched keywords, descending.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());
        let mut items: Vec<NormalizedItem> = scored.into_iter().map(|(_, item)| item).collect();
        items.truncate(max_articles);
        Ok(items)
    }
}

#[async_trait]
impl ScraperPlugin for YouTubeTrendingPlugin {
    fn name(&self) -> &'static str {
        "youtube_trending"
    }

    fn display_name(&self) -> &'static str {
        "YouTube Trending"
    }

    fn required_config(&self) -> &'static [&'static str] {
        &["api_key"]
    }

    async fn scrape(&self, config: &ScrapeConfig, keywords: &[ScoredKeyword]) -> Result<Vec<NormalizedItem>> {
        let quota = config
            .get_str("redis_url")
            .and_then(|url| YouTubeQuotaManager::new(url).ok());
        let quota: Option<&dyn YouTubeQuotaGate> = quota.as_ref().map(|q| q as &dyn YouTubeQuotaGate);
        self.scrape_with_quota_gate(config, keywords, quota).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use techwatch_http::quota::FakeQuotaGate;

    fn kw(keyword: &str, weight: f64) -> ScoredKeyword {
        ScoredKeyword { keyword: keyword.to_string(), weight, category: "other".to_string() }
    }

    fn config_with(values: serde_json::Value) -> ScrapeConfig {
        let map: std::collections::HashMap<String, serde_json::Value> = values.as_object().unwrap().clone().into_iter().collect();
        ScrapeConfig { max_articles: 10, values: map }
    }

    #[test]
    fn parse_iso8601_duration_handles_minutes_and_seconds() {
        assert_eq!(parse_iso8601_duration("PT4M13S"), Some(253));
    }

    #[test]
    fn parse_iso8601_duration_handles_hours() {
        assert_eq!(parse_iso8601_duration("PT1H2M3S"), Some(3723));
    }

    #[test]
    fn parse_iso8601_duration_handles_seconds_only() {
        assert_eq!(parse_iso8601_duration("PT45S"), Some(45));
    }

    #[test]
    fn parse_iso8601_duration_rejects_non_duration_strings() {
        assert_eq!(parse_iso8601_duration("not a duration"), None);
    }

    #[test]
    fn videos_response_deserializes_numeric_strings_and_tags() {
        let raw = r#"{
            "items": [{
                "id": "abc123",
                "snippet": {
                    "title": "Never Gonna Give You Up",
                    "description": "the official video",
                    "channelId": "chan1",
                    "channelTitle": "Rick Astley",
                    "publishedAt": "2025-07-01T00:00:00Z",
                    "tags": ["rick astley", "music", "80s"]
                },
                "statistics": {"viewCount": "12345", "likeCount": "99", "commentCount": "4"},
                "contentDetails": {"duration": "PT10M"}
            }]
        }"#;
        let parsed: VideosResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.items[0].statistics.view_count, Some(12345));
        assert_eq!(parsed.items[0].content_details.duration.as_deref(), Some("PT10M"));
        assert_eq!(
            parsed.items[0].snippet.tags,
            vec!["rick astley".to_string(), "music".to_string(), "80s".to_string()]
        );
    }

    #[test]
    fn videos_response_defaults_tags_when_absent() {
        let raw = r#"{
            "items": [{
                "id": "abc123",
                "snippet": {
                    "title": "A video",
                    "publishedAt": "2025-07-01T00:00:00Z"
                }
            }]
        }"#;
        let parsed: VideosResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.items[0].snippet.tags.is_empty());
    }

    #[test]
    fn relevance_sums_weights_of_matched_keywords_only() {
        let haystack = "Rust async runtimes compared kubernetes music";
        let keywords = vec![kw("rust", 2.0), kw("kubernetes", 0.5), kw("golang", 9.0)];
        let (relevance, match_count) = relevance_and_match_count(haystack, &keywords);
        assert_eq!(match_count, 2);
        assert!((relevance - 2.5).abs() < 1e-9);
    }

    #[test]
    fn relevance_haystack_includes_tags() {
        let haystack = format!("{} {} {}", "title", "description", vec!["niche-tag".to_string()].join(" "));
        let keywords = vec![kw("niche-tag", 1.0)];
        let (relevance, match_count) = relevance_and_match_count(&haystack, &keywords);
        assert_eq!(match_count, 1);
        assert_eq!(relevance, 1.0);
    }

    #[tokio::test]
    async fn quota_exhausted_returns_no_items_and_never_records_usage() {
        let plugin = YouTubeTrendingPlugin;
        let config = config_with(serde_json::json!({ "api_key": "test-key" }));
        let gate = FakeQuotaGate::with_usage(techwatch_http::quota::DAILY_LIMIT);

        let items = plugin
            .scrape_with_quota_gate(&config, &[], Some(&gate as &dyn YouTubeQuotaGate))
            .await
            .unwrap();

        assert!(items.is_empty());
        assert_eq!(gate.record_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }
}
