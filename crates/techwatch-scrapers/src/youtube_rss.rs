//! YouTube channel uploads via the public per-channel Atom feed. Consumes no
//! API quota, unlike [`crate::youtube_trending`].

use crate::plugin::{ScrapeConfig, ScraperPlugin};
use crate::{PluginError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use techwatch_core::{NormalizedItem, ScoredKeyword, VideoAttrs};
use techwatch_http::{HttpClientConfig, HttpError, RateLimiter, create_client, with_retry};

const FEED_URL: &str = "https://www.youtube.com/feeds/videos.xml";

pub struct YouTubeRssPlugin;

impl YouTubeRssPlugin {
    async fn fetch(client: &reqwest::Client, channel_id: &str) -> Result<String> {
        let resp = with_retry(3, || async {
            client
                .get(FEED_URL)
                .query(&[("channel_id", channel_id)])
                .send()
                .await
                .map_err(HttpError::from)?
                .error_for_status()
                .map_err(HttpError::from)
        })
        .await?;
        resp.text().await.map_err(|e| PluginError::Parse(e.to_string()))
    }

    fn parse_entries(xml: &str, channel_name: &str) -> Vec<NormalizedItem> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut items = Vec::new();
        let mut in_entry = false;
        let mut tag_stack: Vec<String> = Vec::new();

        let mut title = String::new();
        let mut link: Option<String> = None;
        let mut video_id = String::new();
        let mut channel_id = String::new();
        let mut summary = String::new();
        let mut published = String::new();
        let mut thumbnail_url: Option<String> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    let local = local_name(&e.name().into_inner());
                    if local == "entry" {
                        in_entry = true;
                        title.clear();
                        link = None;
                        video_id.clear();
                        channel_id.clear();
                        summary.clear();
                        published.clear();
                        thumbnail_url = None;
                    }
                    if in_entry && local == "link" {
                        for attr in e.attributes().flatten() {
                            if local_name(attr.key.into_inner()) == "href" {
                                link = Some(attr.unescape_value().unwrap_or_default().to_string());
                            }
                        }
                    }
                    if in_entry && local == "thumbnail" {
                        for attr in e.attributes().flatten() {
                            if local_name(attr.key.into_inner()) == "url" {
                                thumbnail_url = Some(attr.unescape_value().unwrap_or_default().to_string());
                            }
                        }
                    }
                    tag_stack.push(local);
                }
                Ok(Event::Text(t)) => {
                    if !in_entry {
                        continue;
                    }
                    let text = t.unescape().unwrap_or_default().to_string();
                    match tag_stack.last().map(String::as_str) {
                        Some("title") => title.push_str(&text),
                        Some("videoId") => video_id.push_str(&text),
                        Some("channelId") => channel_id.push_str(&text),
                        Some("description") => summary.push_str(&text),
                        Some("published") => published.push_str(&text),
                        _ => {}
                    }
                }
                Ok(Event::End(e)) => {
                    let local = local_name(&e.name().into_inner());
                    if local == "entry" {
                        in_entry = false;
                        if !title.is_empty() && !video_id.is_empty() {
                            let published_at = DateTime::parse_from_rfc3339(published.trim())
                                .map(|dt| dt.with_timezone(&Utc))
                                .unwrap_or_else(|_| Utc::now());

                            let mut item = NormalizedItem::new(
                                title.clone(),
                                link.clone().unwrap_or_else(|| format!("https://www.youtube.com/watch?v={video_id}")),
                                "youtube_rss",
                            );
                            item.external_id = video_id.clone();
                            item.content = if summary.is_empty() { None } else { Some(summary.clone()) };
                            item.author = Some(channel_name.to_string());
                            item.published_at = published_at;
                            item.tags = vec![channel_name.to_string()];
                            item.video = Some(VideoAttrs {
                                video_id: video_id.clone(),
                                channel_id: if channel_id.is_empty() { "unknown".to_string() } else { channel_id.clone() },
                                channel_name: channel_name.to_string(),
                                thumbnail_url: thumbnail_url.clone(),
                                duration_seconds: None,
                                view_count: None,
                            });
                            items.push(item);
                        }
                    }
                    tag_stack.pop();
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "malformed YouTube RSS entry, stopping parse");
                    break;
                }
                _ => {}
            }
        }

        items
    }
}

fn local_name(qname: &[u8]) -> String {
    let s = String::from_utf8_lossy(qname);
    s.rsplit(':').next().unwrap_or(&s).to_string()
}

#[async_trait]
impl ScraperPlugin for YouTubeRssPlugin {
    fn name(&self) -> &'static str {
        "youtube_rss"
    }

    fn display_name(&self) -> &'static str {
        "YouTube RSS"
    }

    async fn scrape(&self, config: &ScrapeConfig, keywords: &[ScoredKeyword]) -> Result<Vec<NormalizedItem>> {
        let max_articles = config.max_articles;
        let channels = config.get_str_list("channels");
        if channels.is_empty() {
            return Ok(Vec::new());
        }

        let client = create_client(&HttpClientConfig::default())?;
        let limiter = RateLimiter::new(60);
        let mut items = Vec::new();

        for channel in channels {
            let (channel_id, channel_name) = match channel.split_once(':') {
                Some((id, name)) => (id.to_string(), name.to_string()),
                None => (channel.clone(), channel.clone()),
            };

            limiter.acquire().await;
            let xml = match Self::fetch(&client, &channel_id).await {
                Ok(xml) => xml,
                Err(e) => {
                    tracing::warn!(channel_id, error = %e, "failed to fetch YouTube channel feed");
                    continue;
                }
            };

            for item in Self::parse_entries(&xml, &channel_name) {
                if crate::plugin::title_matches_keywords(&item.title, keywords) {
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

    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:yt="http://www.youtube.com/xml/schemas/2015">
  <entry>
    <yt:videoId>abc123</yt:videoId>
    <yt:channelId>chan1</yt:channelId>
    <title>A great Rust talk</title>
    <link rel="alternate" href="https://www.youtube.com/watch?v=abc123"/>
    <published>2025-07-01T00:00:00+00:00</published>
    <media:group xmlns:media="http://search.yahoo.com/mrss/">
      <media:description>talk about async</media:description>
      <media:thumbnail url="https://img.example/thumb.jpg"/>
    </media:group>
  </entry>
  <entry>
    <yt:channelId>chan1</yt:channelId>
    <link rel="alternate" href="https://www.youtube.com/watch?v=noid"/>
    <published>2025-07-02T00:00:00+00:00</published>
  </entry>
</feed>"#;

    #[test]
    fn parse_entries_extracts_video_metadata() {
        let items = YouTubeRssPlugin::parse_entries(SAMPLE_FEED, "Rust Channel");
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.title, "A great Rust talk");
        assert_eq!(item.external_id, "abc123");
        assert_eq!(item.url, "https://www.youtube.com/watch?v=abc123");
        assert_eq!(item.author.as_deref(), Some("Rust Channel"));
        let video = item.video.as_ref().unwrap();
        assert_eq!(video.channel_id, "chan1");
    }

    #[test]
    fn parse_entries_skips_entries_without_a_video_id() {
        let items = YouTubeRssPlugin::parse_entries(SAMPLE_FEED, "Rust Channel");
        assert!(items.iter().all(|i| i.external_id != ""));
    }
}
