//! NormalizedItem — the in-flight, plugin-produced shape consumed by persistence.
//!
//! Every plugin emits these; persistence never sees anything else. Validation
//! happens once, at the plugin/persistence boundary: anything
//! that fails is dropped with a `warn` log, never propagated as a hard error.

use crate::item::MAX_TAGS;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const MAX_TITLE_LEN: usize = 500;
const MAX_CONTENT_LEN: usize = 50_000;

/// Video-only attributes, present only for `youtube_rss` / `youtube_trending`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VideoAttrs {
    pub video_id: String,
    pub channel_id: String,
    pub channel_name: String,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: Option<i64>,
    pub view_count: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedItem {
    pub title: String,
    pub url: String,
    pub source_type: String,
    pub external_id: String,
    pub published_at: chrono::DateTime<chrono::Utc>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub upvotes: i64,
    pub comments_count: i64,
    pub video: Option<VideoAttrs>,
    pub raw_data: HashMap<String, serde_json::Value>,
}

impl NormalizedItem {
    pub fn new(title: impl Into<String>, url: impl Into<String>, source_type: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            source_type: source_type.into(),
            external_id: String::new(),
            published_at: chrono::Utc::now(),
            content: None,
            summary: None,
            author: None,
            tags: Vec::new(),
            upvotes: 0,
            comments_count: 0,
            video: None,
            raw_data: HashMap::new(),
        }
    }

    /// Trim tags to the first 10.
    pub fn cap_tags(&mut self) {
        if self.tags.len() > MAX_TAGS {
            self.tags.truncate(MAX_TAGS);
        }
    }

    /// Validate the item against required/optional field rules.
    ///
    /// Returns the reason for rejection so callers can log it at `warn` and
    /// drop the item — validation failures never propagate past this boundary.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.is_empty() || self.title.chars().count() > MAX_TITLE_LEN {
            return Err(format!(
                "title length {} outside 1..={MAX_TITLE_LEN}",
                self.title.chars().count()
            ));
        }
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(format!("url `{}` is not http(s)", self.url));
        }
        if self.source_type != self.source_type.to_lowercase() {
            return Err("source_type must be lowercase".to_string());
        }
        if let Some(content) = &self.content
            && content.chars().count() > MAX_CONTENT_LEN
        {
            return Err(format!(
                "content length {} exceeds {MAX_CONTENT_LEN}",
                content.chars().count()
            ));
        }
        if let Some(video) = &self.video {
            if video.video_id.trim().is_empty() {
                return Err("video_id must be non-empty after trim".to_string());
            }
            if video.channel_id.trim().is_empty() {
                return Err("channel_id must be non-empty after trim".to_string());
            }
            if video.channel_name.trim().is_empty() {
                return Err("channel_name must be non-empty after trim".to_string());
            }
            if video.duration_seconds.is_some_and(|d| d < 0) {
                return Err("duration_seconds must be >= 0".to_string());
            }
            if video.view_count.is_some_and(|v| v < 0) {
                return Err("view_count must be >= 0".to_string());
            }
        }
        Ok(())
    }

    pub fn is_video(&self) -> bool {
        self.video.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_item() -> NormalizedItem {
        let mut item = NormalizedItem::new("A valid title", "https://example.com/a", "hackernews");
        item.external_id = "123".to_string();
        item
    }

    #[test]
    fn accepts_well_formed_item() {
        assert!(valid_item().validate().is_ok());
    }

    #[test]
    fn rejects_empty_title() {
        let mut item = valid_item();
        item.title.clear();
        assert!(item.validate().is_err());
    }

    #[test]
    fn rejects_non_http_url() {
        let mut item = valid_item();
        item.url = "ftp://example.com/a".to_string();
        assert!(item.validate().is_err());
    }

    #[test]
    fn rejects_oversized_content() {
        let mut item = valid_item();
        item.content = Some("x".repeat(MAX_CONTENT_LEN + 1));
        assert!(item.validate().is_err());
    }

    #[test]
    fn cap_tags_truncates_to_ten() {
        let mut item = valid_item();
        item.tags = (0..20).map(|i| i.to_string()).collect();
        item.cap_tags();
        assert_eq!(item.tags.len(), MAX_TAGS);
    }

    #[test]
    fn rejects_video_with_blank_channel() {
        let mut item = valid_item();
        item.video = Some(VideoAttrs {
            video_id: "vid1".to_string(),
            channel_id: "chan1".to_string(),
            channel_name: "  ".to_string(),
            ..Default::default()
        });
        assert!(item.validate().is_err());
    }
}
