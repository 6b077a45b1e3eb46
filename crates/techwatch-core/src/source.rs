//! Source entity — an external content origin driven by a named plugin.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A configured content source, e.g. "HackerNews" backed by the `hackernews` plugin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Source {
    pub id: i64,
    pub name: String,
    /// Tag matching a registered plugin name (`hackernews`, `reddit`, ...).
    pub r#type: String,
    pub base_url: Option<String>,
    pub is_active: bool,
    pub scrape_frequency_hours: i32,
    pub last_scraped_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Plugin-specific configuration, opaque to everything but the plugin.
    pub config: HashMap<String, serde_json::Value>,
}

impl Source {
    /// `is_video ⇔ source.type ∈ {youtube_rss, youtube_trending}`.
    pub fn produces_video(&self) -> bool {
        matches!(self.r#type.as_str(), "youtube_rss" | "youtube_trending")
    }
}
