//! Item entity — the canonical, persisted shape for every ingested piece of content.

use serde::{Deserialize, Serialize};

/// Maximum number of tags retained on an item.
pub const MAX_TAGS: usize = 10;

/// A persisted, deduplicated content item (article, paper, post, or video).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: i64,
    pub source_id: i64,
    pub external_id: Option<String>,
    pub title: String,
    /// Dedup key — globally unique across the store.
    pub url: String,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub author: Option<String>,
    pub published_at: chrono::DateTime<chrono::Utc>,
    pub scraped_at: chrono::DateTime<chrono::Utc>,
    pub score: Option<f64>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub language: Option<String>,
    pub upvotes: i64,
    pub comments_count: i64,
    pub is_video: bool,
    pub video_id: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: Option<i64>,
    pub view_count: Option<i64>,
    pub is_read: bool,
    pub is_favorite: bool,
    pub is_archived: bool,
    pub is_bookmarked: bool,
    pub is_dismissed: bool,
}

impl Item {
    /// `0 ≤ score ≤ 100` when set.
    pub fn score_in_bounds(&self) -> bool {
        self.score.is_none_or(|s| (0.0..=100.0).contains(&s))
    }

    pub fn tags_within_cap(&self) -> bool {
        self.tags.len() <= MAX_TAGS
    }
}
