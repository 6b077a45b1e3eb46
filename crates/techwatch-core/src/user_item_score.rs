//! Per-(user, item) personalized score, produced by the per-user scoring service.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserItemScore {
    pub user_id: i64,
    pub item_id: i64,
    /// 0..=100.
    pub score: f64,
    pub keyword_matches: i32,
    pub scored_at: chrono::DateTime<chrono::Utc>,
}
