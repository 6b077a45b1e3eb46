//! Daily per-keyword trend aggregate, produced by the trend detector.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trend {
    pub keyword: String,
    pub category: String,
    pub date: chrono::NaiveDate,
    pub trend_score: f64,
    pub article_count: i64,
}
