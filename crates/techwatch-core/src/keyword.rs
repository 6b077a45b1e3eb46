//! Global and per-user watched keywords.

use serde::{Deserialize, Serialize};

/// A global keyword watched by the relevance scorer and trend detector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Keyword {
    pub id: i64,
    pub keyword: String,
    pub category: String,
    /// 1.0..=5.0.
    pub weight: f64,
    pub is_active: bool,
}

/// A per-user keyword used by the personalized scoring service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserKeyword {
    pub user_id: i64,
    pub keyword: String,
    pub category: String,
    /// 0.1..=5.0.
    pub weight: f64,
    pub is_active: bool,
}

/// A scored `{keyword, weight, category}` triple as consumed by the scorer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredKeyword {
    pub keyword: String,
    pub weight: f64,
    pub category: String,
}

impl From<&Keyword> for ScoredKeyword {
    fn from(k: &Keyword) -> Self {
        Self {
            keyword: k.keyword.clone(),
            weight: k.weight,
            category: k.category.clone(),
        }
    }
}

impl From<&UserKeyword> for ScoredKeyword {
    fn from(k: &UserKeyword) -> Self {
        Self {
            keyword: k.keyword.clone(),
            weight: k.weight,
            category: k.category.clone(),
        }
    }
}
