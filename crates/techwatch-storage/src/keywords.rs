//! Global and per-user keyword lookups.

use crate::{Result, Storage};
use sqlx::FromRow;
use techwatch_core::{Keyword, UserKeyword};

#[derive(FromRow)]
struct KeywordRow {
    id: i64,
    keyword: String,
    category: String,
    weight: f64,
    is_active: bool,
}

impl From<KeywordRow> for Keyword {
    fn from(row: KeywordRow) -> Self {
        Keyword {
            id: row.id,
            keyword: row.keyword,
            category: row.category,
            weight: row.weight,
            is_active: row.is_active,
        }
    }
}

#[derive(FromRow)]
struct UserKeywordRow {
    user_id: i64,
    keyword: String,
    category: String,
    weight: f64,
    is_active: bool,
}

impl From<UserKeywordRow> for UserKeyword {
    fn from(row: UserKeywordRow) -> Self {
        UserKeyword {
            user_id: row.user_id,
            keyword: row.keyword,
            category: row.category,
            weight: row.weight,
            is_active: row.is_active,
        }
    }
}

impl Storage {
    pub async fn active_keywords(&self) -> Result<Vec<Keyword>> {
        let rows = sqlx::query_as::<_, KeywordRow>(
            "SELECT id, keyword, category, weight, is_active FROM keywords WHERE is_active = 1",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Keyword::into).collect())
    }

    pub async fn active_user_keywords(&self, user_id: i64) -> Result<Vec<UserKeyword>> {
        let rows = sqlx::query_as::<_, UserKeywordRow>(
            "SELECT user_id, keyword, category, weight, is_active FROM user_keywords \
             WHERE user_id = ? AND is_active = 1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(UserKeyword::into).collect())
    }
}
