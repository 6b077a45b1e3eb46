//! Daily trend aggregate storage.

use crate::{Result, Storage};
use chrono::NaiveDate;

impl Storage {
    pub async fn upsert_trend(
        &self,
        keyword: &str,
        category: &str,
        date: NaiveDate,
        trend_score: f64,
        article_count: i64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO trends (keyword, category, date, trend_score, article_count)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(keyword, date) DO UPDATE SET
                category = excluded.category,
                trend_score = excluded.trend_score,
                article_count = excluded.article_count
            "#,
        )
        .bind(keyword)
        .bind(category)
        .bind(date.to_string())
        .bind(trend_score)
        .bind(article_count)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Drop trends older than `date < cutoff` (weekly cleanup job).
    pub async fn delete_trends_older_than(&self, cutoff: NaiveDate) -> Result<u64> {
        let result = sqlx::query("DELETE FROM trends WHERE date < ?")
            .bind(cutoff.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn trend_count(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM trends")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }
}
