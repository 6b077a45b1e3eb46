//! Per-user item score storage.

use crate::{Result, Storage};
use chrono::Utc;

impl Storage {
    pub async fn upsert_user_item_score(
        &self,
        user_id: i64,
        item_id: i64,
        score: f64,
        keyword_matches: i32,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_item_scores (user_id, item_id, score, keyword_matches, scored_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(user_id, item_id) DO UPDATE SET
                score = excluded.score,
                keyword_matches = excluded.keyword_matches,
                scored_at = excluded.scored_at
            "#,
        )
        .bind(user_id)
        .bind(item_id)
        .bind(score)
        .bind(keyword_matches)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Wipe all scores for a user (used by `rescore_user`).
    pub async fn delete_user_item_scores(&self, user_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM user_item_scores WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn user_item_score_count(&self, user_id: i64) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_item_scores WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }
}
