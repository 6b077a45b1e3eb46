//! Source CRUD and lookups.

use crate::{Result, Storage};
use chrono::Utc;
use sqlx::FromRow;
use techwatch_core::Source;

#[derive(FromRow)]
struct SourceRow {
    id: i64,
    name: String,
    r#type: String,
    base_url: Option<String>,
    is_active: bool,
    scrape_frequency_hours: i32,
    last_scraped_at: Option<String>,
    config: String,
}

impl From<SourceRow> for Source {
    fn from(row: SourceRow) -> Self {
        Source {
            id: row.id,
            name: row.name,
            r#type: row.r#type,
            base_url: row.base_url,
            is_active: row.is_active,
            scrape_frequency_hours: row.scrape_frequency_hours,
            last_scraped_at: row
                .last_scraped_at
                .and_then(|s| chrono::DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            config: serde_json::from_str(&row.config).unwrap_or_default(),
        }
    }
}

impl Storage {
    /// Register a new source with its default schedule, active by default.
    /// Used by bootstrap/admin seeding, not by the scrape path itself.
    pub async fn insert_source(&self, name: &str, source_type: &str) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            "INSERT INTO sources (name, type) VALUES (?, ?) RETURNING id",
        )
        .bind(name)
        .bind(source_type)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    pub async fn active_sources(&self) -> Result<Vec<Source>> {
        let rows = sqlx::query_as::<_, SourceRow>(
            "SELECT id, name, type, base_url, is_active, scrape_frequency_hours, last_scraped_at, config \
             FROM sources WHERE is_active = 1",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Source::from).collect())
    }

    pub async fn source_by_type(&self, source_type: &str) -> Result<Option<Source>> {
        let row = sqlx::query_as::<_, SourceRow>(
            "SELECT id, name, type, base_url, is_active, scrape_frequency_hours, last_scraped_at, config \
             FROM sources WHERE type = ? LIMIT 1",
        )
        .bind(source_type)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Source::from))
    }

    pub async fn touch_last_scraped(&self, source_id: i64) -> Result<()> {
        sqlx::query("UPDATE sources SET last_scraped_at = ? WHERE id = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(source_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::SqlitePool;

    async fn test_storage() -> Storage {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        Storage::from_pool(pool)
    }

    #[tokio::test]
    async fn active_sources_excludes_inactive() {
        let storage = test_storage().await;
        sqlx::query("INSERT INTO sources (name, type, is_active) VALUES ('hn', 'hackernews', 1)")
            .execute(&storage.pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO sources (name, type, is_active) VALUES ('old', 'devto', 0)")
            .execute(&storage.pool)
            .await
            .unwrap();

        let sources = storage.active_sources().await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].r#type, "hackernews");
    }

    #[tokio::test]
    async fn source_by_type_returns_none_when_absent() {
        let storage = test_storage().await;
        assert!(storage.source_by_type("reddit").await.unwrap().is_none());
    }
}
