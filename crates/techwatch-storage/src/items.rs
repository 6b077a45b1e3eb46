//! Item persistence: URL-keyed upsert.

use crate::{Result, Storage};
use chrono::Utc;
use sqlx::FromRow;
use techwatch_core::{Item, NormalizedItem};

#[derive(FromRow)]
struct ItemRow {
    id: i64,
    source_id: i64,
    external_id: Option<String>,
    title: String,
    url: String,
    content: Option<String>,
    summary: Option<String>,
    author: Option<String>,
    published_at: String,
    scraped_at: String,
    score: Option<f64>,
    category: Option<String>,
    tags: String,
    language: Option<String>,
    upvotes: i64,
    comments_count: i64,
    is_video: bool,
    video_id: Option<String>,
    thumbnail_url: Option<String>,
    duration_seconds: Option<i64>,
    view_count: Option<i64>,
    is_read: bool,
    is_favorite: bool,
    is_archived: bool,
    is_bookmarked: bool,
    is_dismissed: bool,
}

fn parse_dt(s: &str) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Item {
            id: row.id,
            source_id: row.source_id,
            external_id: row.external_id,
            title: row.title,
            url: row.url,
            content: row.content,
            summary: row.summary,
            author: row.author,
            published_at: parse_dt(&row.published_at),
            scraped_at: parse_dt(&row.scraped_at),
            score: row.score,
            category: row.category,
            tags: serde_json::from_str(&row.tags).unwrap_or_default(),
            language: row.language,
            upvotes: row.upvotes,
            comments_count: row.comments_count,
            is_video: row.is_video,
            video_id: row.video_id,
            thumbnail_url: row.thumbnail_url,
            duration_seconds: row.duration_seconds,
            view_count: row.view_count,
            is_read: row.is_read,
            is_favorite: row.is_favorite,
            is_archived: row.is_archived,
            is_bookmarked: row.is_bookmarked,
            is_dismissed: row.is_dismissed,
        }
    }
}

const ITEM_COLUMNS: &str = "id, source_id, external_id, title, url, content, summary, author, \
    published_at, scraped_at, score, category, tags, language, upvotes, comments_count, is_video, \
    video_id, thumbnail_url, duration_seconds, view_count, is_read, is_favorite, is_archived, \
    is_bookmarked, is_dismissed";

/// The upsert query itself, generic over `sqlx::Executor` so it runs
/// identically against the bare pool ([`Storage::upsert_item`]) or inside a
/// transaction ([`Storage::persist_items`]).
async fn upsert_item_exec<'e, E>(executor: E, item: &NormalizedItem, source_id: i64, is_video: bool) -> Result<i64>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let tags = serde_json::to_string(&item.tags)?;
    let (video_id, thumbnail_url, duration_seconds, view_count) = match &item.video {
        Some(v) => (
            Some(v.video_id.clone()),
            v.thumbnail_url.clone(),
            v.duration_seconds,
            v.view_count,
        ),
        None => (None, None, None, None),
    };

    let row: (i64,) = sqlx::query_as(
        r#"
        INSERT INTO items (
            source_id, external_id, title, url, content, summary, author,
            published_at, scraped_at, category, tags, upvotes, comments_count,
            is_video, video_id, thumbnail_url, duration_seconds, view_count
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(url) DO UPDATE SET
            external_id = COALESCE(excluded.external_id, items.external_id),
            title = excluded.title,
            content = COALESCE(excluded.content, items.content),
            summary = COALESCE(excluded.summary, items.summary),
            author = COALESCE(excluded.author, items.author),
            published_at = excluded.published_at,
            scraped_at = excluded.scraped_at,
            tags = excluded.tags,
            upvotes = excluded.upvotes,
            comments_count = excluded.comments_count,
            is_video = excluded.is_video,
            video_id = COALESCE(excluded.video_id, items.video_id),
            thumbnail_url = COALESCE(excluded.thumbnail_url, items.thumbnail_url),
            duration_seconds = COALESCE(excluded.duration_seconds, items.duration_seconds),
            view_count = COALESCE(excluded.view_count, items.view_count)
        RETURNING id
        "#,
    )
    .bind(source_id)
    .bind(&item.external_id)
    .bind(&item.title)
    .bind(&item.url)
    .bind(&item.content)
    .bind(&item.summary)
    .bind(&item.author)
    .bind(item.published_at.to_rfc3339())
    .bind(Utc::now().to_rfc3339())
    .bind(tags)
    .bind(item.upvotes)
    .bind(item.comments_count)
    .bind(is_video)
    .bind(video_id)
    .bind(thumbnail_url)
    .bind(duration_seconds)
    .bind(view_count)
    .fetch_one(executor)
    .await?;

    Ok(row.0)
}

impl Storage {
    /// Insert-or-update a single normalized item by URL identity.
    ///
    /// On conflict, fields the incoming scrape may legitimately omit
    /// (`external_id`, `content`, `summary`, `author`, the video fields)
    /// only overwrite the stored value when the incoming one is non-null, so
    /// a thinner subsequent scrape never blanks out data a richer one
    /// already captured. `title`/`url`/timestamps/`tags`/engagement counts
    /// always reflect the latest scrape. The five lifecycle flags are left
    /// untouched either way — a re-scrape must never clear a user's
    /// read/favorite/archive/bookmark/dismiss state.
    pub async fn upsert_item(&self, item: &NormalizedItem, source_id: i64, is_video: bool) -> Result<i64> {
        let mut item = item.clone();
        item.cap_tags();
        upsert_item_exec(&self.pool, &item, source_id, is_video).await
    }

    /// Upsert a whole source's scrape batch inside a single transaction:
    /// commit once at the end, roll back the entire batch on the first DB
    /// error rather than leaving a partially-applied source behind. Every
    /// item is tag-capped before validation, so the `len(tags) <= MAX_TAGS`
    /// invariant holds for anything that reaches the database regardless of
    /// how many tags a plugin emitted. Items that fail
    /// [`NormalizedItem::validate`] are dropped with a warning before the
    /// transaction opens — that's a per-item validation policy, not a DB
    /// failure, so it never triggers a rollback. Returns the count of items
    /// actually upserted (new + updated).
    pub async fn persist_items(&self, items: &[NormalizedItem], source_id: i64, is_video: bool) -> Result<i64> {
        let mut valid = Vec::with_capacity(items.len());
        for item in items {
            let mut item = item.clone();
            item.cap_tags();
            if let Err(e) = item.validate() {
                tracing::warn!(error = %e, url = %item.url, "dropping invalid normalized item");
                continue;
            }
            valid.push(item);
        }
        if valid.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        for item in &valid {
            upsert_item_exec(&mut tx, item, source_id, is_video).await?;
        }
        tx.commit().await?;

        Ok(valid.len() as i64)
    }

    pub async fn item_by_url(&self, url: &str) -> Result<Option<Item>> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE url = ? LIMIT 1"
        ))
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Item::from))
    }

    pub async fn item_count(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    /// Items with no global score yet, newest first, bounded by `limit`.
    pub async fn unscored_items(&self, limit: i64) -> Result<Vec<Item>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE score IS NULL ORDER BY published_at DESC LIMIT ?"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Item::from).collect())
    }

    pub async fn set_item_score(&self, item_id: i64, score: f64, category: Option<&str>) -> Result<()> {
        sqlx::query("UPDATE items SET score = ?, category = ? WHERE id = ?")
            .bind(score)
            .bind(category)
            .bind(item_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Items published since `since` — the trend detector filters titles by
    /// word-boundary regex in-process rather than in SQL.
    pub async fn items_published_since(&self, since: chrono::DateTime<Utc>) -> Result<Vec<Item>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE published_at >= ?"
        ))
        .bind(since.to_rfc3339())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Item::from).collect())
    }

    pub async fn recent_items(&self, limit: i64) -> Result<Vec<Item>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items ORDER BY published_at DESC LIMIT ?"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Item::from).collect())
    }

    pub async fn items_unscored_for_user(&self, user_id: i64, limit: i64) -> Result<Vec<Item>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items i \
             WHERE NOT EXISTS (SELECT 1 FROM user_item_scores s WHERE s.item_id = i.id AND s.user_id = ?) \
             ORDER BY i.published_at DESC LIMIT ?"
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Item::from).collect())
    }

    /// Items with content but no summary yet, oldest first so a backlog
    /// drains in submission order, bounded by `limit`.
    pub async fn items_unsummarized(&self, limit: i64) -> Result<Vec<Item>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items \
             WHERE summary IS NULL AND content IS NOT NULL \
             ORDER BY published_at ASC LIMIT ?"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Item::from).collect())
    }

    pub async fn set_item_summary(&self, item_id: i64, summary: &str) -> Result<()> {
        sqlx::query("UPDATE items SET summary = ? WHERE id = ?")
            .bind(summary)
            .bind(item_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn items_by_ids(&self, ids: &[i64]) -> Result<Vec<Item>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let query = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id IN ({placeholders})");
        let mut q = sqlx::query_as::<_, ItemRow>(&query);
        for id in ids {
            q = q.bind(id);
        }
        let rows = q.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Item::from).collect())
    }
}
