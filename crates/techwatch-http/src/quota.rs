//! YouTube Data API daily quota tracking.
//!
//! Quota is tracked in Redis per UTC day so it survives process restarts and
//! is shared across any number of scraper workers. The gate itself lives
//! behind [`YouTubeQuotaGate`] — mirroring the `TextScoringBackend` seam in
//! `techwatch-scoring` — so a caller can swap in a fake quota source in
//! tests instead of standing up Redis.

use async_trait::async_trait;
use redis::AsyncCommands;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::warn;

pub const DAILY_LIMIT: i64 = 10_000;
pub const WARNING_THRESHOLD: i64 = 9_500;

const QUOTA_KEY_TTL_SECS: i64 = 86_400 * 2;

/// The quota gate a scraper plugin consults before and after a billable
/// call to the YouTube Data API.
#[async_trait]
pub trait YouTubeQuotaGate: Send + Sync {
    /// True if today's usage is still under the daily limit.
    async fn check_quota(&self) -> bool;

    /// Record `units` of quota consumption for today.
    async fn record_usage(&self, units: i64);
}

pub struct YouTubeQuotaManager {
    client: redis::Client,
}

impl YouTubeQuotaManager {
    pub fn new(redis_url: &str) -> redis::RedisResult<Self> {
        Ok(Self {
            client: redis::Client::open(redis_url)?,
        })
    }

    fn quota_key(today: chrono::NaiveDate) -> String {
        format!("youtube_api_quota:{}", today.format("%Y-%m-%d"))
    }

    pub async fn get_usage(&self) -> i64 {
        let key = Self::quota_key(chrono::Utc::now().date_naive());
        let mut conn = match self.client.get_multiplexed_async_connection().await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "quota usage read failed: redis unavailable");
                return 0;
            }
        };
        conn.get::<_, Option<i64>>(&key).await.ok().flatten().unwrap_or(0)
    }
}

#[async_trait]
impl YouTubeQuotaGate for YouTubeQuotaManager {
    /// Logs a warning once usage crosses [`WARNING_THRESHOLD`].
    async fn check_quota(&self) -> bool {
        let usage = self.get_usage().await;
        if usage >= WARNING_THRESHOLD {
            warn!(usage, limit = DAILY_LIMIT, "YouTube quota nearing daily limit");
        }
        usage < DAILY_LIMIT
    }

    /// Refreshes the key's 48-hour TTL after incrementing.
    async fn record_usage(&self, units: i64) {
        let key = Self::quota_key(chrono::Utc::now().date_naive());
        let mut conn = match self.client.get_multiplexed_async_connection().await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "quota usage not recorded: redis unavailable");
                return;
            }
        };

        if let Err(e) = conn.incr::<_, _, ()>(&key, units).await {
            warn!(error = %e, "quota INCRBY failed");
            return;
        }
        if let Err(e) = conn.expire::<_, ()>(&key, QUOTA_KEY_TTL_SECS).await {
            warn!(error = %e, "quota key EXPIRE failed");
        }
    }
}

/// In-memory fake gate for exercising quota-aware call sites without Redis —
/// mirrors `techwatch_scoring::backend::StaticEmbeddingBackend`'s role for
/// the scorer.
#[derive(Default)]
pub struct FakeQuotaGate {
    pub usage: AtomicI64,
    pub record_calls: AtomicI64,
}

impl FakeQuotaGate {
    pub fn with_usage(usage: i64) -> Self {
        Self { usage: AtomicI64::new(usage), record_calls: AtomicI64::new(0) }
    }
}

#[async_trait]
impl YouTubeQuotaGate for FakeQuotaGate {
    async fn check_quota(&self) -> bool {
        self.usage.load(Ordering::SeqCst) < DAILY_LIMIT
    }

    async fn record_usage(&self, units: i64) {
        self.record_calls.fetch_add(1, Ordering::SeqCst);
        self.usage.fetch_add(units, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_key_is_scoped_to_day() {
        let d1 = chrono::NaiveDate::from_ymd_opt(2026, 7, 29).unwrap();
        let d2 = chrono::NaiveDate::from_ymd_opt(2026, 7, 30).unwrap();
        assert_ne!(
            YouTubeQuotaManager::quota_key(d1),
            YouTubeQuotaManager::quota_key(d2)
        );
        assert_eq!(
            YouTubeQuotaManager::quota_key(d1),
            "youtube_api_quota:2026-07-29"
        );
    }

    #[test]
    fn thresholds_match_free_tier() {
        assert_eq!(DAILY_LIMIT, 10_000);
        assert_eq!(WARNING_THRESHOLD, 9_500);
    }

    #[tokio::test]
    async fn fake_gate_reports_exhausted_past_daily_limit() {
        let gate = FakeQuotaGate::with_usage(DAILY_LIMIT);
        assert!(!gate.check_quota().await);
    }

    #[tokio::test]
    async fn fake_gate_reports_available_under_daily_limit() {
        let gate = FakeQuotaGate::with_usage(0);
        assert!(gate.check_quota().await);
        gate.record_usage(100).await;
        assert_eq!(gate.usage.load(Ordering::SeqCst), 100);
        assert_eq!(gate.record_calls.load(Ordering::SeqCst), 1);
    }
}
