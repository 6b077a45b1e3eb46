//! Redis-backed result cache for scraper plugin output.
//!
//! Caching here is advisory: a Redis outage never fails a scrape, it just
//! disables the cache for that call.

use redis::AsyncCommands;
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::warn;

pub struct ResultCache {
    client: redis::Client,
    default_ttl: Duration,
}

impl ResultCache {
    pub fn new(redis_url: &str, default_ttl: Duration) -> redis::RedisResult<Self> {
        Ok(Self {
            client: redis::Client::open(redis_url)?,
            default_ttl,
        })
    }

    /// Build the cache key `scraper:{plugin_name}:{digest}` where `digest`
    /// is the first 8 hex characters of the MD5 hash of the sorted keyword
    /// list and sorted config key=value pairs.
    pub fn key(plugin_name: &str, keywords: &[String], config: &[(String, String)]) -> String {
        let mut sorted_keywords = keywords.to_vec();
        sorted_keywords.sort();

        let mut sorted_config = config.to_vec();
        sorted_config.sort();

        let mut material = sorted_keywords.join(",");
        material.push('|');
        material.push_str(
            &sorted_config
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(","),
        );

        let digest = format!("{:x}", md5::compute(material.as_bytes()));
        format!("scraper:{plugin_name}:{}", &digest[..8])
    }

    /// Best-effort read. Returns `None` on cache miss, deserialization
    /// failure, or Redis unavailability — all three are treated the same by
    /// callers (fall through to a live scrape).
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut conn = match self.client.get_multiplexed_async_connection().await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "cache read bypassed: redis unavailable");
                return None;
            }
        };

        let raw: Option<String> = match conn.get(key).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "cache read bypassed: redis GET failed");
                return None;
            }
        };

        raw.and_then(|s| serde_json::from_str(&s).ok())
    }

    /// Best-effort write with the cache's default TTL.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) {
        self.set_with_ttl(key, value, self.default_ttl).await;
    }

    pub async fn set_with_ttl<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let mut conn = match self.client.get_multiplexed_async_connection().await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "cache write skipped: redis unavailable");
                return;
            }
        };

        let Ok(serialized) = serde_json::to_string(value) else {
            warn!("cache write skipped: serialization failed");
            return;
        };

        if let Err(e) = conn
            .set_ex::<_, _, ()>(key, serialized, ttl.as_secs().max(1))
            .await
        {
            warn!(error = %e, "cache write skipped: redis SETEX failed");
        }
    }
}
