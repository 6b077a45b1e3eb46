//! Cooperative token-bucket rate limiter shared by scraper plugins.

use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

struct Bucket {
    rate_per_minute: f64,
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate_per_minute / 60.0).min(self.rate_per_minute);
        self.last_refill = now;
    }
}

/// A per-plugin rate limiter. Call [`RateLimiter::acquire`] before each
/// outbound request; it resolves once a token is available, refilling at
/// `rate_per_minute / 60` tokens per second and never busy-looping below
/// 100ms.
pub struct RateLimiter {
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        let rate = requests_per_minute as f64;
        Self {
            bucket: Mutex::new(Bucket {
                rate_per_minute: rate,
                tokens: rate,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Wait for, and consume, one token.
    pub async fn acquire(&self) {
        loop {
            let mut bucket = self.bucket.lock().await;
            bucket.refill();
            if bucket.tokens >= 1.0 {
                bucket.tokens -= 1.0;
                return;
            }
            drop(bucket);
            tokio::time::sleep(MIN_POLL_INTERVAL).await;
        }
    }

    /// Current token count, after refilling (for diagnostics/tests).
    pub async fn available(&self) -> f64 {
        let mut bucket = self.bucket.lock().await;
        bucket.refill();
        bucket.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_full() {
        let limiter = RateLimiter::new(60);
        assert!((limiter.available().await - 60.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn acquire_consumes_a_token() {
        let limiter = RateLimiter::new(60);
        limiter.acquire().await;
        let remaining = limiter.available().await;
        assert!(remaining < 60.0);
    }

    #[tokio::test]
    async fn refills_over_time() {
        let limiter = RateLimiter::new(600); // 10 tokens/sec
        for _ in 0..600 {
            limiter.acquire().await;
        }
        assert!(limiter.available().await < 1.0);
        tokio::time::sleep(Duration::from_millis(500)).await;
        let available = limiter.available().await;
        assert!(available >= 4.0, "expected ~5 tokens refilled, got {available}");
    }

    #[tokio::test]
    async fn waits_when_exhausted() {
        let limiter = RateLimiter::new(600); // 10 tokens/sec, so ~100ms per token
        for _ in 0..600 {
            limiter.acquire().await;
        }
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
