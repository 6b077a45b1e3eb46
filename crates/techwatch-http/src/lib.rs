//! HTTP egress for scraper plugins: a shared reqwest client with retry and
//! backoff, a token-bucket rate limiter, a Redis-backed result cache, and the
//! YouTube quota tracker.

pub mod cache;
pub mod client;
pub mod error;
pub mod quota;
pub mod rate_limit;
pub mod retry_after;

pub use client::{HttpClientConfig, create_client, with_retry};
pub use error::{HttpError, Result};
pub use rate_limit::RateLimiter;
pub use retry_after::parse_retry_after;
