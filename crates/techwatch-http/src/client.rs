//! Shared HTTP client used by scraper plugins, plus the generic retry wrapper.

use crate::{HttpError, Result};
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Connection timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Maximum number of idle connections per host.
    pub pool_max_idle_per_host: usize,

    /// Maximum number of retries for transient errors.
    pub max_retries: u32,

    /// User agent string.
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            pool_max_idle_per_host: 32,
            max_retries: 3,
            user_agent: format!("techwatch/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Create a configured HTTP client with connection pooling.
pub fn create_client(config: &HttpClientConfig) -> Result<Client> {
    ClientBuilder::new()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .pool_idle_timeout(Duration::from_secs(90))
        .user_agent(&config.user_agent)
        .use_rustls_tls()
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .map_err(|e| HttpError::Config(format!("failed to create HTTP client: {e}")))
}

/// Retry a fallible async operation with exponential backoff and jitter.
///
/// Base delay is `2^attempt` seconds (doubled when the prior failure was a
/// 429), jittered to 0.75x-1.25x of that value. Non-retryable errors (see
/// [`HttpError::is_retryable`]) return immediately.
pub async fn with_retry<F, Fut, T>(max_retries: u32, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut last_error = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let was_rate_limited = last_error
                .as_ref()
                .map(HttpError::is_rate_limited)
                .unwrap_or(false);
            let base_secs = 2u64.pow(attempt - 1) * if was_rate_limited { 2 } else { 1 };
            let jitter = 0.75 + rand::random::<f64>() * 0.5;
            let delay_ms = (base_secs as f64 * 1000.0 * jitter) as u64;
            debug!(attempt, delay_ms, "retrying request after backoff");
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if e.is_retryable() && attempt < max_retries {
                    warn!(attempt = attempt + 1, max_retries, error = %e, "request failed, will retry");
                    last_error = Some(e);
                } else {
                    return Err(e);
                }
            }
        }
    }

    Err(last_error.unwrap_or(HttpError::MaxRetriesExceeded(max_retries)))
}
