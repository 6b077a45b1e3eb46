//! Error taxonomy for the HTTP client wrapper.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("transient network error: {0}")]
    Network(reqwest::Error),

    #[error("http {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("max retries ({0}) exceeded")]
    MaxRetriesExceeded(u32),

    #[error("invalid client configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, HttpError>;

impl From<reqwest::Error> for HttpError {
    /// `reqwest::Response::error_for_status` surfaces HTTP error codes as a
    /// `reqwest::Error` carrying a status, not a transport failure; route
    /// those into `Status` so `is_retryable` can tell a 503 from a dropped
    /// connection.
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => HttpError::Status { status: status.as_u16(), body: e.to_string() },
            None => HttpError::Network(e),
        }
    }
}

impl HttpError {
    /// Transient network errors, 5xx, and 429 are retryable; other 4xx are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            HttpError::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            HttpError::Status { status, .. } => *status >= 500 || *status == 429,
            HttpError::Timeout(_) => true,
            HttpError::MaxRetriesExceeded(_) | HttpError::Config(_) => false,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, HttpError::Status { status: 429, .. })
    }
}
