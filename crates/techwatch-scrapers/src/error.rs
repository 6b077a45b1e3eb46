//! Per-source failure taxonomy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("http error: {0}")]
    Http(#[from] techwatch_http::HttpError),

    #[error("invalid plugin configuration: {0}")]
    Config(String),

    #[error("upstream parse error: {0}")]
    Parse(String),

    #[error("quota exhausted for this source")]
    QuotaExhausted,
}

pub type Result<T> = std::result::Result<T, PluginError>;
