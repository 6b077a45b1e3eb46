//! Error types for techwatch-core

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("validation error on field `{field}`: {reason}")]
    Validation { field: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
