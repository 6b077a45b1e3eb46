//! Error taxonomy for the scoring engine and its storage-backed services.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("storage error: {0}")]
    Storage(#[from] techwatch_storage::StorageError),
}

pub type Result<T> = std::result::Result<T, ScoringError>;
