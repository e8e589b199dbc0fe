use thiserror::Error;

use saju_core::error::SajuError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    Invalid(String),
}

impl From<StoreError> for SajuError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => SajuError::NotFound(what),
            StoreError::Invalid(what) => SajuError::Validation(what),
            other => SajuError::Internal(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
