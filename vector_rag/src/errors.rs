use thiserror::Error;

#[derive(Error, Debug)]
pub enum VectorError {
    #[error("Vector store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Invalid vector query: {0}")]
    InvalidQuery(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl VectorError {
    /// Transport-level failures worth another attempt on an idempotent read
    pub fn is_transient(&self) -> bool {
        matches!(self, VectorError::StoreUnavailable(_) | VectorError::Timeout(_))
    }
}

pub type VectorResult<T> = Result<T, VectorError>;
