use biograph_models::DatasetError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("NCBI request failed: {0}")]
    Transport(String),

    #[error("NCBI request timed out: {0}")]
    Timeout(String),

    #[error("NCBI returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed NCBI response: {0}")]
    Malformed(String),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

impl CollectorError {
    /// Network failures, throttling and server errors are worth another attempt
    pub fn is_transient(&self) -> bool {
        match self {
            CollectorError::Transport(_) | CollectorError::Timeout(_) => true,
            CollectorError::Api { status, .. } => *status == 429 || *status >= 500,
            CollectorError::Malformed(_) | CollectorError::Dataset(_) => false,
        }
    }
}

pub type CollectorResult<T> = Result<T, CollectorError>;
