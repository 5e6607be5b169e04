use aperture_index::TransportError;
use thiserror::Error;

pub type IndexResult<T> = Result<T, IndexError>;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),
    #[error("malformed engine response: {0}")]
    Malformed(String),
    #[error("engine rejected sub-query {index}: {reason}")]
    SubQuery { index: usize, reason: String },
}

impl IndexError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        IndexError::Malformed(reason.into())
    }
}
