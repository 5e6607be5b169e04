use aperture_core::CoreError;
use thiserror::Error;

use crate::index::IndexError;

/// Failures surfaced to the caller of a search.
///
/// Zero matches is never one of them; recovery handles that.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] CoreError),

    #[error("index execution failed: {0}")]
    Index(#[from] IndexError),
}

pub type Result<T> = std::result::Result<T, SearchError>;
