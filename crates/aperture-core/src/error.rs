//! Core error types

use thiserror::Error;

/// Core result type
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while loading dictionaries or validating upstream requests.
///
/// Classification, extraction, query building and ranking never fail; they
/// are total functions over their inputs.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dictionary parse error: {0}")]
    DictionaryParse(#[from] toml::de::Error),

    #[error("Invalid pattern for '{name}': {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl CoreError {
    pub(crate) fn pattern(name: impl Into<String>, source: regex::Error) -> Self {
        CoreError::InvalidPattern {
            name: name.into(),
            source,
        }
    }
}
