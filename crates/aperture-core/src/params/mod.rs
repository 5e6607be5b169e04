//! Structured parameter extraction from free-text queries.

pub mod extractor;
pub mod models;

pub use extractor::{ExtractorRule, ParameterExtractor};
pub use models::{fields, ExtractedParams, ParamValue};
