//! Structured query construction.

pub mod builder;
pub mod config;
pub mod filters;
pub mod models;

pub use builder::QueryBuilder;
pub use config::{BuildOptions, QueryConfig};
pub use filters::build_param_filters;
pub use models::{BoolQuery, FieldBoost, MultiMatch, QueryNode, StructuredQuery};
