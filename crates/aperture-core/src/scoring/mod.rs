//! Per-document scoring primitives.
//!
//! Signals that a search engine would run as embedded scripts are ordinary
//! functions here, evaluated over a hit's stored fields.

pub mod document;
pub mod functions;
pub mod predicates;

pub use document::Document;
pub use functions::{Fallback, LengthTier, ScoringFunction};
pub use predicates::Predicate;
