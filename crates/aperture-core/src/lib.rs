//! Aperture Core Library
//!
//! Search relevance for a photo-video equipment catalog, free of any
//! network or storage dependency.
//!
//! # Architecture
//!
//! ```text
//! raw query
//!    │
//!    ▼
//! ┌──────────────────┐   ┌──────────────────────┐
//! │ IntentClassifier │──▶│ ParameterExtractor   │
//! └──────────────────┘   └──────────────────────┘
//!    │ Intent
//!    ▼
//! ┌──────────────────┐
//! │ QueryBuilder     │   per-intent bool query + filters
//! └──────────────────┘
//!    │ StructuredQuery
//!    ▼
//! ┌──────────────────┐
//! │ RankingAssembler │   multiplicative signal envelope
//! └──────────────────┘
//!    │ RankingEnvelope
//!    ▼
//!  executor (provided by the consumer)
//! ```
//!
//! # Modules
//!
//! - [`params`] - structured parameter extraction (aperture, focal length, ...)
//! - [`intent`] - ordered intent cascade and modifier detection
//! - [`query`] - structured query tree and per-intent builder
//! - [`scoring`] / [`ranking`] - per-document signals and the ranking envelope
//! - [`request`] / [`cache_key`] - upstream request model and cache key format
//!
//! # Quick Start
//!
//! ```rust
//! use aperture_core::RelevanceEngine;
//!
//! let engine = RelevanceEngine::default();
//! let intent = engine.classify("sony a7 iv");
//! assert_eq!(intent.name(), "MODEL");
//! assert!(intent.is_body_query());
//! ```

pub mod cache_key;
pub mod dictionaries;
pub mod engine;
pub mod error;
pub mod intent;
pub mod params;
pub mod query;
pub mod ranking;
pub mod request;
pub mod schema;
pub mod scoring;

pub use dictionaries::{Dictionaries, DictionarySource};
pub use engine::{Explanation, RelevanceEngine};
pub use error::{CoreError, Result};
pub use intent::{ConditionPreference, Intent, IntentClassifier, IntentKind};
pub use params::{ExtractedParams, ParamValue, ParameterExtractor};
pub use query::{BuildOptions, QueryBuilder, QueryConfig, QueryNode, StructuredQuery};
pub use ranking::{RankingAssembler, RankingConfig, RankingEnvelope};
pub use request::{SearchFilters, SearchRequest, SortOrder};
pub use scoring::{Document, ScoringFunction};
