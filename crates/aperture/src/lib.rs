//! Aperture search service
//!
//! Connects the relevance engine in [`aperture_core`] to a retrieval cluster:
//!
//! - [`index`] - the [`IndexExecutor`] port and its Elasticsearch executor
//! - [`pipeline`] - build, rank, execute and rescore one query
//! - [`recovery`] - fallback cascade for queries with no matches
//! - [`coordinator`] - search and autocomplete entry points
//! - [`merchandising`] - pinned and blacklisted products
//! - [`config`] / [`telemetry`] - layered configuration and log setup

pub mod config;
pub mod coordinator;
pub mod error;
pub mod index;
pub mod merchandising;
pub mod pipeline;
pub mod recovery;
pub mod telemetry;

pub use config::{AppConfig, ConfigError};
pub use coordinator::{AutocompleteResponse, SearchCoordinator, SearchResponse};
pub use error::{Result, SearchError};
pub use index::{ElasticExecutor, IndexError, IndexExecutor, SearchBody, SearchHits};
pub use merchandising::{MerchandisingRules, RuleStore};
pub use pipeline::{PipelineRequest, RankedPage, RankedProduct, SearchPipeline};
pub use recovery::{FallbackType, RecoveryCascade, RecoveryConfig, RecoveryOutcome};
