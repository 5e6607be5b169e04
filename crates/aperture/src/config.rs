//! Layered service configuration
//!
//! Defaults, then an optional TOML file, then `APERTURE__SECTION__KEY`
//! environment variables.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use aperture_core::{CoreError, Dictionaries, QueryConfig, RankingConfig, RelevanceEngine};
use aperture_index::{TransportConfig, TransportError};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::recovery::RecoveryConfig;

pub const DEFAULT_CONFIG_FILE: &str = "aperture.toml";
const ENV_PREFIX: &str = "APERTURE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Validation(String),

    #[error("failed to load dictionaries: {0}")]
    Dictionaries(#[from] CoreError),

    #[error("failed to read merchandising rules: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse merchandising rules: {0}")]
    Rules(#[from] serde_json::Error),

    #[error("failed to build index transport: {0}")]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub name: String,
    /// Hits fetched per relevance-sorted query before local rescoring.
    pub rescore_window: usize,
    pub suggest_field: String,
    pub completion_field: String,
    pub slow_query_ms: u64,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            name: "products".to_string(),
            rescore_window: 200,
            suggest_field: "name.trigram".to_string(),
            completion_field: "suggest".to_string(),
            slow_query_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub default_per_page: u32,
    pub max_per_page: u32,
    pub autocomplete_suggestions: usize,
    pub autocomplete_categories: usize,
    pub autocomplete_brands: usize,
    pub autocomplete_products: usize,
    /// Hits rescored before the autocomplete product list is cut.
    pub autocomplete_window: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_per_page: aperture_core::request::DEFAULT_PER_PAGE,
            max_per_page: 100,
            autocomplete_suggestions: 5,
            autocomplete_categories: 5,
            autocomplete_brands: 5,
            autocomplete_products: 6,
            autocomplete_window: 50,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionarySettings {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MerchandisingSettings {
    pub rules_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub transport: TransportConfig,
    pub index: IndexSettings,
    pub search: SearchSettings,
    pub recovery: RecoveryConfig,
    pub ranking: RankingConfig,
    pub query: QueryConfig,
    pub dictionaries: DictionarySettings,
    pub merchandising: MerchandisingSettings,
    pub logging: LoggingSettings,
}

impl AppConfig {
    /// Load from `path`, or from `aperture.toml` in the working directory
    /// when it exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path.to_path_buf()).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config: AppConfig = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let search = &self.search;
        if search.default_per_page == 0 || search.max_per_page == 0 {
            return Err(ConfigError::Validation(
                "page sizes must be greater than 0".to_string(),
            ));
        }
        if search.default_per_page > search.max_per_page {
            return Err(ConfigError::Validation(format!(
                "default_per_page {} exceeds max_per_page {}",
                search.default_per_page, search.max_per_page
            )));
        }
        if self.index.rescore_window < search.max_per_page as usize {
            return Err(ConfigError::Validation(format!(
                "rescore_window {} is smaller than max_per_page {}",
                self.index.rescore_window, search.max_per_page
            )));
        }
        if self.ranking.novelty_scale_days <= 0.0 {
            return Err(ConfigError::Validation(
                "novelty_scale_days must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.recovery.spell_confidence_threshold) {
            return Err(ConfigError::Validation(
                "spell_confidence_threshold must be within 0..=1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn dictionaries(&self) -> Result<Arc<Dictionaries>> {
        match &self.dictionaries.path {
            Some(path) => Ok(Arc::new(Dictionaries::load(path)?)),
            None => Ok(Dictionaries::builtin()),
        }
    }

    pub fn engine(&self) -> Result<RelevanceEngine> {
        Ok(RelevanceEngine::new(
            self.dictionaries()?,
            self.query.clone(),
            self.ranking.clone(),
        ))
    }
}
