use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use aperture_core::{cache_key, schema, Intent, QueryNode, RelevanceEngine, SearchRequest};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use crate::{
    config::{self, AppConfig, SearchSettings},
    error::Result,
    index::{Bucket, ElasticExecutor, IndexError, IndexExecutor, SearchBody},
    merchandising::{MerchandisingRules, RuleStore},
    pipeline::{PipelineRequest, RankedProduct, SearchPipeline},
    recovery::{FallbackType, RecoveryCascade, RecoveryContext},
};

const COMPLETION: &str = "completion";
const CATEGORIES: &str = "categories";
const BRANDS: &str = "brands";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub intent: Intent,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub products: Vec<RankedProduct>,
    pub cache_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_type: Option<FallbackType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub did_you_mean: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relaxed_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_category: Option<String>,
    pub took_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AutocompleteResponse {
    pub query: String,
    pub suggestions: Vec<String>,
    pub categories: Vec<Bucket>,
    pub brands: Vec<Bucket>,
    pub products: Vec<RankedProduct>,
    pub cache_key: String,
}

/// Entry point for search and autocomplete requests.
pub struct SearchCoordinator {
    pipeline: Arc<SearchPipeline>,
    recovery: RecoveryCascade,
    rules: Arc<RuleStore>,
    settings: SearchSettings,
    completion_field: String,
}

impl SearchCoordinator {
    /// Wire everything from configuration, talking to the configured cluster.
    pub fn from_config(config: &AppConfig) -> config::Result<Self> {
        let transport = aperture_index::shared_transport(config.transport.clone())?;
        let executor = ElasticExecutor::new(transport, config.index.name.clone())
            .with_suggest_field(config.index.suggest_field.clone());

        let rules = match &config.merchandising.rules_path {
            Some(path) => MerchandisingRules::load(path)?,
            None => MerchandisingRules::default(),
        };

        Ok(Self::with_executor(config, Arc::new(config.engine()?), Arc::new(executor), rules))
    }

    /// Configuration-driven wiring over any executor.
    pub fn with_executor(
        config: &AppConfig,
        engine: Arc<RelevanceEngine>,
        executor: Arc<dyn IndexExecutor>,
        rules: MerchandisingRules,
    ) -> Self {
        let pipeline = Arc::new(
            SearchPipeline::new(engine, executor)
                .with_rescore_window(config.index.rescore_window)
                .with_slow_query_threshold(Duration::from_millis(config.index.slow_query_ms)),
        );
        Self {
            recovery: RecoveryCascade::new(Arc::clone(&pipeline), config.recovery.clone()),
            pipeline,
            rules: Arc::new(RuleStore::new(rules)),
            settings: config.search.clone(),
            completion_field: config.index.completion_field.clone(),
        }
    }

    pub fn rules(&self) -> &Arc<RuleStore> {
        &self.rules
    }

    pub fn engine(&self) -> &RelevanceEngine {
        self.pipeline.engine()
    }

    pub async fn search(&self, request: SearchRequest) -> Result<SearchResponse> {
        request.validate(self.settings.max_per_page)?;
        let start = Instant::now();

        let intent = self.engine().classify(&request.query);
        let rules = self.rules.snapshot();
        let filters = request.filters.to_nodes();
        let exclusions = rules.exclusions();
        debug!(query = %request.query, intent = intent.name(), "Search classified");

        let primary = PipelineRequest::new(&request.query, &intent)
            .with_filters(filters.clone())
            .with_exclusions(exclusions.clone())
            .with_sort(request.sort)
            .with_page(request.offset(), request.per_page as usize);
        let page = self.pipeline.run(&primary).await?;

        let mut response = SearchResponse {
            query: request.query.clone(),
            intent: intent.clone(),
            total: page.total,
            page: request.page,
            per_page: request.per_page,
            products: page.products,
            cache_key: cache_key::search_key(&request),
            fallback_type: None,
            did_you_mean: None,
            relaxed_query: None,
            fallback_category: None,
            took_ms: 0,
        };

        if response.total == 0 {
            let outcome = self
                .recovery
                .recover(&RecoveryContext {
                    text: &request.query,
                    intent: &intent,
                    filters,
                    exclusions,
                    limit: request.per_page as usize,
                })
                .await;
            response.total = outcome.total;
            response.products = outcome.products;
            response.fallback_type = Some(outcome.fallback_type);
            response.did_you_mean = outcome.did_you_mean;
            response.relaxed_query = outcome.relaxed_query;
            response.fallback_category = outcome.fallback_category;
        }

        rules.apply_pins(&request.query, &mut response.products);
        response.took_ms = start.elapsed().as_millis() as u64;
        info!(
            query = %request.query,
            intent = intent.name(),
            total = response.total,
            fallback = ?response.fallback_type,
            took_ms = response.took_ms,
            "Search completed"
        );
        Ok(response)
    }

    /// Completion suggestions, category and brand facets and top products,
    /// fetched in one multi-search round trip.
    pub async fn autocomplete(&self, text: &str) -> Result<AutocompleteResponse> {
        let normalized = cache_key::normalize_query(text);
        let mut response = AutocompleteResponse {
            query: text.to_string(),
            cache_key: cache_key::autocomplete_key(text),
            ..AutocompleteResponse::default()
        };
        if normalized.is_empty() {
            return Ok(response);
        }

        let settings = &self.settings;
        let intent = self.engine().classify(text);
        let rules = self.rules.snapshot();
        let request = PipelineRequest::new(text, &intent)
            .with_exclusions(rules.exclusions())
            .with_page(0, settings.autocomplete_products)
            .with_rescore_window(settings.autocomplete_window.max(settings.autocomplete_products));
        let prepared = self.pipeline.prepare(&request, Utc::now());

        let bodies = [
            SearchBody::new(QueryNode::MatchAll)
                .without_hits()
                .with_suggest(json!({
                    COMPLETION: {
                        "prefix": normalized,
                        "completion": {
                            "field": self.completion_field,
                            "size": settings.autocomplete_suggestions,
                            "skip_duplicates": true
                        }
                    }
                })),
            SearchBody::new(prepared.body.query.clone())
                .without_hits()
                .with_aggs(terms_agg(CATEGORIES, schema::CATEGORY, settings.autocomplete_categories)),
            SearchBody::new(prepared.body.query.clone())
                .without_hits()
                .with_aggs(terms_agg(BRANDS, schema::BRAND, settings.autocomplete_brands)),
            prepared.body.clone(),
        ];

        let mut results = self.pipeline.executor().multi_search(&bodies).await?.into_iter();
        let (Some(completion), Some(categories), Some(brands), Some(products)) =
            (results.next(), results.next(), results.next(), results.next())
        else {
            return Err(IndexError::malformed("multi-search returned too few responses").into());
        };

        for suggestion in completion.suggestions(COMPLETION) {
            if !response.suggestions.contains(&suggestion.text) {
                response.suggestions.push(suggestion.text.clone());
            }
        }
        response.categories = categories.buckets(CATEGORIES).to_vec();
        response.brands = brands.buckets(BRANDS).to_vec();
        response.products = self.pipeline.finish(&prepared, products).products;
        rules.apply_pins(text, &mut response.products);

        debug!(
            query = %text,
            intent = intent.name(),
            suggestions = response.suggestions.len(),
            products = response.products.len(),
            "Autocomplete completed"
        );
        Ok(response)
    }
}

fn terms_agg(name: &str, field: &str, size: usize) -> serde_json::Value {
    json!({ name: { "terms": { "field": field, "size": size } } })
}
