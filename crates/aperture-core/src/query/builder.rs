use tracing::debug;

use crate::{
    intent::{BrandIntent, CategoryIntent, CompoundIntent, Intent, IntentKind, ModelIntent},
    params::ParameterExtractor,
    schema,
    scoring::{Predicate, ScoringFunction},
};

use super::{
    config::{BuildOptions, QueryConfig},
    filters::build_param_filters,
    models::{BoolQuery, FieldBoost, MultiMatch, QueryNode, StructuredQuery},
};

/// Builds the structured retrieval query for a classified intent.
pub struct QueryBuilder {
    config: QueryConfig,
    extractor: ParameterExtractor,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new(QueryConfig::default())
    }
}

impl QueryBuilder {
    pub fn new(config: QueryConfig) -> Self {
        Self {
            config,
            extractor: ParameterExtractor::new(),
        }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Build the query for `text` under `intent`.
    ///
    /// # Panics
    ///
    /// Panics on a `COMPOUND` intent without a detected category.
    pub fn build(&self, text: &str, intent: &Intent, options: &BuildOptions) -> StructuredQuery {
        let text = text.trim();
        debug!(intent = intent.name(), query = %text, "Building structured query");

        match &intent.kind {
            IntentKind::Ean { query } => self.ean(query),
            IntentKind::Sku { query } => self.sku(query),
            IntentKind::Model(model) if intent.wants_accessories => {
                self.model_accessories(text, model, options)
            }
            IntentKind::Model(model) => self.model(text, model, options),
            IntentKind::Brand(brand) => self.brand(text, brand, options),
            IntentKind::Compound(compound) => self.compound(compound, options),
            IntentKind::Parametric { .. } => {
                let residual = self.extractor.strip_matched_spans(text);
                StructuredQuery::new(self.text_match(&residual, options))
            }
            IntentKind::Category(category) => self.category(category),
            IntentKind::Price(price) => StructuredQuery::new(self.text_match(&price.query, options)),
            IntentKind::General { .. } => {
                let residual = if self.extractor.has_structured_params(text) {
                    self.extractor.strip_matched_spans(text)
                } else {
                    text.to_string()
                };
                StructuredQuery::new(self.text_match(&residual, options))
            }
        }
    }

    /// Filters implied by the intent itself, applied by the caller.
    pub fn intent_filters(&self, text: &str, intent: &Intent) -> Vec<QueryNode> {
        match &intent.kind {
            IntentKind::Parametric { .. } => build_param_filters(&self.extractor.extract(text)),
            IntentKind::Price(price) => price
                .max_price
                .map(|max| vec![QueryNode::range(schema::PRICE, None, Some(max))])
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// Fuzzy multi-field match; empty text matches everything.
    pub fn text_match(&self, text: &str, options: &BuildOptions) -> QueryNode {
        let text = text.trim();
        if text.is_empty() {
            return QueryNode::MatchAll;
        }
        QueryNode::MultiMatch(self.multi_match(text, self.config.text_fields.clone(), options))
    }

    fn multi_match(&self, text: &str, fields: Vec<FieldBoost>, options: &BuildOptions) -> MultiMatch {
        MultiMatch {
            text: text.to_string(),
            fields,
            fuzziness: Some(
                options
                    .fuzziness
                    .clone()
                    .unwrap_or_else(|| self.config.fuzziness.clone()),
            ),
            prefix_length: Some(options.prefix_length.unwrap_or(self.config.prefix_length)),
            operator: Some(self.config.operator.clone()),
            boost: None,
        }
    }

    fn ean(&self, code: &str) -> StructuredQuery {
        let should = self
            .config
            .ean_fields
            .iter()
            .map(|field| QueryNode::term(field, code))
            .collect();
        StructuredQuery::new(QueryNode::Bool(BoolQuery {
            should,
            minimum_should_match: Some(1),
            ..BoolQuery::default()
        }))
    }

    fn sku(&self, code: &str) -> StructuredQuery {
        let mut variants = vec![code.to_string(), code.to_uppercase(), code.to_lowercase()];
        variants.sort();
        variants.dedup();

        let mut should = Vec::new();
        for field in &self.config.sku_fields {
            should.push(QueryNode::term(field, code));
            for variant in &variants {
                should.push(QueryNode::boosted_term(field, variant.as_str(), self.config.sku_boost));
            }
        }
        should.push(QueryNode::phrase_with(
            schema::NAME,
            code,
            None,
            Some(self.config.sku_phrase_boost),
        ));

        StructuredQuery::new(QueryNode::Bool(BoolQuery {
            should,
            minimum_should_match: Some(1),
            ..BoolQuery::default()
        }))
    }

    /// Condition words only reweight ranking, so matching uses the stripped model text.
    fn model(&self, text: &str, model: &ModelIntent, options: &BuildOptions) -> StructuredQuery {
        let config = &self.config;
        let text = match model.model_query.trim() {
            "" => text,
            model_query => model_query,
        };
        StructuredQuery::new(QueryNode::Bool(BoolQuery {
            must: vec![self.text_match(text, options)],
            should: vec![
                QueryNode::phrase_with(schema::NAME, text, None, Some(config.phrase_boost)),
                QueryNode::phrase_with(
                    schema::NAME,
                    text,
                    Some(config.phrase_slop),
                    Some(config.slop_phrase_boost),
                ),
                QueryNode::phrase_with(schema::MODEL_CODE, text, None, Some(config.model_code_boost)),
                QueryNode::boosted_term(schema::BRAND, model.brand.as_str(), config.brand_boost),
            ],
            ..BoolQuery::default()
        }))
    }

    /// Accessories for a named model: the model may appear in name or
    /// description, the residual keyword boosts.
    fn model_accessories(
        &self,
        text: &str,
        model: &ModelIntent,
        options: &BuildOptions,
    ) -> StructuredQuery {
        let model_name = QueryNode::Bool(BoolQuery {
            should: vec![
                QueryNode::phrase(schema::NAME, model.model_query.as_str()),
                QueryNode::phrase(schema::DESCRIPTION, model.model_query.as_str()),
            ],
            minimum_should_match: Some(1),
            ..BoolQuery::default()
        });

        let filter = model
            .accessory_category
            .iter()
            .map(|category| QueryNode::term(schema::CATEGORY, category.as_str()))
            .collect();

        let residual = accessory_residual(text, &model.model_query);
        let should = if residual.is_empty() {
            Vec::new()
        } else {
            let mut residual_match =
                self.multi_match(&residual, self.config.text_fields.clone(), options);
            residual_match.boost = Some(self.config.accessory_residual_boost);
            vec![QueryNode::MultiMatch(residual_match)]
        };

        StructuredQuery::new(QueryNode::Bool(BoolQuery {
            must: vec![model_name],
            should,
            filter,
            ..BoolQuery::default()
        }))
    }

    fn brand(&self, text: &str, brand: &BrandIntent, options: &BuildOptions) -> StructuredQuery {
        StructuredQuery::new(QueryNode::Bool(BoolQuery {
            should: vec![
                QueryNode::boosted_term(
                    schema::BRAND,
                    brand.brand.as_str(),
                    self.config.brand_exact_boost,
                ),
                self.text_match(text, options),
            ],
            minimum_should_match: Some(1),
            ..BoolQuery::default()
        }))
    }

    fn compound(&self, compound: &CompoundIntent, options: &BuildOptions) -> StructuredQuery {
        assert!(
            !compound.detected_category.trim().is_empty(),
            "COMPOUND intent requires a detected category"
        );

        let mut filter = vec![QueryNode::term(
            schema::CATEGORY,
            compound.detected_category.as_str(),
        )];
        if compound.compatibility_mode {
            if let Some(mounts) = compound.compat_mounts.as_ref().filter(|m| !m.is_empty()) {
                filter.push(QueryNode::terms(
                    crate::params::fields::MOUNT,
                    mounts.iter().map(String::as_str),
                ));
            }
        }

        let text = compound.text_query.trim();
        let mut should = Vec::new();
        if !text.is_empty() {
            should.push(QueryNode::phrase_with(
                schema::NAME,
                text,
                Some(self.config.compound_slop),
                None,
            ));
            should.push(self.text_match(text, options));
        }
        if !compound.compatibility_mode {
            if let Some(brand) = &compound.brand {
                should.push(QueryNode::boosted_term(
                    schema::BRAND,
                    brand.as_str(),
                    self.config.brand_boost,
                ));
            }
        }

        StructuredQuery::new(QueryNode::Bool(BoolQuery {
            must: vec![QueryNode::MatchAll],
            should,
            filter,
            ..BoolQuery::default()
        }))
    }

    fn category(&self, category: &CategoryIntent) -> StructuredQuery {
        // The prefix is the query as typed, usually the plural ("statywy"), so
        // singular product names ("Statyw ...") only match when typed that way.
        let term = category.query.trim().to_lowercase();
        StructuredQuery::new(QueryNode::Bool(BoolQuery {
            must: vec![QueryNode::MatchAll],
            filter: vec![QueryNode::term(schema::CATEGORY, category.category.as_str())],
            ..BoolQuery::default()
        }))
        .with_function(ScoringFunction::weight(
            "category_name_prefix",
            Predicate::StartsWith {
                field: schema::NAME.to_string(),
                prefix: term,
            },
            self.config.category_name_prefix_weight,
        ))
        .with_function(ScoringFunction::weight(
            "residual_category",
            Predicate::ContainsAny {
                field: schema::CATEGORY_PATH.to_string(),
                needles: self.config.residual_category_markers.clone(),
            },
            self.config.residual_category_weight,
        ))
    }
}

/// Query text with the model substring removed, lowercase and collapsed.
fn accessory_residual(text: &str, model_query: &str) -> String {
    let lower = text.to_lowercase();
    let model_query = model_query.trim().to_lowercase();
    let without_model = if model_query.is_empty() {
        lower
    } else {
        lower.replacen(&model_query, " ", 1)
    };
    without_model.split_whitespace().collect::<Vec<_>>().join(" ")
}
