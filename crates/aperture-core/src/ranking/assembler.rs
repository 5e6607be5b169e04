use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    intent::{ConditionPreference, Intent},
    query::{QueryNode, StructuredQuery},
    schema::{self, availability, condition},
    scoring::{Document, Fallback, LengthTier, Predicate, ScoringFunction},
};

use super::config::{ConditionWeights, RankingConfig};

pub const MULTIPLY: &str = "multiply";

/// Structured query plus the multiplicative signal stack applied to each hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEnvelope {
    pub query: QueryNode,
    pub functions: Vec<ScoringFunction>,
    pub score_mode: &'static str,
    pub boost_mode: &'static str,
}

/// One signal's contribution to a hit's final score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalFactor {
    pub name: String,
    pub factor: f64,
}

impl RankingEnvelope {
    /// Base relevance multiplied by every signal.
    pub fn score(&self, base: f64, doc: &Document) -> f64 {
        self.functions
            .iter()
            .fold(base, |score, function| score * function.evaluate(doc))
    }

    /// Per-signal factors, in evaluation order.
    pub fn explain(&self, doc: &Document) -> Vec<SignalFactor> {
        self.functions
            .iter()
            .map(|function| SignalFactor {
                name: function.name().to_string(),
                factor: function.evaluate(doc),
            })
            .collect()
    }
}

pub struct RankingAssembler {
    config: RankingConfig,
}

impl Default for RankingAssembler {
    fn default() -> Self {
        Self::new(RankingConfig::default())
    }
}

impl RankingAssembler {
    pub fn new(config: RankingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    pub fn wrap(&self, query: StructuredQuery, intent: Option<&Intent>) -> RankingEnvelope {
        self.wrap_at(query, intent, Utc::now())
    }

    /// Wrap with an explicit novelty origin.
    pub fn wrap_at(
        &self,
        query: StructuredQuery,
        intent: Option<&Intent>,
        now: DateTime<Utc>,
    ) -> RankingEnvelope {
        let StructuredQuery {
            query,
            functions: mut stack,
        } = query;
        stack.extend(self.signals(intent, now));
        RankingEnvelope {
            query,
            functions: stack,
            score_mode: MULTIPLY,
            boost_mode: MULTIPLY,
        }
    }

    fn signals(&self, intent: Option<&Intent>, now: DateTime<Utc>) -> Vec<ScoringFunction> {
        let c = &self.config;
        let mut signals = vec![
            availability_weight(availability::IN_STOCK, c.in_stock_weight),
            availability_weight(availability::BACKORDER, c.backorder_weight),
            availability_weight(availability::OUT_OF_STOCK, c.out_of_stock_weight),
            ScoringFunction::log1p("sales_30d", schema::SALES_30D, c.sales_30d_coefficient),
            ScoringFunction::log1p("sales_365d", schema::SALES_365D, c.sales_365d_coefficient),
            ScoringFunction::Log1p {
                name: "revenue".to_string(),
                field: schema::REVENUE_30D.to_string(),
                coefficient: c.revenue_coefficient,
                fallback: Some(Fallback {
                    field: schema::REVENUE_365D.to_string(),
                    divisor: c.revenue_fallback_divisor,
                }),
            },
            ScoringFunction::linear(
                "popularity",
                schema::POPULARITY_SCORE,
                c.popularity_coefficient,
                true,
            ),
            ScoringFunction::linear(
                "conversion",
                schema::CONVERSION_SCORE,
                c.conversion_coefficient,
                true,
            ),
            ScoringFunction::linear("trending", schema::TRENDING_SCORE, c.trending_coefficient, true),
            ScoringFunction::linear("margin", schema::MARGIN_PCT, c.margin_coefficient, false),
            ScoringFunction::GaussDecay {
                name: "novelty".to_string(),
                field: schema::CREATED_AT.to_string(),
                origin: now,
                scale_days: c.novelty_scale_days,
                decay: c.novelty_decay,
            },
            ScoringFunction::weight("promo", Predicate::is_true(schema::IS_PROMO), c.promo_weight),
            ScoringFunction::RatingCentered {
                name: "rating".to_string(),
                field: schema::AVG_RATING.to_string(),
                count_field: schema::REVIEW_COUNT.to_string(),
                min_count: c.rating_min_reviews,
                center: c.rating_center,
                coefficient: c.rating_coefficient,
            },
            ScoringFunction::weight(
                "no_image",
                Predicate::is_false(schema::HAS_IMAGE),
                c.no_image_weight,
            ),
        ];

        let weights = self.condition_weights(intent.and_then(|intent| intent.condition_pref));
        signals.push(ScoringFunction::weight(
            "condition_new",
            Predicate::equals(schema::CONDITION, condition::NEW),
            weights.new,
        ));
        signals.push(ScoringFunction::weight(
            "condition_used",
            Predicate::equals(schema::CONDITION, condition::USED),
            weights.used,
        ));

        signals.push(ScoringFunction::weight(
            "bestseller",
            Predicate::is_true(schema::IS_BESTSELLER),
            c.bestseller_weight,
        ));
        signals.push(ScoringFunction::weight(
            "highlighted",
            Predicate::is_true(schema::IS_HIGHLIGHTED),
            c.highlighted_weight,
        ));

        if let Some(intent) = intent {
            if intent.is_sku() {
                signals.push(ScoringFunction::LengthTiers {
                    name: "sku_specificity".to_string(),
                    field: schema::NAME.to_string(),
                    tiers: c
                        .sku_length_tiers
                        .iter()
                        .map(|tier| LengthTier {
                            below: tier.below,
                            weight: tier.weight,
                        })
                        .collect(),
                    default: c.sku_length_default,
                });
            }
            signals.extend(self.category_context(intent));
        }

        signals
    }

    pub fn condition_weights(&self, preference: Option<ConditionPreference>) -> ConditionWeights {
        match preference {
            Some(ConditionPreference::Used) => self.config.condition_when_used,
            Some(ConditionPreference::New) => self.config.condition_when_new,
            None => self.config.condition_default,
        }
    }

    fn category_context(&self, intent: &Intent) -> Vec<ScoringFunction> {
        let c = &self.config;
        let category = |name: &str, categories: &[String], weight: f64| {
            ScoringFunction::weight(name, Predicate::one_of(schema::CATEGORY, categories), weight)
        };

        if intent.is_body_query() {
            vec![
                category("context_body", &c.body_categories, c.body_query_body_weight),
                category("context_lens", &c.lens_categories, c.body_query_lens_weight),
                category(
                    "context_accessory",
                    &c.accessory_categories,
                    c.body_query_accessory_weight,
                ),
            ]
        } else if intent.wants_accessories {
            vec![
                category(
                    "context_accessory",
                    &c.accessory_categories,
                    c.accessory_query_accessory_weight,
                ),
                category("context_body", &c.body_categories, c.accessory_query_body_weight),
            ]
        } else {
            Vec::new()
        }
    }
}

fn availability_weight(value: &str, weight: f64) -> ScoringFunction {
    ScoringFunction::weight(
        &format!("availability_{value}"),
        Predicate::equals(schema::AVAILABILITY, value),
        weight,
    )
}
