//! Zero-results recovery
//!
//! Runs only after the primary query came back empty. States are tried
//! strictly one after another: spell correction, query relaxation,
//! category fallback, bestsellers. The first one with hits wins. An index
//! failure inside a state just means that state did not succeed.

use std::sync::Arc;

use aperture_core::{
    cache_key::normalize_query,
    schema::{self, availability},
    query::BoolQuery,
    Intent, QueryNode,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    index::{IndexExecutor, IndexResult, SearchBody, SearchHits},
    pipeline::{PipelineRequest, RankedPage, RankedProduct, SearchPipeline},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Suggestions must score strictly above this.
    pub spell_confidence_threshold: f64,
    pub bestseller_count: usize,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            spell_confidence_threshold: 0.5,
            bestseller_count: 24,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackType {
    SpellCorrection,
    QueryRelaxation,
    CategoryFallback,
    Bestsellers,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecoveryOutcome {
    pub products: Vec<RankedProduct>,
    pub total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub did_you_mean: Option<String>,
    pub fallback_type: FallbackType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relaxed_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_category: Option<String>,
}

impl RecoveryOutcome {
    fn from_page(fallback_type: FallbackType, page: RankedPage) -> Self {
        Self {
            products: page.products,
            total: page.total,
            did_you_mean: None,
            fallback_type,
            relaxed_query: None,
            fallback_category: None,
        }
    }
}

/// What the failed primary query looked like.
#[derive(Debug, Clone)]
pub struct RecoveryContext<'a> {
    pub text: &'a str,
    pub intent: &'a Intent,
    /// Caller filters, kept for spell correction and relaxation only.
    pub filters: Vec<QueryNode>,
    /// Blacklist clauses, kept in every state.
    pub exclusions: Vec<QueryNode>,
    pub limit: usize,
}

pub struct RecoveryCascade {
    pipeline: Arc<SearchPipeline>,
    config: RecoveryConfig,
}

impl RecoveryCascade {
    pub fn new(pipeline: Arc<SearchPipeline>, config: RecoveryConfig) -> Self {
        Self { pipeline, config }
    }

    pub fn config(&self) -> &RecoveryConfig {
        &self.config
    }

    fn executor(&self) -> &Arc<dyn IndexExecutor> {
        self.pipeline.executor()
    }

    /// Never fails; the last resort reports `FallbackType::Error` instead.
    pub async fn recover(&self, context: &RecoveryContext<'_>) -> RecoveryOutcome {
        info!(query = context.text, intent = context.intent.name(), "Zero results, starting recovery");

        if let Some(outcome) = self.spell_correction(context).await {
            return outcome;
        }
        if let Some(outcome) = self.relaxation(context).await {
            return outcome;
        }
        if let Some(outcome) = self.category_fallback(context).await {
            return outcome;
        }
        self.bestsellers(context).await
    }

    /// Run `text` as a GENERAL query with the caller's filters.
    async fn run_general(&self, text: &str, context: &RecoveryContext<'_>) -> IndexResult<RankedPage> {
        let intent = Intent::general(text);
        let request = PipelineRequest::new(text, &intent)
            .with_filters(context.filters.clone())
            .with_exclusions(context.exclusions.clone())
            .with_page(0, context.limit);
        self.pipeline.run(&request).await
    }

    async fn spell_correction(&self, context: &RecoveryContext<'_>) -> Option<RecoveryOutcome> {
        let suggestions = match self.executor().suggest_phrase(context.text).await {
            Ok(suggestions) => suggestions,
            Err(error) => {
                warn!(%error, state = "spell_correction", "Recovery state failed");
                return None;
            }
        };

        let original = normalize_query(context.text);
        let best = suggestions.into_iter().next()?;
        if best.score <= self.config.spell_confidence_threshold || normalize_query(&best.text) == original {
            debug!(suggestion = %best.text, score = best.score, "Spell suggestion rejected");
            return None;
        }

        match self.run_general(&best.text, context).await {
            Ok(page) if !page.is_empty() => {
                info!(corrected = %best.text, total = page.total, "Recovered with spell correction");
                let mut outcome = RecoveryOutcome::from_page(FallbackType::SpellCorrection, page);
                outcome.did_you_mean = Some(best.text);
                Some(outcome)
            }
            Ok(_) => None,
            Err(error) => {
                warn!(%error, state = "spell_correction", "Recovery state failed");
                None
            }
        }
    }

    async fn relaxation(&self, context: &RecoveryContext<'_>) -> Option<RecoveryOutcome> {
        let words: Vec<&str> = context.text.split_whitespace().collect();
        for keep in (1..words.len()).rev() {
            let relaxed = words[..keep].join(" ");
            match self.run_general(&relaxed, context).await {
                Ok(page) if !page.is_empty() => {
                    info!(relaxed = %relaxed, total = page.total, "Recovered with query relaxation");
                    let mut outcome = RecoveryOutcome::from_page(FallbackType::QueryRelaxation, page);
                    outcome.relaxed_query = Some(relaxed);
                    return Some(outcome);
                }
                Ok(_) => debug!(relaxed = %relaxed, "Relaxed query still empty"),
                Err(error) => {
                    warn!(%error, state = "query_relaxation", relaxed = %relaxed, "Recovery state failed")
                }
            }
        }
        None
    }

    async fn category_fallback(&self, context: &RecoveryContext<'_>) -> Option<RecoveryOutcome> {
        let category = context.intent.category()?;

        let query = QueryNode::Bool(BoolQuery {
            filter: vec![QueryNode::term(schema::CATEGORY, category)],
            must_not: context.exclusions.clone(),
            ..Default::default()
        });
        let body = SearchBody::new(query)
            .page(0, context.limit)
            .sorted_desc(schema::SALES_30D);

        match self.executor().search(&body).await {
            Ok(hits) if !hits.hits.is_empty() => {
                info!(category, total = hits.total, "Recovered with category fallback");
                let mut outcome =
                    RecoveryOutcome::from_page(FallbackType::CategoryFallback, unranked(hits));
                outcome.fallback_category = Some(category.to_string());
                Some(outcome)
            }
            Ok(_) => None,
            Err(error) => {
                warn!(%error, state = "category_fallback", "Recovery state failed");
                None
            }
        }
    }

    async fn bestsellers(&self, context: &RecoveryContext<'_>) -> RecoveryOutcome {
        let query = QueryNode::Bool(BoolQuery {
            filter: vec![QueryNode::term(schema::AVAILABILITY, availability::IN_STOCK)],
            must_not: context.exclusions.clone(),
            ..Default::default()
        });
        let body = SearchBody::new(query)
            .page(0, self.config.bestseller_count)
            .sorted_desc(schema::SALES_30D);

        match self.executor().search(&body).await {
            Ok(hits) => {
                info!(total = hits.total, "Serving bestsellers");
                RecoveryOutcome::from_page(FallbackType::Bestsellers, unranked(hits))
            }
            Err(error) => {
                warn!(%error, state = "bestsellers", "Recovery exhausted");
                RecoveryOutcome::from_page(FallbackType::Error, RankedPage::default())
            }
        }
    }
}

/// Engine-sorted hits, kept in engine order.
fn unranked(hits: SearchHits) -> RankedPage {
    RankedPage {
        total: hits.total,
        products: hits
            .hits
            .into_iter()
            .map(|hit| RankedProduct {
                id: hit.id,
                score: hit.score,
                source: hit.source,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{Hit, IndexError, Suggestion};
    use aperture_core::RelevanceEngine;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Answers by the multi_match text of each request; records every request.
    #[derive(Default)]
    struct FakeIndex {
        matching: Vec<&'static str>,
        suggestion: Option<(&'static str, f64)>,
        fail_suggest: bool,
        fail_search: bool,
        seen: Mutex<Vec<String>>,
    }

    fn query_text(body: &SearchBody) -> String {
        let wire = body.to_wire().to_string();
        wire.split("\"query\":\"")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .unwrap_or("<filter-only>")
            .to_string()
    }

    #[async_trait]
    impl IndexExecutor for FakeIndex {
        async fn search(&self, body: &SearchBody) -> IndexResult<SearchHits> {
            let text = query_text(body);
            self.seen.lock().push(text.clone());
            if self.fail_search {
                return Err(IndexError::malformed("down"));
            }
            let hit = self.matching.contains(&text.as_str()) || text == "<filter-only>";
            Ok(SearchHits {
                total: hit as u64,
                hits: if hit {
                    vec![Hit {
                        id: "p-1".into(),
                        score: 1.0,
                        source: Default::default(),
                    }]
                } else {
                    Vec::new()
                },
                ..SearchHits::default()
            })
        }

        async fn suggest_phrase(&self, _text: &str) -> IndexResult<Vec<Suggestion>> {
            if self.fail_suggest {
                return Err(IndexError::malformed("suggest down"));
            }
            Ok(self
                .suggestion
                .map(|(text, score)| Suggestion {
                    text: text.to_string(),
                    score,
                })
                .into_iter()
                .collect())
        }
    }

    fn cascade(index: Arc<FakeIndex>) -> RecoveryCascade {
        let pipeline = SearchPipeline::new(Arc::new(RelevanceEngine::default()), index);
        RecoveryCascade::new(Arc::new(pipeline), RecoveryConfig::default())
    }

    fn context<'a>(text: &'a str, intent: &'a Intent) -> RecoveryContext<'a> {
        RecoveryContext {
            text,
            intent,
            filters: Vec::new(),
            exclusions: Vec::new(),
            limit: 24,
        }
    }

    #[tokio::test]
    async fn confident_spelling_fix_wins() {
        let index = Arc::new(FakeIndex {
            matching: vec!["statyw"],
            suggestion: Some(("statyw", 0.9)),
            ..Default::default()
        });
        let intent = Intent::general("statyf");
        let outcome = cascade(index).recover(&context("statyf", &intent)).await;

        assert_eq!(outcome.fallback_type, FallbackType::SpellCorrection);
        assert_eq!(outcome.did_you_mean.as_deref(), Some("statyw"));
    }

    #[tokio::test]
    async fn weak_suggestion_falls_through_to_relaxation() {
        let index = Arc::new(FakeIndex {
            matching: vec!["statyw"],
            suggestion: Some(("statyw", 0.5)),
            ..Default::default()
        });
        let intent = Intent::general("statyw xyz");
        let outcome = cascade(index).recover(&context("statyw xyz", &intent)).await;

        assert_eq!(outcome.fallback_type, FallbackType::QueryRelaxation);
        assert_eq!(outcome.relaxed_query.as_deref(), Some("statyw"));
    }

    #[tokio::test]
    async fn suggest_failure_is_not_fatal() {
        let index = Arc::new(FakeIndex {
            matching: vec!["statyw"],
            fail_suggest: true,
            ..Default::default()
        });
        let intent = Intent::general("statyw abc");
        let outcome = cascade(index).recover(&context("statyw abc", &intent)).await;
        assert_eq!(outcome.fallback_type, FallbackType::QueryRelaxation);
    }

    #[tokio::test]
    async fn index_outage_degrades_to_error_outcome() {
        let index = Arc::new(FakeIndex {
            fail_search: true,
            fail_suggest: true,
            ..Default::default()
        });
        let intent = Intent::general("a b c");
        let outcome = cascade(index.clone()).recover(&context("a b c", &intent)).await;

        assert_eq!(outcome.fallback_type, FallbackType::Error);
        assert!(outcome.products.is_empty());
        // two relaxations plus the bestseller query
        assert_eq!(index.seen.lock().len(), 3);
    }

    #[test]
    fn outcome_serializes_snake_case() {
        let outcome = RecoveryOutcome::from_page(FallbackType::CategoryFallback, RankedPage::default());
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["fallback_type"], "category_fallback");
        assert!(json.get("did_you_mean").is_none());
    }
}
