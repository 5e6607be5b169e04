//! Build → rank → execute → rescore for one query.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use aperture_core::{
    BuildOptions, Document, Intent, QueryNode, RankingEnvelope, RelevanceEngine, SortOrder,
    StructuredQuery,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::index::{IndexExecutor, IndexResult, SearchBody, SearchHits};

/// One ranked product with its stored fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedProduct {
    pub id: String,
    pub score: f64,
    #[serde(flatten)]
    pub source: Document,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RankedPage {
    pub total: u64,
    pub products: Vec<RankedProduct>,
}

impl RankedPage {
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// Everything the pipeline needs for one execution.
#[derive(Debug, Clone)]
pub struct PipelineRequest<'a> {
    pub text: &'a str,
    pub intent: &'a Intent,
    /// Caller filters, added to the intent's own filters.
    pub filters: Vec<QueryNode>,
    pub exclusions: Vec<QueryNode>,
    pub sort: SortOrder,
    pub offset: usize,
    pub limit: usize,
    pub options: BuildOptions,
    /// Overrides the pipeline's rescore window.
    pub rescore_window: Option<usize>,
}

impl<'a> PipelineRequest<'a> {
    pub fn new(text: &'a str, intent: &'a Intent) -> Self {
        Self {
            text,
            intent,
            filters: Vec::new(),
            exclusions: Vec::new(),
            sort: SortOrder::Relevance,
            offset: 0,
            limit: aperture_core::request::DEFAULT_PER_PAGE as usize,
            options: BuildOptions::default(),
            rescore_window: None,
        }
    }

    pub fn with_filters(mut self, filters: Vec<QueryNode>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_exclusions(mut self, exclusions: Vec<QueryNode>) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    pub fn with_rescore_window(mut self, window: usize) -> Self {
        self.rescore_window = Some(window);
        self
    }
}

/// A request body plus what to do with its hits.
#[derive(Debug, Clone)]
pub struct PreparedSearch {
    pub body: SearchBody,
    pub envelope: RankingEnvelope,
    /// Relevance order is decided locally from the envelope.
    pub rescore: bool,
    /// Hits skipped after rescoring.
    pub skip: usize,
    pub take: usize,
}

pub struct SearchPipeline {
    engine: Arc<RelevanceEngine>,
    executor: Arc<dyn IndexExecutor>,
    rescore_window: usize,
    slow_query: Duration,
}

impl SearchPipeline {
    pub fn new(engine: Arc<RelevanceEngine>, executor: Arc<dyn IndexExecutor>) -> Self {
        Self {
            engine,
            executor,
            rescore_window: 200,
            slow_query: Duration::from_millis(500),
        }
    }

    pub fn with_rescore_window(mut self, window: usize) -> Self {
        self.rescore_window = window;
        self
    }

    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query = threshold;
        self
    }

    pub fn engine(&self) -> &RelevanceEngine {
        &self.engine
    }

    pub fn executor(&self) -> &Arc<dyn IndexExecutor> {
        &self.executor
    }

    pub fn prepare(&self, request: &PipelineRequest<'_>, now: DateTime<Utc>) -> PreparedSearch {
        let (mut envelope, mut filters) =
            self.engine
                .assemble(request.text, request.intent, &request.options, now);
        filters.extend(request.filters.iter().cloned());

        let root = std::mem::replace(&mut envelope.query, QueryNode::MatchAll);
        envelope.query = StructuredQuery::new(root)
            .constrain(filters, request.exclusions.clone())
            .query;
        let body = SearchBody::new(envelope.query.clone());
        let window = request.rescore_window.unwrap_or(self.rescore_window);

        match request.sort.sort_clause() {
            Some(clause) => PreparedSearch {
                body: body
                    .page(request.offset, request.limit)
                    .sorted(Some(clause)),
                envelope,
                rescore: false,
                skip: 0,
                take: request.limit,
            },
            None if request.offset + request.limit <= window => PreparedSearch {
                body: body.page(0, window),
                envelope,
                rescore: true,
                skip: request.offset,
                take: request.limit,
            },
            // Deep pages fall back to engine order, rescored within the page only.
            None => PreparedSearch {
                body: body.page(request.offset, request.limit),
                envelope,
                rescore: true,
                skip: 0,
                take: request.limit,
            },
        }
    }

    pub fn finish(&self, prepared: &PreparedSearch, hits: SearchHits) -> RankedPage {
        let mut products: Vec<RankedProduct> = hits
            .hits
            .into_iter()
            .map(|hit| {
                let score = if prepared.rescore {
                    prepared.envelope.score(hit.score, &hit.source)
                } else {
                    hit.score
                };
                RankedProduct {
                    id: hit.id,
                    score,
                    source: hit.source,
                }
            })
            .collect();

        if prepared.rescore {
            products.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        }

        RankedPage {
            total: hits.total,
            products: products
                .into_iter()
                .skip(prepared.skip)
                .take(prepared.take)
                .collect(),
        }
    }

    pub async fn run(&self, request: &PipelineRequest<'_>) -> IndexResult<RankedPage> {
        let prepared = self.prepare(request, Utc::now());
        let start = Instant::now();
        let hits = self.executor.search(&prepared.body).await?;

        let elapsed = start.elapsed();
        if elapsed > self.slow_query {
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                intent = request.intent.name(),
                query = request.text,
                "Slow index query"
            );
        } else {
            debug!(
                elapsed_ms = elapsed.as_millis() as u64,
                intent = request.intent.name(),
                total = hits.total,
                "Index query completed"
            );
        }

        Ok(self.finish(&prepared, hits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{Hit, IndexError, Suggestion};
    use async_trait::async_trait;
    use serde_json::json;

    struct NoopExecutor;

    #[async_trait]
    impl IndexExecutor for NoopExecutor {
        async fn search(&self, _body: &SearchBody) -> IndexResult<SearchHits> {
            Err(IndexError::malformed("unused"))
        }

        async fn suggest_phrase(&self, _text: &str) -> IndexResult<Vec<Suggestion>> {
            Ok(Vec::new())
        }
    }

    fn pipeline() -> SearchPipeline {
        SearchPipeline::new(Arc::new(RelevanceEngine::default()), Arc::new(NoopExecutor))
            .with_rescore_window(50)
    }

    fn hit(id: &str, score: f64, source: serde_json::Value) -> Hit {
        Hit {
            id: id.to_string(),
            score,
            source: source.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn relevance_fetches_the_rescore_window() {
        let pipeline = pipeline();
        let intent = pipeline.engine().classify("statyw");
        let request = PipelineRequest::new("statyw", &intent).with_page(24, 24);
        let prepared = pipeline.prepare(&request, Utc::now());

        assert!(prepared.rescore);
        assert_eq!(prepared.body.from, 0);
        assert_eq!(prepared.body.size, 50);
        assert_eq!((prepared.skip, prepared.take), (24, 24));
        assert!(prepared.body.sort.is_none());
    }

    #[test]
    fn deep_pages_are_paged_by_the_engine() {
        let pipeline = pipeline();
        let intent = pipeline.engine().classify("statyw");
        let request = PipelineRequest::new("statyw", &intent).with_page(48, 24);
        let prepared = pipeline.prepare(&request, Utc::now());

        assert_eq!(prepared.body.from, 48);
        assert_eq!(prepared.body.size, 24);
        assert_eq!(prepared.skip, 0);
    }

    #[test]
    fn explicit_sort_skips_rescoring() {
        let pipeline = pipeline();
        let intent = pipeline.engine().classify("statyw");
        let request = PipelineRequest::new("statyw", &intent).with_sort(SortOrder::PriceAsc);
        let prepared = pipeline.prepare(&request, Utc::now());

        assert!(!prepared.rescore);
        assert_eq!(prepared.body.sort, SortOrder::PriceAsc.sort_clause());
    }

    #[test]
    fn filters_and_exclusions_wrap_the_query() {
        let pipeline = pipeline();
        let intent = pipeline.engine().classify("statyw");
        let request = PipelineRequest::new("statyw", &intent)
            .with_filters(vec![QueryNode::term("brand", "manfrotto")])
            .with_exclusions(vec![QueryNode::terms("id", ["p-9"])]);
        let wire = pipeline.prepare(&request, Utc::now()).body.to_wire();

        assert_eq!(
            wire["query"]["bool"]["filter"][0],
            json!({ "term": { "brand": { "value": "manfrotto" } } })
        );
        assert_eq!(wire["query"]["bool"]["must_not"][0], json!({ "terms": { "id": ["p-9"] } }));
    }

    #[test]
    fn rescoring_reorders_by_signals_then_id() {
        let pipeline = pipeline();
        let intent = Intent::general("statyw");
        let request = PipelineRequest::new("statyw", &intent).with_page(0, 2);
        let prepared = pipeline.prepare(&request, Utc::now());

        let hits = SearchHits {
            total: 3,
            hits: vec![
                hit("b", 2.0, json!({ "availability": "out_of_stock" })),
                hit("c", 1.0, json!({ "availability": "in_stock", "sales_30d": 40 })),
                hit("a", 1.0, json!({ "availability": "in_stock", "sales_30d": 40 })),
            ],
            ..SearchHits::default()
        };
        let page = pipeline.finish(&prepared, hits);

        assert_eq!(page.total, 3);
        let ids: Vec<_> = page.products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
    }
}
