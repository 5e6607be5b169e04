use std::sync::Arc;

use aperture_core::QueryNode;
use aperture_index::Transport;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::{
    error::{IndexError, IndexResult},
    models::{SearchBody, SearchHits, Suggestion},
    IndexExecutor,
};

const PHRASE_SUGGESTION: &str = "phrase";

/// Executor for Elasticsearch/OpenSearch compatible clusters.
pub struct ElasticExecutor {
    transport: Arc<dyn Transport>,
    index: String,
    suggest_field: String,
}

impl ElasticExecutor {
    pub fn new(transport: Arc<dyn Transport>, index: impl Into<String>) -> Self {
        Self {
            transport,
            index: index.into(),
            suggest_field: "name.trigram".to_string(),
        }
    }

    pub fn with_suggest_field(mut self, field: impl Into<String>) -> Self {
        self.suggest_field = field.into();
        self
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    fn phrase_suggest_body(&self, text: &str) -> SearchBody {
        SearchBody::new(QueryNode::MatchAll)
            .without_hits()
            .with_suggest(json!({
                "text": text,
                PHRASE_SUGGESTION: {
                    "phrase": {
                        "field": self.suggest_field,
                        "size": 1,
                        "gram_size": 3,
                        "direct_generator": [{
                            "field": self.suggest_field,
                            "suggest_mode": "always"
                        }]
                    }
                }
            }))
    }
}

#[async_trait]
impl IndexExecutor for ElasticExecutor {
    async fn search(&self, body: &SearchBody) -> IndexResult<SearchHits> {
        let path = format!("{}/_search", self.index);
        let response = self.transport.post_json(&path, &body.to_wire()).await?;
        let hits = SearchHits::from_response(&response)?;
        debug!(index = %self.index, total = hits.total, returned = hits.hits.len(), "Search executed");
        Ok(hits)
    }

    async fn multi_search(&self, bodies: &[SearchBody]) -> IndexResult<Vec<SearchHits>> {
        if bodies.is_empty() {
            return Ok(Vec::new());
        }
        let header = json!({ "index": self.index });
        let lines: Vec<Value> = bodies
            .iter()
            .flat_map(|body| [header.clone(), body.to_wire()])
            .collect();

        let response = self.transport.post_ndjson("_msearch", &lines).await?;
        let responses = response
            .get("responses")
            .and_then(Value::as_array)
            .ok_or_else(|| IndexError::malformed("multi-search without 'responses'"))?;
        if responses.len() != bodies.len() {
            return Err(IndexError::malformed(format!(
                "multi-search returned {} responses for {} requests",
                responses.len(),
                bodies.len()
            )));
        }

        responses
            .iter()
            .enumerate()
            .map(|(index, entry)| match entry.get("error") {
                Some(error) => Err(IndexError::SubQuery {
                    index,
                    reason: error
                        .get("reason")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| error.to_string()),
                }),
                None => SearchHits::from_response(entry),
            })
            .collect()
    }

    async fn suggest_phrase(&self, text: &str) -> IndexResult<Vec<Suggestion>> {
        let hits = self.search(&self.phrase_suggest_body(text)).await?;
        Ok(hits.suggestions(PHRASE_SUGGESTION).to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aperture_index::{shared_transport, TransportConfig};

    #[test]
    fn phrase_suggest_requests_no_hits() {
        let transport = shared_transport(TransportConfig::default()).unwrap();
        let executor = ElasticExecutor::new(transport, "products").with_suggest_field("name.shingle");
        let wire = executor.phrase_suggest_body("statyf").to_wire();

        assert_eq!(wire["size"], 0);
        assert_eq!(wire["suggest"]["text"], "statyf");
        assert_eq!(wire["suggest"]["phrase"]["phrase"]["field"], "name.shingle");
        assert_eq!(executor.index(), "products");
    }
}
