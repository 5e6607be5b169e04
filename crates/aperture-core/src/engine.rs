use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    dictionaries::Dictionaries,
    intent::{Intent, IntentClassifier},
    query::{BuildOptions, QueryBuilder, QueryConfig, QueryNode, StructuredQuery},
    ranking::{RankingAssembler, RankingConfig, RankingEnvelope},
};

/// Classification, query construction and ranking for one query, bundled
/// for inspection.
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    pub intent: Intent,
    pub query: StructuredQuery,
    pub filters: Vec<QueryNode>,
    pub envelope: RankingEnvelope,
}

/// The relevance pipeline without any I/O.
pub struct RelevanceEngine {
    classifier: IntentClassifier,
    builder: QueryBuilder,
    assembler: RankingAssembler,
}

impl Default for RelevanceEngine {
    fn default() -> Self {
        Self::new(
            Dictionaries::builtin(),
            QueryConfig::default(),
            RankingConfig::default(),
        )
    }
}

impl RelevanceEngine {
    pub fn new(
        dictionaries: Arc<Dictionaries>,
        query_config: QueryConfig,
        ranking_config: RankingConfig,
    ) -> Self {
        Self {
            classifier: IntentClassifier::new(dictionaries),
            builder: QueryBuilder::new(query_config),
            assembler: RankingAssembler::new(ranking_config),
        }
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    pub fn builder(&self) -> &QueryBuilder {
        &self.builder
    }

    pub fn assembler(&self) -> &RankingAssembler {
        &self.assembler
    }

    pub fn classify(&self, text: &str) -> Intent {
        self.classifier.classify(text)
    }

    /// Build and wrap for an already classified intent.
    pub fn assemble(
        &self,
        text: &str,
        intent: &Intent,
        options: &BuildOptions,
        now: DateTime<Utc>,
    ) -> (RankingEnvelope, Vec<QueryNode>) {
        let query = self.builder.build(text, intent, options);
        let filters = self.builder.intent_filters(text, intent);
        (self.assembler.wrap_at(query, Some(intent), now), filters)
    }

    pub fn explain(&self, text: &str) -> Explanation {
        let intent = self.classify(text);
        let query = self
            .builder
            .build(text, &intent, &BuildOptions::default());
        let filters = self.builder.intent_filters(text, &intent);
        let envelope = self.assembler.wrap(query.clone(), Some(&intent));
        Explanation {
            intent,
            query,
            filters,
            envelope,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explain_bundles_every_stage() {
        let explanation = RelevanceEngine::default().explain("obiektyw 50mm f/1.8");
        assert_eq!(explanation.intent.name(), "PARAMETRIC");
        assert_eq!(explanation.filters.len(), 3);
        assert_eq!(explanation.envelope.query, explanation.query.query);

        let json = serde_json::to_value(&explanation).unwrap();
        assert_eq!(json["intent"]["type"], "PARAMETRIC");
        assert_eq!(json["envelope"]["score_mode"], "multiply");
    }
}
