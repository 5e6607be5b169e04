use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Map, Value};

use crate::scoring::ScoringFunction;

/// A field name with its relevance boost, rendered as `field^boost`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldBoost {
    pub field: String,
    pub boost: f64,
}

impl FieldBoost {
    pub fn new(field: impl Into<String>, boost: f64) -> Self {
        Self {
            field: field.into(),
            boost,
        }
    }

    pub fn render(&self) -> String {
        if (self.boost - 1.0).abs() < f64::EPSILON {
            self.field.clone()
        } else {
            format!("{}^{}", self.field, self.boost)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    pub must: Vec<QueryNode>,
    pub should: Vec<QueryNode>,
    pub filter: Vec<QueryNode>,
    pub must_not: Vec<QueryNode>,
    pub minimum_should_match: Option<u32>,
    pub boost: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultiMatch {
    pub text: String,
    pub fields: Vec<FieldBoost>,
    pub fuzziness: Option<String>,
    pub prefix_length: Option<u32>,
    pub operator: Option<String>,
    pub boost: Option<f64>,
}

/// Boolean combinators over field-match leaves.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryNode {
    Bool(BoolQuery),
    Term {
        field: String,
        value: Value,
        boost: Option<f64>,
    },
    Terms {
        field: String,
        values: Vec<Value>,
    },
    /// Inclusive bounds.
    Range {
        field: String,
        gte: Option<f64>,
        lte: Option<f64>,
    },
    Phrase {
        field: String,
        text: String,
        slop: Option<u32>,
        boost: Option<f64>,
    },
    MultiMatch(MultiMatch),
    MatchAll,
}

impl QueryNode {
    pub fn term(field: impl Into<String>, value: impl Into<Value>) -> Self {
        QueryNode::Term {
            field: field.into(),
            value: value.into(),
            boost: None,
        }
    }

    pub fn boosted_term(field: impl Into<String>, value: impl Into<Value>, boost: f64) -> Self {
        QueryNode::Term {
            field: field.into(),
            value: value.into(),
            boost: Some(boost),
        }
    }

    pub fn terms<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        QueryNode::Terms {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn range(field: impl Into<String>, gte: Option<f64>, lte: Option<f64>) -> Self {
        QueryNode::Range {
            field: field.into(),
            gte,
            lte,
        }
    }

    pub fn phrase(field: impl Into<String>, text: impl Into<String>) -> Self {
        QueryNode::Phrase {
            field: field.into(),
            text: text.into(),
            slop: None,
            boost: None,
        }
    }

    pub fn phrase_with(
        field: impl Into<String>,
        text: impl Into<String>,
        slop: Option<u32>,
        boost: Option<f64>,
    ) -> Self {
        QueryNode::Phrase {
            field: field.into(),
            text: text.into(),
            slop,
            boost,
        }
    }

    /// Render into the engine's JSON query DSL.
    pub fn to_wire(&self) -> Value {
        match self {
            QueryNode::Bool(query) => {
                let mut body = Map::new();
                for (key, clauses) in [
                    ("must", &query.must),
                    ("should", &query.should),
                    ("filter", &query.filter),
                    ("must_not", &query.must_not),
                ] {
                    if !clauses.is_empty() {
                        body.insert(
                            key.to_string(),
                            Value::Array(clauses.iter().map(QueryNode::to_wire).collect()),
                        );
                    }
                }
                if let Some(minimum) = query.minimum_should_match {
                    body.insert("minimum_should_match".into(), json!(minimum));
                }
                if let Some(boost) = query.boost {
                    body.insert("boost".into(), json!(boost));
                }
                json!({ "bool": body })
            }
            QueryNode::Term {
                field,
                value,
                boost,
            } => {
                let mut inner = Map::new();
                inner.insert("value".into(), value.clone());
                if let Some(boost) = boost {
                    inner.insert("boost".into(), json!(boost));
                }
                json!({ "term": { field.as_str(): inner } })
            }
            QueryNode::Terms { field, values } => json!({ "terms": { field.as_str(): values } }),
            QueryNode::Range { field, gte, lte } => {
                let mut inner = Map::new();
                if let Some(gte) = gte {
                    inner.insert("gte".into(), json!(gte));
                }
                if let Some(lte) = lte {
                    inner.insert("lte".into(), json!(lte));
                }
                json!({ "range": { field.as_str(): inner } })
            }
            QueryNode::Phrase {
                field,
                text,
                slop,
                boost,
            } => {
                let mut inner = Map::new();
                inner.insert("query".into(), json!(text));
                if let Some(slop) = slop {
                    inner.insert("slop".into(), json!(slop));
                }
                if let Some(boost) = boost {
                    inner.insert("boost".into(), json!(boost));
                }
                json!({ "match_phrase": { field.as_str(): inner } })
            }
            QueryNode::MultiMatch(query) => {
                let mut inner = Map::new();
                inner.insert("query".into(), json!(query.text));
                inner.insert(
                    "fields".into(),
                    json!(query.fields.iter().map(FieldBoost::render).collect::<Vec<_>>()),
                );
                if let Some(fuzziness) = &query.fuzziness {
                    inner.insert("fuzziness".into(), json!(fuzziness));
                }
                if let Some(prefix_length) = query.prefix_length {
                    inner.insert("prefix_length".into(), json!(prefix_length));
                }
                if let Some(operator) = &query.operator {
                    inner.insert("operator".into(), json!(operator));
                }
                if let Some(boost) = query.boost {
                    inner.insert("boost".into(), json!(boost));
                }
                json!({ "multi_match": inner })
            }
            QueryNode::MatchAll => json!({ "match_all": {} }),
        }
    }
}

impl Serialize for QueryNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_wire().serialize(serializer)
    }
}

/// Boolean query plus query-specific scoring functions (e.g. the category
/// name-prefix signal).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredQuery {
    pub query: QueryNode,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<ScoringFunction>,
}

impl StructuredQuery {
    pub fn new(query: QueryNode) -> Self {
        Self {
            query,
            functions: Vec::new(),
        }
    }

    pub fn with_function(mut self, function: ScoringFunction) -> Self {
        self.functions.push(function);
        self
    }

    /// Wrap the root in a bool query carrying extra filter and exclusion clauses.
    pub fn constrain(mut self, filters: Vec<QueryNode>, exclusions: Vec<QueryNode>) -> Self {
        if filters.is_empty() && exclusions.is_empty() {
            return self;
        }
        let root = std::mem::replace(&mut self.query, QueryNode::MatchAll);
        self.query = QueryNode::Bool(BoolQuery {
            must: vec![root],
            filter: filters,
            must_not: exclusions,
            ..BoolQuery::default()
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_omits_empty_clauses() {
        let node = QueryNode::Bool(BoolQuery {
            must: vec![QueryNode::term("ean", "5901234123457")],
            minimum_should_match: Some(1),
            ..BoolQuery::default()
        });
        assert_eq!(
            node.to_wire(),
            json!({
                "bool": {
                    "must": [{ "term": { "ean": { "value": "5901234123457" } } }],
                    "minimum_should_match": 1
                }
            })
        );
    }

    #[test]
    fn multi_match_renders_field_boosts() {
        let node = QueryNode::MultiMatch(MultiMatch {
            text: "statyw".into(),
            fields: vec![FieldBoost::new("name", 5.0), FieldBoost::new("description", 1.0)],
            fuzziness: Some("AUTO".into()),
            prefix_length: Some(1),
            operator: Some("and".into()),
            boost: None,
        });
        let wire = node.to_wire();
        assert_eq!(wire["multi_match"]["fields"], json!(["name^5", "description"]));
        assert_eq!(wire["multi_match"]["prefix_length"], 1);
    }

    #[test]
    fn range_renders_only_given_bounds() {
        let wire = QueryNode::range("price", None, Some(500.0)).to_wire();
        assert_eq!(wire, json!({ "range": { "price": { "lte": 500.0 } } }));
    }

    #[test]
    fn constrain_wraps_root() {
        let query = StructuredQuery::new(QueryNode::MatchAll).constrain(
            vec![QueryNode::term("brand", "sony")],
            vec![QueryNode::terms("id", ["p-1"])],
        );
        let wire = query.query.to_wire();
        assert_eq!(wire["bool"]["must"][0], json!({ "match_all": {} }));
        assert_eq!(wire["bool"]["must_not"][0], json!({ "terms": { "id": ["p-1"] } }));
    }
}
