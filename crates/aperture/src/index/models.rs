use std::collections::BTreeMap;

use aperture_core::{schema, Document, QueryNode};
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

use super::error::{IndexError, IndexResult};

/// One request body for the engine's `_search` endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchBody {
    pub query: QueryNode,
    pub sort: Option<Value>,
    pub size: usize,
    pub from: usize,
    pub source: Vec<String>,
    pub aggs: Option<Value>,
    pub suggest: Option<Value>,
}

impl SearchBody {
    pub fn new(query: QueryNode) -> Self {
        Self {
            query,
            sort: None,
            size: 10,
            from: 0,
            source: schema::SOURCE_FIELDS.iter().map(|f| f.to_string()).collect(),
            aggs: None,
            suggest: None,
        }
    }

    pub fn page(mut self, from: usize, size: usize) -> Self {
        self.from = from;
        self.size = size;
        self
    }

    pub fn sorted(mut self, sort: Option<Value>) -> Self {
        self.sort = sort;
        self
    }

    /// Sort clause `[{field: {order: desc}}]`.
    pub fn sorted_desc(self, field: &str) -> Self {
        self.sorted(Some(json!([{ field: { "order": "desc" } }])))
    }

    pub fn with_aggs(mut self, aggs: Value) -> Self {
        self.aggs = Some(aggs);
        self
    }

    pub fn with_suggest(mut self, suggest: Value) -> Self {
        self.suggest = Some(suggest);
        self
    }

    /// Aggregation or suggestion only; no hits or stored fields.
    pub fn without_hits(mut self) -> Self {
        self.size = 0;
        self.source.clear();
        self
    }

    pub fn to_wire(&self) -> Value {
        let mut body = Map::new();
        body.insert("query".into(), self.query.to_wire());
        if let Some(sort) = &self.sort {
            body.insert("sort".into(), sort.clone());
        }
        body.insert("size".into(), json!(self.size));
        body.insert("from".into(), json!(self.from));
        body.insert("_source".into(), json!(self.source));
        if let Some(aggs) = &self.aggs {
            body.insert("aggs".into(), aggs.clone());
        }
        if let Some(suggest) = &self.suggest {
            body.insert("suggest".into(), suggest.clone());
        }
        Value::Object(body)
    }
}

impl Serialize for SearchBody {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_wire().serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit {
    pub id: String,
    pub score: f64,
    pub source: Document,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub key: String,
    pub doc_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub text: String,
    pub score: f64,
}

/// Parsed engine response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchHits {
    pub total: u64,
    pub hits: Vec<Hit>,
    pub aggregations: BTreeMap<String, Vec<Bucket>>,
    pub suggestions: BTreeMap<String, Vec<Suggestion>>,
}

impl SearchHits {
    pub fn buckets(&self, name: &str) -> &[Bucket] {
        self.aggregations.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn suggestions(&self, name: &str) -> &[Suggestion] {
        self.suggestions.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn from_response(response: &Value) -> IndexResult<Self> {
        let hits_section = response
            .get("hits")
            .ok_or_else(|| IndexError::malformed("missing 'hits' section"))?;

        let total = match hits_section.get("total") {
            Some(Value::Number(number)) => number.as_u64().unwrap_or(0),
            Some(total) => total.get("value").and_then(Value::as_u64).unwrap_or(0),
            None => 0,
        };

        let hits = hits_section
            .get("hits")
            .and_then(Value::as_array)
            .map(|hits| hits.iter().map(parse_hit).collect::<IndexResult<Vec<_>>>())
            .transpose()?
            .unwrap_or_default();

        let aggregations = response
            .get("aggregations")
            .and_then(Value::as_object)
            .map(|aggs| {
                aggs.iter()
                    .map(|(name, agg)| (name.clone(), parse_buckets(agg)))
                    .collect()
            })
            .unwrap_or_default();

        let suggestions = response
            .get("suggest")
            .and_then(Value::as_object)
            .map(|suggest| {
                suggest
                    .iter()
                    .map(|(name, entries)| (name.clone(), parse_options(entries)))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            total,
            hits,
            aggregations,
            suggestions,
        })
    }
}

fn parse_hit(hit: &Value) -> IndexResult<Hit> {
    let id = match hit.get("_id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => return Err(IndexError::malformed("hit without '_id'")),
    };
    Ok(Hit {
        id,
        score: hit.get("_score").and_then(Value::as_f64).unwrap_or(0.0),
        source: hit
            .get("_source")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default(),
    })
}

fn parse_buckets(aggregation: &Value) -> Vec<Bucket> {
    aggregation
        .get("buckets")
        .and_then(Value::as_array)
        .map(|buckets| {
            buckets
                .iter()
                .filter_map(|bucket| {
                    let key = match bucket.get("key")? {
                        Value::String(key) => key.clone(),
                        other => other.to_string(),
                    };
                    Some(Bucket {
                        key,
                        doc_count: bucket.get("doc_count").and_then(Value::as_u64).unwrap_or(0),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Phrase options carry `score`, completion options carry `_score`.
fn parse_options(entries: &Value) -> Vec<Suggestion> {
    entries
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|entry| entry.get("options")?.as_array())
        .flatten()
        .filter_map(|option| {
            Some(Suggestion {
                text: option.get("text")?.as_str()?.to_string(),
                score: option
                    .get("score")
                    .or_else(|| option.get("_score"))
                    .and_then(Value::as_f64)
                    .unwrap_or(0.0),
            })
        })
        .collect()
}
