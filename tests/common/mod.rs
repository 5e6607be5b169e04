//! In-memory index for end-to-end tests.

#![allow(dead_code)]

use std::{collections::HashMap, sync::Arc};

use aperture::{
    index::{Hit, IndexResult, SearchHits, Suggestion},
    AppConfig, IndexError, IndexExecutor, MerchandisingRules, SearchBody, SearchCoordinator,
};
use aperture_core::RelevanceEngine;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

/// How a request is identified: the multi_match text when there is one,
/// otherwise `field=value` of its first term clause. Engine-sorted requests
/// get a `|sorted` suffix.
pub fn request_key(body: &SearchBody) -> String {
    let wire = body.to_wire();
    let key = find_multi_match(&wire["query"])
        .or_else(|| find_term(&wire["query"]))
        .unwrap_or_else(|| "match_all".to_string());
    if wire.get("sort").is_some() {
        format!("{key}|sorted")
    } else {
        key
    }
}

fn find_multi_match(node: &Value) -> Option<String> {
    match node {
        Value::Object(map) => {
            if let Some(text) = map.get("multi_match").and_then(|m| m["query"].as_str()) {
                return Some(text.to_string());
            }
            map.values().find_map(find_multi_match)
        }
        Value::Array(items) => items.iter().find_map(find_multi_match),
        _ => None,
    }
}

fn find_term(node: &Value) -> Option<String> {
    match node {
        Value::Object(map) => {
            if let Some(Value::Object(term)) = map.get("term") {
                let (field, value) = term.iter().next()?;
                let value = value.get("value").unwrap_or(value);
                return Some(format!("{field}={}", value.as_str().unwrap_or_default()));
            }
            map.values().find_map(find_term)
        }
        Value::Array(items) => items.iter().find_map(find_term),
        _ => None,
    }
}

pub fn product(id: &str, base: f64, source: Value) -> Hit {
    Hit {
        id: id.to_string(),
        score: base,
        source: source.as_object().cloned().unwrap_or_default(),
    }
}

/// Scripted responses keyed by [`request_key`]; unknown keys answer with no hits.
#[derive(Default)]
pub struct ScriptedIndex {
    responses: HashMap<String, Vec<Hit>>,
    failing: Vec<String>,
    suggestion: Option<Suggestion>,
    pub requests: Mutex<Vec<String>>,
    pub bodies: Mutex<Vec<Value>>,
}

impl ScriptedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, key: &str, hits: Vec<Hit>) -> Self {
        self.responses.insert(key.to_string(), hits);
        self
    }

    pub fn fail(mut self, key: &str) -> Self {
        self.failing.push(key.to_string());
        self
    }

    pub fn suggest(mut self, text: &str, score: f64) -> Self {
        self.suggestion = Some(Suggestion {
            text: text.to_string(),
            score,
        });
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    pub fn last_body(&self) -> Value {
        self.bodies.lock().last().cloned().unwrap_or(json!(null))
    }
}

#[async_trait]
impl IndexExecutor for ScriptedIndex {
    async fn search(&self, body: &SearchBody) -> IndexResult<SearchHits> {
        let key = request_key(body);
        self.requests.lock().push(key.clone());
        self.bodies.lock().push(body.to_wire());

        if self.failing.contains(&key) {
            return Err(IndexError::malformed(format!("scripted failure for '{key}'")));
        }
        let hits = self.responses.get(&key).cloned().unwrap_or_default();
        Ok(SearchHits {
            total: hits.len() as u64,
            hits,
            ..SearchHits::default()
        })
    }

    async fn suggest_phrase(&self, _text: &str) -> IndexResult<Vec<Suggestion>> {
        Ok(self.suggestion.clone().into_iter().collect())
    }
}

pub fn coordinator(index: Arc<ScriptedIndex>, rules: MerchandisingRules) -> SearchCoordinator {
    SearchCoordinator::with_executor(
        &AppConfig::default(),
        Arc::new(RelevanceEngine::default()),
        index,
        rules,
    )
}
