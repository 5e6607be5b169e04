//! Elasticsearch executor and coordinator against a mock cluster.

use std::sync::Arc;

use aperture::{
    AppConfig, ElasticExecutor, IndexError, IndexExecutor, MerchandisingRules, SearchBody,
    SearchCoordinator, SearchError,
};
use aperture_core::{QueryNode, RelevanceEngine, SearchRequest};
use aperture_index::{shared_transport, TransportConfig};
use serde_json::json;
use wiremock::{
    matchers::{body_string_contains, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn executor(server: &MockServer) -> ElasticExecutor {
    let config = TransportConfig::new(server.uri()).with_retry(0, std::time::Duration::from_millis(1));
    ElasticExecutor::new(shared_transport(config).unwrap(), "products")
}

fn coordinator(server: &MockServer) -> SearchCoordinator {
    SearchCoordinator::with_executor(
        &AppConfig::default(),
        Arc::new(RelevanceEngine::default()),
        Arc::new(executor(server)),
        MerchandisingRules::new().pin("statyw", ["p-2"]),
    )
}

fn hits(ids: &[&str]) -> serde_json::Value {
    json!({
        "hits": {
            "total": { "value": ids.len(), "relation": "eq" },
            "hits": ids.iter().map(|id| json!({
                "_id": id,
                "_score": 1.0,
                "_source": { "name": format!("Product {id}"), "availability": "in_stock" }
            })).collect::<Vec<_>>()
        }
    })
}

#[tokio::test]
async fn search_posts_to_the_index_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/products/_search"))
        .and(body_string_contains("\"_source\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(hits(&["p-1", "p-2"])))
        .expect(1)
        .mount(&server)
        .await;

    let result = executor(&server)
        .search(&SearchBody::new(QueryNode::MatchAll))
        .await
        .unwrap();
    assert_eq!(result.total, 2);
    assert_eq!(result.hits[1].id, "p-2");
}

#[tokio::test]
async fn multi_search_keeps_request_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/_msearch"))
        .and(body_string_contains("{\"index\":\"products\"}"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "responses": [hits(&["a"]), hits(&["b", "c"])]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let bodies = [
        SearchBody::new(QueryNode::MatchAll),
        SearchBody::new(QueryNode::term("brand", "sony")),
    ];
    let results = executor(&server).multi_search(&bodies).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].hits[0].id, "a");
    assert_eq!(results[1].total, 2);
}

#[tokio::test]
async fn multi_search_sub_query_errors_surface() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/_msearch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "responses": [hits(&[]), { "error": { "reason": "no such field" }, "status": 400 }]
        })))
        .mount(&server)
        .await;

    let bodies = [
        SearchBody::new(QueryNode::MatchAll),
        SearchBody::new(QueryNode::MatchAll),
    ];
    let error = executor(&server).multi_search(&bodies).await.unwrap_err();
    assert!(matches!(error, IndexError::SubQuery { index: 1, ref reason } if reason == "no such field"));
}

#[tokio::test]
async fn phrase_suggestions_are_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/products/_search"))
        .and(body_string_contains("direct_generator"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hits": { "total": { "value": 0 }, "hits": [] },
            "suggest": {
                "phrase": [{ "text": "statyf", "options": [{ "text": "statyw", "score": 0.72 }] }]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let suggestions = executor(&server).suggest_phrase("statyf").await.unwrap();
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].text, "statyw");
    assert_eq!(suggestions[0].score, 0.72);
}

#[tokio::test]
async fn primary_query_failure_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/products/_search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let error = coordinator(&server)
        .search(SearchRequest::new("statyw"))
        .await
        .unwrap_err();
    assert!(matches!(error, SearchError::Index(IndexError::Transport(_))));
}

#[tokio::test]
async fn search_applies_pins_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/products/_search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hits(&["p-1", "p-2"])))
        .mount(&server)
        .await;

    let response = coordinator(&server)
        .search(SearchRequest::new("Statyw"))
        .await
        .unwrap();
    assert_eq!(response.products[0].id, "p-2");
    assert!(response.fallback_type.is_none());
    assert!(response.cache_key.starts_with("sr:statyw:"));
}

#[tokio::test]
async fn autocomplete_merges_one_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/_msearch"))
        .and(body_string_contains("skip_duplicates"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "responses": [
                {
                    "hits": { "total": { "value": 0 }, "hits": [] },
                    "suggest": { "completion": [{ "options": [
                        { "text": "statyw manfrotto", "_score": 2.0 },
                        { "text": "statyw manfrotto", "_score": 1.0 },
                        { "text": "statyw video", "_score": 1.0 }
                    ] }] }
                },
                {
                    "hits": { "total": { "value": 12 }, "hits": [] },
                    "aggregations": { "categories": { "buckets": [{ "key": "Statywy", "doc_count": 12 }] } }
                },
                {
                    "hits": { "total": { "value": 12 }, "hits": [] },
                    "aggregations": { "brands": { "buckets": [{ "key": "manfrotto", "doc_count": 7 }] } }
                },
                hits(&["p-1", "p-2", "p-3"])
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = coordinator(&server).autocomplete("  Statyw ").await.unwrap();
    assert_eq!(response.cache_key, "ac:statyw");
    assert_eq!(response.suggestions, ["statyw manfrotto", "statyw video"]);
    assert_eq!(response.categories[0].key, "Statywy");
    assert_eq!(response.brands[0].doc_count, 7);
    assert_eq!(response.products.len(), 3);
    assert_eq!(response.products[0].id, "p-2");
}

#[tokio::test]
async fn blank_autocomplete_skips_the_index() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let response = coordinator(&server).autocomplete("   ").await.unwrap();
    assert!(response.suggestions.is_empty());
    assert!(response.products.is_empty());
}
