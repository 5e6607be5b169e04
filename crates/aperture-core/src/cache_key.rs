//! Cache key format shared with the external cache layer.

use serde_json::{json, Map, Value};

use crate::request::SearchRequest;

/// Lowercase, trim, collapse internal whitespace.
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// `ac:<normalized-query>`
pub fn autocomplete_key(query: &str) -> String {
    format!("ac:{}", normalize_query(query))
}

/// `sr:<normalized-query>:<8 hex>`, hashing filters, sort and pagination.
pub fn search_key(request: &SearchRequest) -> String {
    let params = json!({
        "filters": request.filters,
        "sort": request.sort,
        "page": request.page,
        "per_page": request.per_page,
    });
    let canonical = canonicalize(params).to_string();
    let digest = format!("{:x}", md5::compute(canonical.as_bytes()));
    format!("sr:{}:{}", normalize_query(&request.query), &digest[..8])
}

/// Rebuild objects with keys in sorted order at every depth.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (key, value) in entries {
                sorted.insert(key, canonicalize(value));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{SearchFilters, SortOrder};

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_query("  Sony   A7\tIV "), "sony a7 iv");
        assert_eq!(autocomplete_key("  Sony   A7 "), "ac:sony a7");
    }

    #[test]
    fn search_key_has_eight_hex_digest() {
        let key = search_key(&SearchRequest::new("Statyw  Manfrotto"));
        let parts: Vec<&str> = key.splitn(3, ':').collect();
        assert_eq!(parts[0], "sr");
        assert_eq!(parts[1], "statyw manfrotto");
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn digest_depends_on_parameters_not_query_spacing() {
        let base = SearchRequest::new("statyw");
        assert_eq!(search_key(&base), search_key(&SearchRequest::new(" STATYW ")));
        assert_ne!(
            search_key(&base),
            search_key(&base.clone().with_sort(SortOrder::PriceAsc))
        );
        assert_ne!(search_key(&base), search_key(&base.clone().with_page(2, 24)));
        let filtered = base.clone().with_filters(SearchFilters {
            brand: Some("manfrotto".into()),
            ..SearchFilters::default()
        });
        assert_ne!(search_key(&base), search_key(&filtered));
    }
}
