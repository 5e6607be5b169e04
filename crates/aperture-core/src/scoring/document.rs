//! Typed reads over a hit's stored fields.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::{Map, Value};

/// Stored fields of one hit.
pub type Document = Map<String, Value>;

/// Resolve a field path. A literal dotted key wins over nested traversal.
pub fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Value> {
    if let Some(value) = document.get(path) {
        return Some(value);
    }
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Numeric field; numeric strings are accepted.
pub fn number(document: &Document, path: &str) -> Option<f64> {
    match lookup(document, path)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

pub fn text<'a>(document: &'a Document, path: &str) -> Option<&'a str> {
    lookup(document, path)?.as_str()
}

/// Boolean field; `"true"`/`"false"` strings are accepted.
pub fn boolean(document: &Document, path: &str) -> Option<bool> {
    match lookup(document, path)? {
        Value::Bool(flag) => Some(*flag),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Date field as RFC 3339, `YYYY-MM-DD`, or epoch milliseconds.
pub fn timestamp(document: &Document, path: &str) -> Option<DateTime<Utc>> {
    match lookup(document, path)? {
        Value::Number(number) => Utc.timestamp_millis_opt(number.as_i64()?).single(),
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .map(|parsed| parsed.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
                    .map(|naive| Utc.from_utc_datetime(&naive))
            }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn document(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn dotted_key_and_nested_paths_resolve() {
        let doc = document(json!({
            "params.mount": "Sony E",
            "params": { "megapixels": 24 }
        }));
        assert_eq!(text(&doc, "params.mount"), Some("Sony E"));
        assert_eq!(number(&doc, "params.megapixels"), Some(24.0));
        assert_eq!(number(&doc, "params.missing"), None);
    }

    #[test]
    fn lenient_scalars() {
        let doc = document(json!({ "sales_30d": "12", "has_image": "false" }));
        assert_eq!(number(&doc, "sales_30d"), Some(12.0));
        assert_eq!(boolean(&doc, "has_image"), Some(false));
    }

    #[test]
    fn timestamps_accept_three_formats() {
        let rfc = document(json!({ "created_at": "2026-01-02T03:04:05Z" }));
        let day = document(json!({ "created_at": "2026-01-02" }));
        let millis = document(json!({ "created_at": 1_767_225_600_000i64 }));
        assert!(timestamp(&rfc, "created_at").is_some());
        assert_eq!(
            timestamp(&day, "created_at").unwrap().to_rfc3339(),
            "2026-01-02T00:00:00+00:00"
        );
        assert!(timestamp(&millis, "created_at").is_some());
    }
}
