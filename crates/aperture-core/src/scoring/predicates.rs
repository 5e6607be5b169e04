use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::document::{self, Document};

/// Per-document condition gating a multiplicative weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    Equals { field: String, value: Value },
    OneOf { field: String, values: Vec<String> },
    /// Matches only an explicit `true`.
    IsTrue { field: String },
    /// Matches only an explicit `false`; a missing field does not match.
    IsFalse { field: String },
    /// Case-insensitive prefix test.
    StartsWith { field: String, prefix: String },
    /// Case-insensitive substring test against any needle.
    ContainsAny { field: String, needles: Vec<String> },
}

impl Predicate {
    pub fn equals(field: &str, value: impl Into<Value>) -> Self {
        Predicate::Equals {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn one_of(field: &str, values: &[String]) -> Self {
        Predicate::OneOf {
            field: field.to_string(),
            values: values.to_vec(),
        }
    }

    pub fn is_true(field: &str) -> Self {
        Predicate::IsTrue {
            field: field.to_string(),
        }
    }

    pub fn is_false(field: &str) -> Self {
        Predicate::IsFalse {
            field: field.to_string(),
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Predicate::Equals { field, value } => {
                document::lookup(doc, field).is_some_and(|found| found == value)
            }
            Predicate::OneOf { field, values } => document::text(doc, field)
                .is_some_and(|found| values.iter().any(|value| value == found)),
            Predicate::IsTrue { field } => document::boolean(doc, field) == Some(true),
            Predicate::IsFalse { field } => document::boolean(doc, field) == Some(false),
            Predicate::StartsWith { field, prefix } => document::text(doc, field)
                .is_some_and(|found| found.to_lowercase().starts_with(&prefix.to_lowercase())),
            Predicate::ContainsAny { field, needles } => {
                document::text(doc, field).is_some_and(|found| {
                    let found = found.to_lowercase();
                    needles
                        .iter()
                        .any(|needle| found.contains(&needle.to_lowercase()))
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn is_false_ignores_missing_field() {
        let predicate = Predicate::is_false("has_image");
        assert!(predicate.matches(&doc(json!({ "has_image": false }))));
        assert!(!predicate.matches(&doc(json!({}))));
    }

    #[test]
    fn starts_with_is_case_insensitive() {
        let predicate = Predicate::StartsWith {
            field: "name".into(),
            prefix: "Statyw".into(),
        };
        assert!(predicate.matches(&doc(json!({ "name": "STATYW Manfrotto 190" }))));
        assert!(!predicate.matches(&doc(json!({ "name": "Głowica do statywu" }))));
    }

    #[test]
    fn contains_any_checks_every_needle() {
        let predicate = Predicate::ContainsAny {
            field: "category_path".into(),
            needles: vec!["pozostałe".into(), "inne akcesoria".into()],
        };
        assert!(predicate.matches(&doc(json!({ "category_path": "Statywy > Pozostałe" }))));
        assert!(!predicate.matches(&doc(json!({ "category_path": "Statywy > Głowice" }))));
    }

    #[test]
    fn equals_compares_json_values() {
        let predicate = Predicate::equals("availability", "in_stock");
        assert!(predicate.matches(&doc(json!({ "availability": "in_stock" }))));
        assert!(!predicate.matches(&doc(json!({ "availability": "backorder" }))));
    }
}
