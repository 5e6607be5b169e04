use serde::{Deserialize, Serialize};

use crate::params::ExtractedParams;

/// Condition the shopper asked for, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionPreference {
    Used,
    New,
}

/// Classified retrieval strategy for one query.
///
/// Exactly one [`IntentKind`] is active; the modifier fields are detected
/// independently of the cascade and ride along with every variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    #[serde(flatten)]
    pub kind: IntentKind,
    pub condition_pref: Option<ConditionPreference>,
    pub wants_accessories: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentKind {
    Ean { query: String },
    Sku { query: String },
    Model(ModelIntent),
    Brand(BrandIntent),
    Compound(CompoundIntent),
    Parametric { query: String },
    Category(CategoryIntent),
    Price(PriceIntent),
    General { query: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelIntent {
    pub query: String,
    /// Query with accessory and condition words removed.
    pub model_query: String,
    pub brand: String,
    pub is_body_query: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessory_category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandIntent {
    pub query: String,
    pub brand: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessory_category: Option<String>,
}

/// Category plus brand and/or parameters, e.g. "obiektyw canon 50mm".
///
/// Built by the query builder but never emitted by the classifier cascade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundIntent {
    pub detected_category: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub params: ExtractedParams,
    #[serde(default)]
    pub compat_mounts: Option<Vec<String>>,
    pub compatibility_mode: bool,
    pub text_query: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryIntent {
    pub query: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceIntent {
    /// Query with the price phrase removed.
    pub query: String,
    pub max_price: Option<f64>,
}

impl IntentKind {
    pub fn name(&self) -> &'static str {
        match self {
            IntentKind::Ean { .. } => "EAN",
            IntentKind::Sku { .. } => "SKU",
            IntentKind::Model(_) => "MODEL",
            IntentKind::Brand(_) => "BRAND",
            IntentKind::Compound(_) => "COMPOUND",
            IntentKind::Parametric { .. } => "PARAMETRIC",
            IntentKind::Category(_) => "CATEGORY",
            IntentKind::Price(_) => "PRICE",
            IntentKind::General { .. } => "GENERAL",
        }
    }

    /// The text this intent matches against.
    pub fn query(&self) -> &str {
        match self {
            IntentKind::Ean { query }
            | IntentKind::Sku { query }
            | IntentKind::Parametric { query }
            | IntentKind::General { query } => query,
            IntentKind::Model(model) => &model.query,
            IntentKind::Brand(brand) => &brand.query,
            IntentKind::Compound(compound) => &compound.text_query,
            IntentKind::Category(category) => &category.query,
            IntentKind::Price(price) => &price.query,
        }
    }
}

impl Intent {
    pub fn new(kind: IntentKind) -> Self {
        Self {
            kind,
            condition_pref: None,
            wants_accessories: false,
        }
    }

    /// Plain text search, used by recovery re-runs.
    pub fn general(query: impl Into<String>) -> Self {
        Self::new(IntentKind::General {
            query: query.into(),
        })
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn query(&self) -> &str {
        self.kind.query()
    }

    pub fn is_body_query(&self) -> bool {
        matches!(&self.kind, IntentKind::Model(model) if model.is_body_query)
    }

    pub fn is_sku(&self) -> bool {
        matches!(self.kind, IntentKind::Sku { .. })
    }

    pub fn category(&self) -> Option<&str> {
        match &self.kind {
            IntentKind::Category(category) => Some(&category.category),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let intent = Intent {
            kind: IntentKind::Model(ModelIntent {
                query: "sony a7 iv".into(),
                model_query: "sony a7 iv".into(),
                brand: "sony".into(),
                is_body_query: true,
                accessory_category: None,
            }),
            condition_pref: Some(ConditionPreference::Used),
            wants_accessories: false,
        };

        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["type"], "MODEL");
        assert_eq!(json["brand"], "sony");
        assert_eq!(json["is_body_query"], true);
        assert_eq!(json["condition_pref"], "used");
        assert!(json.get("accessory_category").is_none());

        let back: Intent = serde_json::from_value(json).unwrap();
        assert_eq!(back, intent);
    }

    #[test]
    fn general_has_no_modifiers() {
        let intent = Intent::general("statyw");
        assert_eq!(intent.name(), "GENERAL");
        assert_eq!(intent.query(), "statyw");
        assert!(!intent.wants_accessories);
        assert!(!intent.is_body_query());
    }
}
