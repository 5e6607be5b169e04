//! Field-boost tables and matching knobs for the query builder.

use serde::{Deserialize, Serialize};

use crate::schema;

use super::models::FieldBoost;

/// Static boost configuration. Changing values never changes builder control flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Fields searched by the broad fuzzy text match.
    pub text_fields: Vec<FieldBoost>,
    pub ean_fields: Vec<String>,
    /// Identifier fields that receive boosted SKU case variants.
    pub sku_fields: Vec<String>,
    /// Dominates any text-relevance signal.
    pub sku_boost: f64,
    pub sku_phrase_boost: f64,
    pub phrase_boost: f64,
    pub phrase_slop: u32,
    pub slop_phrase_boost: f64,
    pub model_code_boost: f64,
    pub brand_boost: f64,
    pub brand_exact_boost: f64,
    pub accessory_residual_boost: f64,
    pub compound_slop: u32,
    /// Multiplier when a product name starts with the category query term.
    pub category_name_prefix_weight: f64,
    /// Multiplier for residual "other accessories" subcategories.
    pub residual_category_weight: f64,
    pub residual_category_markers: Vec<String>,
    pub fuzziness: String,
    pub prefix_length: u32,
    pub operator: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            text_fields: vec![
                FieldBoost::new(schema::NAME, 5.0),
                FieldBoost::new(schema::MODEL_CODE, 4.0),
                FieldBoost::new(schema::BRAND, 3.0),
                FieldBoost::new(schema::CATEGORY, 2.0),
                FieldBoost::new(schema::DESCRIPTION, 1.0),
            ],
            ean_fields: vec![schema::EAN.to_string()],
            sku_fields: vec![
                schema::SKU.to_string(),
                schema::MANUFACTURER_CODE.to_string(),
                schema::MODEL_CODE.to_string(),
            ],
            sku_boost: 100.0,
            sku_phrase_boost: 2.0,
            phrase_boost: 10.0,
            phrase_slop: 2,
            slop_phrase_boost: 5.0,
            model_code_boost: 8.0,
            brand_boost: 3.0,
            brand_exact_boost: 10.0,
            accessory_residual_boost: 3.0,
            compound_slop: 3,
            category_name_prefix_weight: 4.0,
            residual_category_weight: 0.4,
            residual_category_markers: vec![
                "pozostałe".to_string(),
                "inne akcesoria".to_string(),
                "other accessories".to_string(),
            ],
            fuzziness: "AUTO".to_string(),
            prefix_length: 1,
            operator: "and".to_string(),
        }
    }
}

/// Per-call overrides for fuzzy matching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    pub fuzziness: Option<String>,
    pub prefix_length: Option<u32>,
}

impl BuildOptions {
    /// Disable fuzziness, e.g. for incremental autocomplete typing.
    pub fn exact() -> Self {
        Self {
            fuzziness: Some("0".to_string()),
            prefix_length: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: QueryConfig = toml::from_str("sku_boost = 250.0\nfuzziness = \"1\"").unwrap();
        assert_eq!(config.sku_boost, 250.0);
        assert_eq!(config.fuzziness, "1");
        assert_eq!(config.text_fields.len(), 5);
        assert_eq!(config.prefix_length, 1);
    }
}
