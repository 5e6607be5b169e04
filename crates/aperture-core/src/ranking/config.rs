//! Ranking coefficients.

use serde::{Deserialize, Serialize};

/// Multipliers for new and used items under one condition preference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConditionWeights {
    pub new: f64,
    pub used: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LengthTierConfig {
    pub below: usize,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub in_stock_weight: f64,
    pub backorder_weight: f64,
    pub out_of_stock_weight: f64,

    pub sales_30d_coefficient: f64,
    pub sales_365d_coefficient: f64,
    pub revenue_coefficient: f64,
    /// 365-day revenue is divided by this when 30-day revenue is missing.
    pub revenue_fallback_divisor: f64,

    pub popularity_coefficient: f64,
    pub conversion_coefficient: f64,
    pub trending_coefficient: f64,
    pub margin_coefficient: f64,

    pub novelty_scale_days: f64,
    pub novelty_decay: f64,

    pub promo_weight: f64,
    pub rating_center: f64,
    pub rating_coefficient: f64,
    pub rating_min_reviews: f64,
    pub no_image_weight: f64,

    pub condition_when_used: ConditionWeights,
    pub condition_when_new: ConditionWeights,
    pub condition_default: ConditionWeights,

    pub bestseller_weight: f64,
    pub highlighted_weight: f64,

    pub sku_length_tiers: Vec<LengthTierConfig>,
    pub sku_length_default: f64,

    pub body_categories: Vec<String>,
    pub lens_categories: Vec<String>,
    pub accessory_categories: Vec<String>,
    pub body_query_body_weight: f64,
    pub body_query_lens_weight: f64,
    pub body_query_accessory_weight: f64,
    pub accessory_query_accessory_weight: f64,
    pub accessory_query_body_weight: f64,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            in_stock_weight: 1.5,
            backorder_weight: 0.8,
            out_of_stock_weight: 0.3,
            sales_30d_coefficient: 0.25,
            sales_365d_coefficient: 0.1,
            revenue_coefficient: 0.025,
            revenue_fallback_divisor: 12.0,
            popularity_coefficient: 0.008,
            conversion_coefficient: 0.004,
            trending_coefficient: 0.003,
            margin_coefficient: 0.003,
            novelty_scale_days: 60.0,
            novelty_decay: 0.5,
            promo_weight: 1.3,
            rating_center: 3.0,
            rating_coefficient: 0.1,
            rating_min_reviews: 3.0,
            no_image_weight: 0.1,
            condition_when_used: ConditionWeights {
                new: 0.55,
                used: 1.8,
            },
            condition_when_new: ConditionWeights {
                new: 1.5,
                used: 0.4,
            },
            condition_default: ConditionWeights {
                new: 1.3,
                used: 0.55,
            },
            bestseller_weight: 1.15,
            highlighted_weight: 1.10,
            sku_length_tiers: vec![
                LengthTierConfig { below: 15, weight: 3.0 },
                LengthTierConfig { below: 30, weight: 2.5 },
                LengthTierConfig { below: 45, weight: 1.8 },
                LengthTierConfig { below: 60, weight: 1.2 },
            ],
            sku_length_default: 1.0,
            body_categories: strings(&[
                "Aparaty cyfrowe",
                "Aparaty bezlusterkowe",
                "Lustrzanki cyfrowe",
                "Aparaty kompaktowe",
                "Kamery",
            ]),
            lens_categories: strings(&["Obiektywy"]),
            accessory_categories: strings(&[
                "Akumulatory",
                "Ładowarki",
                "Torby i plecaki",
                "Karty pamięci",
                "Filtry",
                "Statywy",
                "Gripy",
                "Dekielki",
                "Osłony przeciwsłoneczne",
                "Paski",
                "Adaptery",
                "Piloty i wężyki",
                "Klatki operatorskie",
                "Osłony LCD",
                "Mikrofony",
                "Lampy błyskowe",
            ]),
            body_query_body_weight: 8.0,
            body_query_lens_weight: 3.0,
            body_query_accessory_weight: 0.08,
            accessory_query_accessory_weight: 5.0,
            accessory_query_body_weight: 0.1,
        }
    }
}
