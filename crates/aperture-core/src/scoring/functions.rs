use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    document::{self, Document},
    predicates::Predicate,
};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Secondary source used when the primary numeric field is absent or zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fallback {
    pub field: String,
    pub divisor: f64,
}

/// Weight applied when the field's character length is strictly below `below`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LengthTier {
    pub below: usize,
    pub weight: f64,
}

/// One multiplicative signal. Every variant evaluates to a factor; absent
/// data yields the neutral factor 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScoringFunction {
    Weight {
        name: String,
        predicate: Predicate,
        weight: f64,
    },
    /// `1 + ln(1 + x) * coefficient` when `x > 0`.
    Log1p {
        name: String,
        field: String,
        coefficient: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fallback: Option<Fallback>,
    },
    /// `1 + x * coefficient`.
    Linear {
        name: String,
        field: String,
        coefficient: f64,
        positive_only: bool,
    },
    /// `decay ^ ((age / scale)^2)`, never below `decay`.
    GaussDecay {
        name: String,
        field: String,
        origin: DateTime<Utc>,
        scale_days: f64,
        decay: f64,
    },
    LengthTiers {
        name: String,
        field: String,
        tiers: Vec<LengthTier>,
        default: f64,
    },
    /// `1 + (rating - center) * coefficient` once `count_field >= min_count`.
    RatingCentered {
        name: String,
        field: String,
        count_field: String,
        min_count: f64,
        center: f64,
        coefficient: f64,
    },
}

impl ScoringFunction {
    pub fn weight(name: &str, predicate: Predicate, weight: f64) -> Self {
        ScoringFunction::Weight {
            name: name.to_string(),
            predicate,
            weight,
        }
    }

    pub fn log1p(name: &str, field: &str, coefficient: f64) -> Self {
        ScoringFunction::Log1p {
            name: name.to_string(),
            field: field.to_string(),
            coefficient,
            fallback: None,
        }
    }

    pub fn linear(name: &str, field: &str, coefficient: f64, positive_only: bool) -> Self {
        ScoringFunction::Linear {
            name: name.to_string(),
            field: field.to_string(),
            coefficient,
            positive_only,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ScoringFunction::Weight { name, .. }
            | ScoringFunction::Log1p { name, .. }
            | ScoringFunction::Linear { name, .. }
            | ScoringFunction::GaussDecay { name, .. }
            | ScoringFunction::LengthTiers { name, .. }
            | ScoringFunction::RatingCentered { name, .. } => name,
        }
    }

    pub fn evaluate(&self, doc: &Document) -> f64 {
        match self {
            ScoringFunction::Weight {
                predicate, weight, ..
            } => {
                if predicate.matches(doc) {
                    *weight
                } else {
                    1.0
                }
            }
            ScoringFunction::Log1p {
                field,
                coefficient,
                fallback,
                ..
            } => {
                let value = document::number(doc, field)
                    .filter(|value| *value > 0.0)
                    .or_else(|| {
                        let fallback = fallback.as_ref()?;
                        document::number(doc, &fallback.field).map(|value| value / fallback.divisor)
                    })
                    .unwrap_or(0.0);
                if value > 0.0 {
                    1.0 + value.ln_1p() * coefficient
                } else {
                    1.0
                }
            }
            ScoringFunction::Linear {
                field,
                coefficient,
                positive_only,
                ..
            } => match document::number(doc, field) {
                Some(value) if !*positive_only || value > 0.0 => 1.0 + value * coefficient,
                _ => 1.0,
            },
            ScoringFunction::GaussDecay {
                field,
                origin,
                scale_days,
                decay,
                ..
            } => {
                let Some(created) = document::timestamp(doc, field) else {
                    return 1.0;
                };
                let age_days =
                    (*origin - created).num_milliseconds().abs() as f64 / MILLIS_PER_DAY;
                let ratio = age_days / scale_days;
                decay.powf(ratio * ratio).max(*decay)
            }
            ScoringFunction::LengthTiers {
                field,
                tiers,
                default,
                ..
            } => {
                let Some(text) = document::text(doc, field) else {
                    return *default;
                };
                let length = text.chars().count();
                tiers
                    .iter()
                    .find(|tier| length < tier.below)
                    .map(|tier| tier.weight)
                    .unwrap_or(*default)
            }
            ScoringFunction::RatingCentered {
                field,
                count_field,
                min_count,
                center,
                coefficient,
                ..
            } => {
                let count = document::number(doc, count_field).unwrap_or(0.0);
                match document::number(doc, field) {
                    Some(rating) if count >= *min_count => 1.0 + (rating - center) * coefficient,
                    _ => 1.0,
                }
            }
        }
    }
}
