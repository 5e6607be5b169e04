use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Field paths written by the parameter extractor.
pub mod fields {
    pub const APERTURE: &str = "params.aperture";
    pub const FOCAL_LENGTH_MIN: &str = "params.focal_length_min";
    pub const FOCAL_LENGTH_MAX: &str = "params.focal_length_max";
    pub const FILTER_DIAMETER: &str = "params.filter_diameter";
    pub const RESOLUTION: &str = "params.resolution";
    pub const FPS: &str = "params.fps";
    pub const SENSOR_SIZE: &str = "params.sensor_size";
    pub const MOUNT: &str = "params.mount";
    pub const MEGAPIXELS: &str = "params.megapixels";
}

/// A scalar value pulled out of free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Integer(i64),
    Decimal(f64),
    Text(String),
}

impl ParamValue {
    /// Integer when the number has no fractional part, decimal otherwise.
    pub fn number(value: f64) -> Self {
        if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            ParamValue::Integer(value as i64)
        } else {
            ParamValue::Decimal(value)
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Integer(value) => Some(*value as f64),
            ParamValue::Decimal(value) => Some(*value),
            ParamValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ParamValue::Integer(value) => serde_json::Value::from(*value),
            ParamValue::Decimal(value) => serde_json::Value::from(*value),
            ParamValue::Text(value) => serde_json::Value::from(value.as_str()),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Integer(value)
    }
}

/// Field path -> scalar mapping produced by [`ParameterExtractor`](super::ParameterExtractor).
///
/// Extractors write disjoint fields and never clear each other's output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedParams {
    fields: BTreeMap<String, ParamValue>,
}

impl ExtractedParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&ParamValue> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn insert(&mut self, field: &str, value: impl Into<ParamValue>) {
        self.fields.insert(field.to_string(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.fields.iter().map(|(field, value)| (field.as_str(), value))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_collapses_whole_values_to_integers() {
        assert_eq!(ParamValue::number(24.0), ParamValue::Integer(24));
        assert_eq!(ParamValue::number(24.2), ParamValue::Decimal(24.2));
    }

    #[test]
    fn params_serialize_as_flat_map() {
        let mut params = ExtractedParams::new();
        params.insert(fields::APERTURE, "f/2.8");
        params.insert(fields::FOCAL_LENGTH_MIN, 70i64);
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["params.aperture"], "f/2.8");
        assert_eq!(json["params.focal_length_min"], 70);
    }
}
