//! Upstream search request model.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{CoreError, Result},
    params::fields,
    query::QueryNode,
    schema,
};

pub const DEFAULT_PER_PAGE: u32 = 24;

/// Caller-supplied hard filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_max: Option<f64>,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn to_nodes(&self) -> Vec<QueryNode> {
        let mut nodes = Vec::new();
        let terms = [
            (schema::BRAND, &self.brand),
            (schema::CATEGORY, &self.category),
            (schema::AVAILABILITY, &self.availability),
            (fields::MOUNT, &self.mount),
        ];
        for (field, value) in terms {
            if let Some(value) = value {
                nodes.push(QueryNode::term(field, value.as_str()));
            }
        }
        if self.price_min.is_some() || self.price_max.is_some() {
            nodes.push(QueryNode::range(schema::PRICE, self.price_min, self.price_max));
        }
        nodes
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Relevance,
    PriceAsc,
    PriceDesc,
    Newest,
    Popular,
    Trending,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Relevance => "relevance",
            SortOrder::PriceAsc => "price_asc",
            SortOrder::PriceDesc => "price_desc",
            SortOrder::Newest => "newest",
            SortOrder::Popular => "popular",
            SortOrder::Trending => "trending",
        }
    }

    /// Engine sort clause; `None` means sort by relevance score.
    pub fn sort_clause(&self) -> Option<Value> {
        let (field, direction) = match self {
            SortOrder::Relevance => return None,
            SortOrder::PriceAsc => (schema::PRICE, "asc"),
            SortOrder::PriceDesc => (schema::PRICE, "desc"),
            SortOrder::Newest => (schema::CREATED_AT, "desc"),
            SortOrder::Popular => (schema::SALES_30D, "desc"),
            SortOrder::Trending => (schema::TRENDING_SCORE, "desc"),
        };
        Some(json!([{ field: { "order": direction } }]))
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "relevance" => Ok(SortOrder::Relevance),
            "price_asc" => Ok(SortOrder::PriceAsc),
            "price_desc" => Ok(SortOrder::PriceDesc),
            "newest" => Ok(SortOrder::Newest),
            "popular" => Ok(SortOrder::Popular),
            "trending" => Ok(SortOrder::Trending),
            other => Err(CoreError::InvalidRequest(format!("unknown sort order '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub filters: SearchFilters,
    /// 1-based.
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default)]
    pub sort: SortOrder,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            filters: SearchFilters::default(),
            page: default_page(),
            per_page: default_per_page(),
            sort: SortOrder::default(),
        }
    }

    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_page(mut self, page: u32, per_page: u32) -> Self {
        self.page = page;
        self.per_page = per_page;
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Zero-based offset of the first hit on this page.
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.per_page as usize
    }

    pub fn validate(&self, max_per_page: u32) -> Result<()> {
        if self.page == 0 {
            return Err(CoreError::InvalidRequest("page is 1-based".to_string()));
        }
        if self.per_page == 0 || self.per_page > max_per_page {
            return Err(CoreError::InvalidRequest(format!(
                "per_page must be between 1 and {max_per_page}"
            )));
        }
        if let (Some(min), Some(max)) = (self.filters.price_min, self.filters.price_max) {
            if min > max {
                return Err(CoreError::InvalidRequest(
                    "price_min exceeds price_max".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_become_term_and_range_nodes() {
        let filters = SearchFilters {
            brand: Some("sony".into()),
            mount: Some("Sony E".into()),
            price_max: Some(5000.0),
            ..SearchFilters::default()
        };
        let wire: Vec<_> = filters.to_nodes().iter().map(QueryNode::to_wire).collect();
        assert_eq!(wire.len(), 3);
        assert_eq!(wire[1], json!({ "term": { "params.mount": { "value": "Sony E" } } }));
        assert_eq!(wire[2], json!({ "range": { "price": { "lte": 5000.0 } } }));
    }

    #[test]
    fn sort_orders_map_to_engine_fields() {
        assert_eq!(SortOrder::Relevance.sort_clause(), None);
        assert_eq!(
            SortOrder::Popular.sort_clause(),
            Some(json!([{ "sales_30d": { "order": "desc" } }]))
        );
        assert_eq!("price_asc".parse::<SortOrder>().unwrap(), SortOrder::PriceAsc);
        assert!("cheapest".parse::<SortOrder>().is_err());
    }

    #[test]
    fn pages_are_one_based() {
        let request = SearchRequest::new("statyw").with_page(3, 20);
        assert_eq!(request.offset(), 40);
        assert!(request.validate(100).is_ok());
        assert!(SearchRequest::new("x").with_page(0, 20).validate(100).is_err());
        assert!(SearchRequest::new("x").with_page(1, 500).validate(100).is_err());
    }

    #[test]
    fn deserializes_with_defaults() {
        let request: SearchRequest =
            serde_json::from_value(json!({ "query": "a7", "sort": "price_desc" })).unwrap();
        assert_eq!(request.page, 1);
        assert_eq!(request.per_page, DEFAULT_PER_PAGE);
        assert_eq!(request.sort, SortOrder::PriceDesc);
        assert!(request.filters.is_empty());
    }
}
