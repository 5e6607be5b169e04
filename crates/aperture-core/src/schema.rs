//! Product document field names.

pub const ID: &str = "id";
pub const NAME: &str = "name";
pub const BRAND: &str = "brand";
pub const CATEGORY: &str = "category";
pub const CATEGORY_PATH: &str = "category_path";
pub const DESCRIPTION: &str = "description";
pub const MODEL_CODE: &str = "model_code";
pub const SKU: &str = "sku";
pub const MANUFACTURER_CODE: &str = "manufacturer_code";
pub const EAN: &str = "ean";
pub const PRICE: &str = "price";
pub const AVAILABILITY: &str = "availability";
pub const CONDITION: &str = "condition";
pub const SALES_30D: &str = "sales_30d";
pub const SALES_365D: &str = "sales_365d";
pub const REVENUE_30D: &str = "revenue_30d";
pub const REVENUE_365D: &str = "revenue_365d";
pub const POPULARITY_SCORE: &str = "popularity_score";
pub const CONVERSION_SCORE: &str = "conversion_score";
pub const TRENDING_SCORE: &str = "trending_score";
pub const MARGIN_PCT: &str = "margin_pct";
pub const CREATED_AT: &str = "created_at";
pub const IS_PROMO: &str = "is_promo";
pub const AVG_RATING: &str = "avg_rating";
pub const REVIEW_COUNT: &str = "review_count";
pub const HAS_IMAGE: &str = "has_image";
pub const IS_BESTSELLER: &str = "is_bestseller";
pub const IS_HIGHLIGHTED: &str = "is_highlighted";
pub const IMAGE_URL: &str = "image_url";
pub const URL: &str = "url";

pub mod availability {
    pub const IN_STOCK: &str = "in_stock";
    pub const BACKORDER: &str = "backorder";
    pub const OUT_OF_STOCK: &str = "out_of_stock";
}

pub mod condition {
    pub const NEW: &str = "new";
    pub const USED: &str = "used";
}

/// Stored fields requested for every hit. Ranking signals read these locally.
pub const SOURCE_FIELDS: &[&str] = &[
    ID,
    NAME,
    BRAND,
    CATEGORY,
    CATEGORY_PATH,
    MODEL_CODE,
    SKU,
    EAN,
    PRICE,
    AVAILABILITY,
    CONDITION,
    SALES_30D,
    SALES_365D,
    REVENUE_30D,
    REVENUE_365D,
    POPULARITY_SCORE,
    CONVERSION_SCORE,
    TRENDING_SCORE,
    MARGIN_PCT,
    CREATED_AT,
    IS_PROMO,
    AVG_RATING,
    REVIEW_COUNT,
    HAS_IMAGE,
    IS_BESTSELLER,
    IS_HIGHLIGHTED,
    IMAGE_URL,
    URL,
    "params",
];
