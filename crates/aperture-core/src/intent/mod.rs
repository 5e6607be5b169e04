//! Query intent classification.
//!
//! Raw text runs through an ordered rule cascade (EAN, SKU, brand, model
//! inference, parametric, category, price) and the first matching rule
//! decides the retrieval strategy. Condition and accessory modifiers are
//! detected separately and attached to every intent.

pub mod classifier;
pub mod models;
pub mod modifiers;

pub use classifier::{IntentClassifier, IntentRule, QueryContext};
pub use models::{
    BrandIntent, CategoryIntent, CompoundIntent, ConditionPreference, Intent, IntentKind,
    ModelIntent, PriceIntent,
};
pub use modifiers::Modifiers;
