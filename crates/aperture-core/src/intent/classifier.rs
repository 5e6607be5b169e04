use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

use crate::{dictionaries::Dictionaries, params::ParameterExtractor};

use super::{
    models::{BrandIntent, CategoryIntent, Intent, IntentKind, ModelIntent, PriceIntent},
    modifiers::{self, Modifiers},
};

lazy_static! {
    static ref EAN: Regex = Regex::new(r"^(?:\d{8}|\d{13})$").expect("valid EAN pattern");
    static ref SKU: Regex =
        Regex::new(r"(?i)^[a-z]{2,4}[-_][a-z0-9]*\d[a-z0-9]*$").expect("valid SKU pattern");
    static ref PRICE: Regex = Regex::new(
        r"(?i)(?:\b(?:do|poniżej|ponizej|max|maks|below|under)\s*(\d+(?:[.,]\d+)?)\s*(?:zł|zl|pln)?|(\d+(?:[.,]\d+)?)\s*(?:zł|zl|pln)\b|\b(?:tani|tania|tanie|tanio|cheap|budget)\b)"
    )
    .expect("valid price pattern");
}

/// Normalized views of one query, shared by every rule.
pub struct QueryContext {
    /// NFC-normalized, trimmed, whitespace-collapsed text.
    pub text: String,
    pub lower: String,
    pub modifiers: Modifiers,
}

/// Rule body: return a variant to stop the cascade.
type RuleFn = fn(&IntentClassifier, &QueryContext) -> Option<IntentKind>;

/// One step of the classification cascade.
pub struct IntentRule {
    name: &'static str,
    apply: RuleFn,
}

impl IntentRule {
    pub fn new(name: &'static str, apply: RuleFn) -> Self {
        Self { name, apply }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Ordered, first-match-wins intent cascade.
pub struct IntentClassifier {
    dictionaries: Arc<Dictionaries>,
    extractor: ParameterExtractor,
    rules: Vec<IntentRule>,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new(Dictionaries::builtin())
    }
}

impl IntentClassifier {
    pub fn new(dictionaries: Arc<Dictionaries>) -> Self {
        Self::with_rules(dictionaries, Self::default_rules())
    }

    pub fn with_rules(dictionaries: Arc<Dictionaries>, rules: Vec<IntentRule>) -> Self {
        Self {
            dictionaries,
            extractor: ParameterExtractor::new(),
            rules,
        }
    }

    pub fn dictionaries(&self) -> &Arc<Dictionaries> {
        &self.dictionaries
    }

    pub fn extractor(&self) -> &ParameterExtractor {
        &self.extractor
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(IntentRule::name).collect()
    }

    /// Classify raw query text. Total: unmatched or empty text is `GENERAL`.
    pub fn classify(&self, text: &str) -> Intent {
        let context = self.context(text);

        let kind = self
            .rules
            .iter()
            .find_map(|rule| {
                (rule.apply)(self, &context).map(|kind| {
                    debug!(rule = rule.name, query = %context.text, "Intent rule matched");
                    kind
                })
            })
            .unwrap_or_else(|| IntentKind::General {
                query: context.text.clone(),
            });

        Intent {
            kind,
            condition_pref: context.modifiers.condition_pref,
            wants_accessories: context.modifiers.wants_accessories,
        }
    }

    fn context(&self, text: &str) -> QueryContext {
        let normalized: String = text.nfc().collect();
        let text = normalized.split_whitespace().collect::<Vec<_>>().join(" ");
        let lower = text.to_lowercase();
        let modifiers = modifiers::detect(&lower, &self.dictionaries);
        QueryContext {
            text,
            lower,
            modifiers,
        }
    }

    fn default_rules() -> Vec<IntentRule> {
        vec![
            IntentRule::new("ean", rule_ean),
            IntentRule::new("sku", rule_sku),
            IntentRule::new("brand", rule_brand),
            IntentRule::new("model_inference", rule_model_inference),
            IntentRule::new("parametric", rule_parametric),
            IntentRule::new("category", rule_category),
            IntentRule::new("price", rule_price),
        ]
    }

    fn model_intent(&self, context: &QueryContext, brand: String, model_text: &str) -> IntentKind {
        let is_body_query = !context.modifiers.wants_accessories
            && self.dictionaries.is_body_model(&brand, model_text);
        IntentKind::Model(ModelIntent {
            query: context.text.clone(),
            model_query: context.modifiers.stripped.clone(),
            brand,
            is_body_query,
            accessory_category: context.modifiers.accessory_category.clone(),
        })
    }
}

fn rule_ean(_: &IntentClassifier, context: &QueryContext) -> Option<IntentKind> {
    EAN.is_match(&context.text).then(|| IntentKind::Ean {
        query: context.text.clone(),
    })
}

fn rule_sku(_: &IntentClassifier, context: &QueryContext) -> Option<IntentKind> {
    SKU.is_match(&context.text).then(|| IntentKind::Sku {
        query: context.text.clone(),
    })
}

fn rule_brand(classifier: &IntentClassifier, context: &QueryContext) -> Option<IntentKind> {
    let stripped = &context.modifiers.stripped;
    let found = classifier.dictionaries.find_brand(stripped)?;
    let remainder = stripped[found.end..].trim();

    if remainder.chars().any(char::is_alphanumeric) {
        return Some(classifier.model_intent(context, found.brand, remainder));
    }

    Some(IntentKind::Brand(BrandIntent {
        query: context.text.clone(),
        brand: found.brand,
        accessory_category: context.modifiers.accessory_category.clone(),
    }))
}

fn rule_model_inference(
    classifier: &IntentClassifier,
    context: &QueryContext,
) -> Option<IntentKind> {
    let stripped = &context.modifiers.stripped;
    let brand = classifier.dictionaries.infer_brand(stripped)?;
    Some(classifier.model_intent(context, brand, stripped))
}

fn rule_parametric(classifier: &IntentClassifier, context: &QueryContext) -> Option<IntentKind> {
    classifier
        .extractor
        .has_structured_params(&context.text)
        .then(|| IntentKind::Parametric {
            query: context.text.clone(),
        })
}

fn rule_category(classifier: &IntentClassifier, context: &QueryContext) -> Option<IntentKind> {
    let category = classifier.dictionaries.category_for(&context.lower)?;
    Some(IntentKind::Category(CategoryIntent {
        query: context.text.clone(),
        category: category.to_string(),
    }))
}

fn rule_price(_: &IntentClassifier, context: &QueryContext) -> Option<IntentKind> {
    let captures = PRICE.captures(&context.text)?;
    let max_price = captures
        .get(1)
        .or_else(|| captures.get(2))
        .and_then(|m| m.as_str().replace(',', ".").parse::<f64>().ok());
    let residual = PRICE.replace_all(&context.text, " ");
    Some(IntentKind::Price(PriceIntent {
        query: residual.split_whitespace().collect::<Vec<_>>().join(" "),
        max_price,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::models::ConditionPreference;

    fn classify(text: &str) -> Intent {
        IntentClassifier::default().classify(text)
    }

    #[test]
    fn rule_order_is_fixed() {
        assert_eq!(
            IntentClassifier::default().rule_names(),
            vec![
                "ean",
                "sku",
                "brand",
                "model_inference",
                "parametric",
                "category",
                "price"
            ]
        );
    }

    #[test]
    fn classifies_ean() {
        assert_eq!(classify("5901234123457").name(), "EAN");
        assert_eq!(classify(" 12345678 ").name(), "EAN");
        assert_eq!(classify("123456789").name(), "GENERAL");
    }

    #[test]
    fn sku_beats_brand_and_category() {
        let intent = classify("CAN-R6ii");
        assert_eq!(intent.kind, IntentKind::Sku { query: "CAN-R6ii".into() });
        assert_eq!(classify("sony_a7").name(), "SKU");
        assert_eq!(classify("abc-def").name(), "GENERAL");
    }

    #[test]
    fn brand_with_body_model() {
        let intent = classify("sony a7 iv");
        match intent.kind {
            IntentKind::Model(model) => {
                assert_eq!(model.brand, "sony");
                assert!(model.is_body_query);
                assert_eq!(model.model_query, "sony a7 iv");
            }
            other => panic!("expected MODEL, got {other:?}"),
        }
    }

    #[test]
    fn brand_with_lens_is_not_body() {
        match classify("Canon RF 50mm f/1.8").kind {
            IntentKind::Model(model) => {
                assert_eq!(model.brand, "canon");
                assert!(!model.is_body_query);
            }
            other => panic!("expected MODEL, got {other:?}"),
        }
    }

    #[test]
    fn inferred_brand_with_accessory() {
        let intent = classify("eos r6 akumulator");
        assert!(intent.wants_accessories);
        match intent.kind {
            IntentKind::Model(model) => {
                assert_eq!(model.brand, "canon");
                assert!(!model.is_body_query);
                assert_eq!(model.accessory_category.as_deref(), Some("Akumulatory"));
                assert_eq!(model.model_query, "eos r6");
            }
            other => panic!("expected MODEL, got {other:?}"),
        }
    }

    #[test]
    fn brand_alone_is_brand_intent() {
        let intent = classify("ładowarka Fuji");
        assert!(intent.wants_accessories);
        match intent.kind {
            IntentKind::Brand(brand) => {
                assert_eq!(brand.brand, "fujifilm");
                assert_eq!(brand.accessory_category.as_deref(), Some("Ładowarki"));
            }
            other => panic!("expected BRAND, got {other:?}"),
        }
    }

    #[test]
    fn condition_rides_along() {
        let intent = classify("używany nikon z6");
        assert_eq!(intent.condition_pref, Some(ConditionPreference::Used));
        assert!(intent.is_body_query());
    }

    #[test]
    fn full_frame_phrase_is_not_an_accessory() {
        let intent = classify("aparat pełna klatka");
        assert_eq!(intent.name(), "PARAMETRIC");
        assert!(!intent.wants_accessories);
    }

    #[test]
    fn preposition_z_with_a_number_is_not_a_nikon_model() {
        let intent = classify("plecak z 7 kieszeniami");
        assert_eq!(intent.name(), "GENERAL");
        assert!(intent.wants_accessories);
        assert_eq!(classify("nikon z 7").name(), "MODEL");
        assert_eq!(classify("z6ii używany").name(), "MODEL");
    }

    #[test]
    fn parameters_without_brand_are_parametric() {
        assert_eq!(classify("obiektyw 50mm f/1.8").name(), "PARAMETRIC");
        assert_eq!(classify("kamera 4k 60fps").name(), "PARAMETRIC");
    }

    #[test]
    fn category_is_case_and_whitespace_insensitive() {
        let intent = classify("  Statywy ");
        assert_eq!(
            intent.kind,
            IntentKind::Category(CategoryIntent {
                query: "Statywy".into(),
                category: "Statywy".into(),
            })
        );
    }

    #[test]
    fn price_phrase_is_parsed_and_stripped() {
        match classify("plecak do 500 zł").kind {
            IntentKind::Price(price) => {
                assert_eq!(price.query, "plecak");
                assert_eq!(price.max_price, Some(500.0));
            }
            other => panic!("expected PRICE, got {other:?}"),
        }
        match classify("tani monopod").kind {
            IntentKind::Price(price) => {
                assert_eq!(price.query, "monopod");
                assert_eq!(price.max_price, None);
            }
            other => panic!("expected PRICE, got {other:?}"),
        }
    }

    #[test]
    fn empty_and_unknown_text_fall_through_to_general() {
        assert_eq!(classify("").kind, IntentKind::General { query: String::new() });
        assert_eq!(classify("   ").name(), "GENERAL");
        assert_eq!(classify("monopod").name(), "GENERAL");
    }

    #[test]
    fn custom_rules_replace_cascade() {
        let classifier =
            IntentClassifier::with_rules(Dictionaries::builtin(), vec![IntentRule::new("ean", rule_ean)]);
        assert_eq!(classifier.classify("sony a7").name(), "GENERAL");
    }
}
