//! Condition and accessory modifiers, detected independently of the cascade.

use crate::dictionaries::Dictionaries;

use super::models::ConditionPreference;

/// Minimum length before a partially typed word is matched by prefix.
pub const MIN_ACCESSORY_PREFIX: usize = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub condition_pref: Option<ConditionPreference>,
    pub wants_accessories: bool,
    pub accessory_category: Option<String>,
    /// Lowercase text with modifier and connector words removed.
    pub stripped: String,
}

/// Detect modifiers on lowercase, whitespace-normalized text.
pub fn detect(text: &str, dictionaries: &Dictionaries) -> Modifiers {
    let words: Vec<&str> = text.split_whitespace().collect();

    let condition_pref = if words.iter().any(|w| dictionaries.is_used_word(bare(w))) {
        Some(ConditionPreference::Used)
    } else if words.iter().any(|w| dictionaries.is_new_word(bare(w))) {
        Some(ConditionPreference::New)
    } else {
        None
    };

    let mut wants_accessories = false;
    let mut exact_category = None;
    let mut prefix_category = None;
    let mut kept = Vec::with_capacity(words.len());

    for word in &words {
        let key = bare(word);
        if let Some(category) = dictionaries.accessory_category_exact(key) {
            wants_accessories = true;
            exact_category.get_or_insert_with(|| category.to_string());
            continue;
        }
        if dictionaries.is_accessory_word(key) {
            wants_accessories = true;
            continue;
        }
        if dictionaries.is_used_word(key)
            || dictionaries.is_new_word(key)
            || dictionaries.is_connector_word(key)
        {
            continue;
        }
        if key.chars().count() >= MIN_ACCESSORY_PREFIX {
            if let Some((_, category)) = dictionaries.accessory_category_prefix(key) {
                wants_accessories = true;
                prefix_category.get_or_insert_with(|| category.to_string());
                continue;
            }
        }
        kept.push(*word);
    }

    Modifiers {
        condition_pref,
        wants_accessories,
        accessory_category: exact_category.or(prefix_category),
        stripped: kept.join(" "),
    }
}

fn bare(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_alphanumeric())
}
