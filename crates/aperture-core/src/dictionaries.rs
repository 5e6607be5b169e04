//! Static vocabularies used by intent classification.
//!
//! Dictionaries are read-only after construction and shared behind an `Arc`.
//! The built-in tables cover the photo-video catalog; a TOML file can replace
//! any section (missing sections keep their built-in values).

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    path::Path,
    sync::Arc,
};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{CoreError, Result};

lazy_static! {
    static ref BUILTIN: Arc<Dictionaries> = Arc::new(
        Dictionaries::compile(DictionarySource::default()).expect("built-in dictionaries compile")
    );
}

/// Ordered model-name pattern -> brand inference entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBrandPattern {
    pub pattern: String,
    pub brand: String,
}

/// Serializable dictionary tables, as loaded from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionarySource {
    /// Known brand names (lowercase).
    pub brands: Vec<String>,
    /// Alternate spellings mapped to a canonical brand.
    pub brand_aliases: BTreeMap<String, String>,
    /// Whole-query category names (lowercase) -> category value.
    pub categories: BTreeMap<String, String>,
    /// Single accessory keyword -> accessory category.
    pub accessory_keywords: BTreeMap<String, String>,
    /// Words signalling accessories without naming a category.
    pub accessory_words: Vec<String>,
    pub used_words: Vec<String>,
    pub new_words: Vec<String>,
    /// Connector words ("do", "for") dropped when isolating a model name.
    pub connector_words: Vec<String>,
    /// Brand -> anchored pattern recognising camera-body model names.
    pub body_patterns: BTreeMap<String, String>,
    /// Evaluated in order; first match infers the brand.
    pub model_brand_patterns: Vec<ModelBrandPattern>,
}

/// Compiled, lookup-ready dictionaries.
#[derive(Debug)]
pub struct Dictionaries {
    brands: Vec<(String, Regex)>,
    brand_aliases: HashMap<String, String>,
    categories: HashMap<String, String>,
    accessory_keywords: BTreeMap<String, String>,
    accessory_words: HashSet<String>,
    used_words: HashSet<String>,
    new_words: HashSet<String>,
    connector_words: HashSet<String>,
    body_patterns: HashMap<String, Regex>,
    model_brand_patterns: Vec<(Regex, String)>,
}

/// A brand located in query text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandMatch {
    /// Canonical brand name.
    pub brand: String,
    pub start: usize,
    pub end: usize,
}

impl Dictionaries {
    /// Shared built-in dictionaries.
    pub fn builtin() -> Arc<Self> {
        Arc::clone(&BUILTIN)
    }

    /// Load a TOML override file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let source: DictionarySource = toml::from_str(&raw)?;
        info!(path = %path.display(), brands = source.brands.len(), "Loaded dictionaries");
        Self::compile(source)
    }

    pub fn compile(source: DictionarySource) -> Result<Self> {
        let mut brands = Vec::with_capacity(source.brands.len() + source.brand_aliases.len());
        for name in source.brands.iter().chain(source.brand_aliases.keys()) {
            let name = name.to_lowercase();
            let pattern = format!(r"(?i)\b{}\b", regex::escape(&name));
            let regex = Regex::new(&pattern).map_err(|e| CoreError::pattern(&name, e))?;
            brands.push((name, regex));
        }

        let mut body_patterns = HashMap::new();
        for (brand, pattern) in &source.body_patterns {
            let regex = Regex::new(&format!("(?i){pattern}"))
                .map_err(|e| CoreError::pattern(format!("body:{brand}"), e))?;
            body_patterns.insert(brand.to_lowercase(), regex);
        }

        let mut model_brand_patterns = Vec::with_capacity(source.model_brand_patterns.len());
        for entry in &source.model_brand_patterns {
            let regex = Regex::new(&format!("(?i){}", entry.pattern))
                .map_err(|e| CoreError::pattern(format!("model:{}", entry.brand), e))?;
            model_brand_patterns.push((regex, entry.brand.to_lowercase()));
        }

        Ok(Self {
            brands,
            brand_aliases: lowercase_map(&source.brand_aliases),
            categories: lowercase_map(&source.categories),
            accessory_keywords: source
                .accessory_keywords
                .iter()
                .map(|(k, v)| (k.to_lowercase(), v.clone()))
                .collect(),
            accessory_words: lowercase_set(&source.accessory_words),
            used_words: lowercase_set(&source.used_words),
            new_words: lowercase_set(&source.new_words),
            connector_words: lowercase_set(&source.connector_words),
            body_patterns,
            model_brand_patterns,
        })
    }

    /// Earliest whole-word brand occurrence; ties go to the longer name.
    pub fn find_brand(&self, text: &str) -> Option<BrandMatch> {
        self.brands
            .iter()
            .filter_map(|(name, regex)| regex.find(text).map(|m| (name, m.start(), m.end())))
            .min_by(|a, b| a.1.cmp(&b.1).then_with(|| b.2.cmp(&a.2)))
            .map(|(name, start, end)| BrandMatch {
                brand: self.canonical_brand(name),
                start,
                end,
            })
    }

    pub fn canonical_brand(&self, name: &str) -> String {
        let name = name.to_lowercase();
        self.brand_aliases.get(&name).cloned().unwrap_or(name)
    }

    /// First model pattern that matches anywhere in the text.
    pub fn infer_brand(&self, text: &str) -> Option<String> {
        self.model_brand_patterns
            .iter()
            .find(|(regex, _)| regex.is_match(text))
            .map(|(_, brand)| brand.clone())
    }

    /// True when the brand's body pattern recognises the model text.
    pub fn is_body_model(&self, brand: &str, model_text: &str) -> bool {
        self.body_patterns
            .get(brand)
            .map(|regex| regex.is_match(model_text.trim()))
            .unwrap_or(false)
    }

    /// Exact, case-insensitive, trimmed whole-text category lookup.
    pub fn category_for(&self, text: &str) -> Option<&str> {
        let key = text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        self.categories.get(&key).map(String::as_str)
    }

    pub fn accessory_category_exact(&self, word: &str) -> Option<&str> {
        self.accessory_keywords.get(word).map(String::as_str)
    }

    /// First keyword (in sorted order) that starts with the given prefix.
    pub fn accessory_category_prefix(&self, prefix: &str) -> Option<(&str, &str)> {
        self.accessory_keywords
            .range(prefix.to_string()..)
            .take_while(|(keyword, _)| keyword.starts_with(prefix))
            .next()
            .map(|(keyword, category)| (keyword.as_str(), category.as_str()))
    }

    pub fn is_accessory_word(&self, word: &str) -> bool {
        self.accessory_words.contains(word)
    }

    pub fn is_used_word(&self, word: &str) -> bool {
        self.used_words.contains(word)
    }

    pub fn is_new_word(&self, word: &str) -> bool {
        self.new_words.contains(word)
    }

    pub fn is_connector_word(&self, word: &str) -> bool {
        self.connector_words.contains(word)
    }

    pub fn brand_count(&self) -> usize {
        self.brands.len()
    }
}

fn lowercase_map(source: &BTreeMap<String, String>) -> HashMap<String, String> {
    source
        .iter()
        .map(|(k, v)| (k.to_lowercase(), v.clone()))
        .collect()
}

fn lowercase_set(source: &[String]) -> HashSet<String> {
    source.iter().map(|word| word.to_lowercase()).collect()
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn table(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl Default for DictionarySource {
    fn default() -> Self {
        Self {
            brands: owned(&[
                "canon", "nikon", "sony", "fujifilm", "panasonic", "olympus", "om system",
                "leica", "hasselblad", "pentax", "ricoh", "sigma", "tamron", "samyang",
                "tokina", "zeiss", "viltrox", "laowa", "dji", "gopro", "insta360",
                "blackmagic", "atomos", "manfrotto", "benro", "sirui", "joby", "peak design",
                "lowepro", "think tank", "godox", "profoto", "elinchrom", "nanlite",
                "aputure", "rode", "sennheiser", "saramonic", "tascam", "sandisk", "lexar",
                "hoya", "b+w", "nisi", "kase", "marumi", "smallrig", "zhiyun", "tilta",
                "sekonic", "kodak",
            ]),
            brand_aliases: table(&[("fuji", "fujifilm"), ("om-system", "om system")]),
            categories: table(&[
                ("aparaty", "Aparaty cyfrowe"),
                ("aparat", "Aparaty cyfrowe"),
                ("aparaty cyfrowe", "Aparaty cyfrowe"),
                ("bezlusterkowce", "Aparaty bezlusterkowe"),
                ("aparaty bezlusterkowe", "Aparaty bezlusterkowe"),
                ("lustrzanki", "Lustrzanki cyfrowe"),
                ("obiektywy", "Obiektywy"),
                ("obiektyw", "Obiektywy"),
                ("statywy", "Statywy"),
                ("statyw", "Statywy"),
                ("lampy błyskowe", "Lampy błyskowe"),
                ("lampy", "Lampy błyskowe"),
                ("mikrofony", "Mikrofony"),
                ("filtry", "Filtry"),
                ("torby", "Torby i plecaki"),
                ("plecaki", "Torby i plecaki"),
                ("karty pamięci", "Karty pamięci"),
                ("drony", "Drony"),
                ("gimbale", "Gimbale"),
                ("kamery", "Kamery"),
                ("akumulatory", "Akumulatory"),
                ("ładowarki", "Ładowarki"),
                ("oświetlenie", "Oświetlenie ciągłe"),
                ("monitory", "Monitory podglądowe"),
            ]),
            accessory_keywords: table(&[
                ("akumulator", "Akumulatory"),
                ("akumulatory", "Akumulatory"),
                ("akumulatora", "Akumulatory"),
                ("bateria", "Akumulatory"),
                ("baterie", "Akumulatory"),
                ("battery", "Akumulatory"),
                ("ładowarka", "Ładowarki"),
                ("ładowarki", "Ładowarki"),
                ("ladowarka", "Ładowarki"),
                ("charger", "Ładowarki"),
                ("torba", "Torby i plecaki"),
                ("plecak", "Torby i plecaki"),
                ("bag", "Torby i plecaki"),
                ("karta", "Karty pamięci"),
                ("card", "Karty pamięci"),
                ("filtr", "Filtry"),
                ("filter", "Filtry"),
                ("statyw", "Statywy"),
                ("tripod", "Statywy"),
                ("grip", "Gripy"),
                ("dekiel", "Dekielki"),
                ("dekielek", "Dekielki"),
                ("osłona", "Osłony przeciwsłoneczne"),
                ("osłonka", "Osłony przeciwsłoneczne"),
                ("hood", "Osłony przeciwsłoneczne"),
                ("pasek", "Paski"),
                ("strap", "Paski"),
                ("adapter", "Adaptery"),
                ("pilot", "Piloty i wężyki"),
                ("wężyk", "Piloty i wężyki"),
                ("cage", "Klatki operatorskie"),
                ("folia", "Osłony LCD"),
                ("mikrofon", "Mikrofony"),
                ("lampa", "Lampy błyskowe"),
            ]),
            accessory_words: owned(&[
                "akcesoria", "akcesorium", "akcesoriów", "accessories", "accessory",
                "zamiennik", "zamienny",
            ]),
            used_words: owned(&[
                "używany", "używana", "używane", "uzywany", "uzywana", "uzywane", "used",
                "komis",
            ]),
            new_words: owned(&["nowy", "nowa", "nowe", "new", "fabrycznie"]),
            connector_words: owned(&["do", "dla", "for", "pod"]),
            body_patterns: table(&[
                ("canon", r"^(eos\s*)?(r\d{0,2}|rp|\d{1,4}d|m\d{0,3})(\s|$)"),
                (
                    "sony",
                    r"^(alpha\s*)?(a\d{1,4}[a-z]{0,2}|ilce-?\d+[a-z]*|zv-?e?\d+[a-z]*|fx\d+|rx\d+)(\s|$)",
                ),
                ("nikon", r"^(z\s?\d{1,2}|z\s?fc?|d\d{2,4})(\s|$)"),
                ("fujifilm", r"^(x-?[a-z]{1,2}\d{1,3}[a-z]*|x100[a-z]*|gfx\s?\d*[a-z]*)(\s|$)"),
                ("panasonic", r"^(lumix\s*)?(dc-?)?(s\d[a-z]*|gh\d[a-z]*|g\d{1,2}|fz\d+)(\s|$)"),
                ("olympus", r"^(om-?d\s*)?(e-?m\d{1,2}|pen)(\s|$)"),
                ("om system", r"^(om-?\d)(\s|$)"),
                ("leica", r"^(m\d{1,2}|q\d?|sl\d?|cl|tl\d?)(\s|$)"),
                ("hasselblad", r"^(x\d[a-z]*|907x)(\s|$)"),
                ("pentax", r"^(k-?\d+|kp)(\s|$)"),
                ("dji", r"^(mini|air|mavic|avata|inspire|osmo)(\s|$)"),
                ("gopro", r"^(hero\s?\d+)(\s|$)"),
                ("blackmagic", r"^(pocket|bmpcc|ursa)(\s|$)"),
            ]),
            model_brand_patterns: [
                (r"\beos\b", "canon"),
                (r"\b(alpha|a7[a-z]*|a9|a1|a6\d{3}|zv-?e?\d+|ilce)\b", "sony"),
                (r"\b(z[5-9](ii)?|zfc?|z30|z50|d\d{3,4})\b", "nikon"),
                (r"\b(x-?t\d+|x-?s\d+|x-?h\d+|x-?e\d|x100[a-z]*|gfx)\b", "fujifilm"),
                (r"\b(lumix|gh[4-7]|s5(ii)?x?)\b", "panasonic"),
                (r"\b(om-?d|e-?m\d+)\b", "olympus"),
                (r"\bom-?[15]\b", "om system"),
                (r"\bhero\s?\d+\b", "gopro"),
                (r"\b(mavic|osmo|avata|ronin)\b", "dji"),
            ]
            .iter()
            .map(|(pattern, brand)| ModelBrandPattern {
                pattern: pattern.to_string(),
                brand: brand.to_string(),
            })
            .collect(),
        }
    }
}
