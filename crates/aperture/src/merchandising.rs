//! Pinned and blacklisted products
//!
//! Rules are immutable once built. Reloading installs a whole new snapshot,
//! so a request that already took a snapshot keeps seeing the old rules.

use std::{
    collections::{BTreeSet, HashMap},
    path::Path,
    sync::Arc,
};

use aperture_core::{cache_key::normalize_query, schema, QueryNode};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{config::Result, pipeline::RankedProduct};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MerchandisingRules {
    /// Normalized query → product ids, in display order.
    pins: HashMap<String, Vec<String>>,
    blacklist: BTreeSet<String>,
}

impl MerchandisingRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pin(mut self, query: &str, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.pins
            .insert(normalize_query(query), ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn block(mut self, id: impl Into<String>) -> Self {
        self.blacklist.insert(id.into());
        self
    }

    /// Keys of a loaded file are normalized the same way queries are.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let parsed: MerchandisingRules = serde_json::from_str(&raw)?;
        Ok(Self {
            pins: parsed
                .pins
                .into_iter()
                .map(|(query, ids)| (normalize_query(&query), ids))
                .collect(),
            blacklist: parsed.blacklist,
        })
    }

    pub fn pins_for(&self, query: &str) -> &[String] {
        self.pins
            .get(&normalize_query(query))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_blocked(&self, id: &str) -> bool {
        self.blacklist.contains(id)
    }

    /// `must_not` clauses for every blacklisted id.
    pub fn exclusions(&self) -> Vec<QueryNode> {
        if self.blacklist.is_empty() {
            return Vec::new();
        }
        vec![QueryNode::terms(schema::ID, self.blacklist.iter().cloned())]
    }

    /// Move pinned products already on the page to the front, in pin order.
    pub fn apply_pins(&self, query: &str, products: &mut Vec<RankedProduct>) {
        let pins = self.pins_for(query);
        if pins.is_empty() {
            return;
        }
        let mut pinned = Vec::with_capacity(pins.len());
        for id in pins {
            if let Some(position) = products.iter().position(|product| &product.id == id) {
                pinned.push(products.remove(position));
            }
        }
        pinned.append(products);
        *products = pinned;
    }
}

/// Shared, atomically swappable rule snapshot.
#[derive(Debug, Default)]
pub struct RuleStore {
    current: RwLock<Arc<MerchandisingRules>>,
}

impl RuleStore {
    pub fn new(rules: MerchandisingRules) -> Self {
        Self {
            current: RwLock::new(Arc::new(rules)),
        }
    }

    pub fn snapshot(&self) -> Arc<MerchandisingRules> {
        Arc::clone(&self.current.read())
    }

    pub fn install(&self, rules: MerchandisingRules) {
        let pins = rules.pins.len();
        let blocked = rules.blacklist.len();
        *self.current.write() = Arc::new(rules);
        info!(pins, blocked, "Merchandising rules installed");
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use serde_json::json;

    fn product(id: &str) -> RankedProduct {
        RankedProduct {
            id: id.to_string(),
            score: 1.0,
            source: Default::default(),
        }
    }

    fn ids(products: &[RankedProduct]) -> Vec<&str> {
        products.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn pins_move_present_products_to_the_front() {
        let rules = MerchandisingRules::new().pin("Sony  A7", ["p-3", "p-missing", "p-2"]);
        let mut products = vec![product("p-1"), product("p-2"), product("p-3")];
        rules.apply_pins("sony a7", &mut products);
        assert_eq!(ids(&products), ["p-3", "p-2", "p-1"]);
    }

    #[test]
    fn unpinned_queries_keep_their_order() {
        let rules = MerchandisingRules::new().pin("statyw", ["p-3"]);
        let mut products = vec![product("p-1"), product("p-3")];
        rules.apply_pins("obiektyw", &mut products);
        assert_eq!(ids(&products), ["p-1", "p-3"]);
    }

    #[test]
    fn blacklist_becomes_one_terms_exclusion() {
        let rules = MerchandisingRules::new().block("p-9").block("p-1");
        let exclusions = rules.exclusions();
        assert_eq!(exclusions.len(), 1);
        assert_eq!(exclusions[0].to_wire(), json!({ "terms": { "id": ["p-1", "p-9"] } }));
        assert!(MerchandisingRules::new().exclusions().is_empty());
    }

    #[test]
    fn snapshots_survive_installs() {
        let store = RuleStore::new(MerchandisingRules::new().block("p-1"));
        let before = store.snapshot();
        store.install(MerchandisingRules::new().block("p-2"));

        assert!(before.is_blocked("p-1"));
        assert!(store.snapshot().is_blocked("p-2"));
        assert!(!store.snapshot().is_blocked("p-1"));
    }

    #[test]
    fn loads_and_normalizes_rule_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "pins": {{ "  Statyw  Manfrotto ": ["p-7"] }}, "blacklist": ["p-8"] }}"#
        )
        .unwrap();

        let rules = MerchandisingRules::load(file.path()).unwrap();
        assert_eq!(rules.pins_for("statyw manfrotto"), ["p-7".to_string()]);
        assert!(rules.is_blocked("p-8"));
    }
}
