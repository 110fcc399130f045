//! Field resolution across a record and its auxiliary namespaces
//!
//! A logical field may live on the record itself or inside one of several
//! nested namespaces, possibly under a variant spelling of its key. The
//! resolver walks an ordered list of strategies and stops at the first hit:
//!
//! 1. exact key (or dotted path) on the record
//! 2. exact key (or dotted path) on each namespace, in priority order
//! 3. normalized key (lowercase, no diacritics, alphanumerics only)
//! 4. normalized plural form, then normalized singular form
//! 5. first normalized key that contains, or is contained in, the target
//!
//! The normalized index is built lazily, at most once per resolver, with the
//! first source winning whenever two keys normalize identically.

use std::borrow::Cow;

use ahash::AHashMap;
use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::codec::decode_object;
use crate::Record;

/// Namespaces consulted after the record itself, highest priority first
pub const DEFAULT_NAMESPACES: [&str; 3] = ["extraData", "categoryRatings", "ratings"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Auxiliary namespace field names in priority order
    #[serde(default = "default_namespaces")]
    pub namespaces: Vec<String>,
}

fn default_namespaces() -> Vec<String> {
    DEFAULT_NAMESPACES.iter().map(|s| s.to_string()).collect()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            namespaces: default_namespaces(),
        }
    }
}

/// Which step of the cascade produced a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    Exact,
    Namespace,
    Normalized,
    Plural,
    Singular,
    Fuzzy,
}

/// A resolved value with its provenance
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<'r> {
    pub value: &'r Value,
    pub strategy: MatchStrategy,
    /// 0 is the record itself, `n` is the n-th namespace that was present
    pub source: usize,
    /// Key as spelled in the source that matched
    pub matched_key: String,
}

struct IndexEntry {
    normalized: String,
    source: usize,
    key: String,
}

#[derive(Default)]
struct NormalizedIndex {
    entries: Vec<IndexEntry>,
    lookup: AHashMap<String, usize>,
}

impl NormalizedIndex {
    fn get(&self, normalized: &str) -> Option<&IndexEntry> {
        self.lookup.get(normalized).map(|&i| &self.entries[i])
    }
}

/// Resolver over one record and an explicit, prioritized list of namespaces
pub struct FieldResolver<'a> {
    sources: Vec<Cow<'a, Map<String, Value>>>,
    index: OnceCell<NormalizedIndex>,
}

impl<'a> FieldResolver<'a> {
    /// Build the source list: the record, then each namespace that is present.
    ///
    /// Namespaces stored as JSON-encoded strings are decoded; anything that is
    /// not an object after decoding is skipped.
    pub fn new<S: AsRef<str>>(record: &'a Record, namespaces: &[S]) -> Self {
        let mut sources = vec![Cow::Borrowed(record.fields())];
        for ns in namespaces {
            match record.get(ns.as_ref()) {
                Some(Value::Object(map)) => sources.push(Cow::Borrowed(map)),
                Some(encoded @ Value::String(_)) => {
                    let map = decode_object(Some(encoded));
                    if !map.is_empty() {
                        sources.push(Cow::Owned(map));
                    }
                }
                _ => {}
            }
        }
        Self {
            sources,
            index: OnceCell::new(),
        }
    }

    pub fn with_config(record: &'a Record, config: &ResolverConfig) -> Self {
        Self::new(record, &config.namespaces)
    }

    /// Resolve `key` to its value, if any strategy finds it
    pub fn resolve(&self, key: &str) -> Option<&Value> {
        self.resolve_detailed(key).map(|r| r.value)
    }

    /// Resolve `key` and report which strategy and source matched
    pub fn resolve_detailed(&self, key: &str) -> Option<Resolution<'_>> {
        for (source, map) in self.sources.iter().enumerate() {
            if let Some(value) = lookup_path(map, key) {
                let strategy = if source == 0 {
                    MatchStrategy::Exact
                } else {
                    MatchStrategy::Namespace
                };
                return Some(Resolution {
                    value,
                    strategy,
                    source,
                    matched_key: key.to_string(),
                });
            }
        }

        let target = normalize_key(key);
        if target.is_empty() {
            return None;
        }
        let index = self.normalized_index();

        if let Some(entry) = index.get(&target) {
            debug!(key, normalized = %target, "normalized match");
            return Some(self.hit(entry, MatchStrategy::Normalized));
        }

        let plural = if key.ends_with('s') {
            key.to_string()
        } else {
            format!("{}s", key)
        };
        let plural = normalize_key(&plural);
        if plural != target {
            if let Some(entry) = index.get(&plural) {
                debug!(key, normalized = %plural, "plural match");
                return Some(self.hit(entry, MatchStrategy::Plural));
            }
        }

        let singular = normalize_key(key.strip_suffix('s').unwrap_or(key));
        if singular != target {
            if let Some(entry) = index.get(&singular) {
                debug!(key, normalized = %singular, "singular match");
                return Some(self.hit(entry, MatchStrategy::Singular));
            }
        }

        let fuzzy = index
            .entries
            .iter()
            .find(|e| e.normalized.contains(&target) || target.contains(&e.normalized))?;
        debug!(key, normalized = %fuzzy.normalized, "fuzzy match");
        Some(self.hit(fuzzy, MatchStrategy::Fuzzy))
    }

    fn hit(&self, entry: &IndexEntry, strategy: MatchStrategy) -> Resolution<'_> {
        Resolution {
            value: &self.sources[entry.source][entry.key.as_str()],
            strategy,
            source: entry.source,
            matched_key: entry.key.clone(),
        }
    }

    fn normalized_index(&self) -> &NormalizedIndex {
        self.index.get_or_init(|| {
            let mut index = NormalizedIndex::default();
            for (source, map) in self.sources.iter().enumerate() {
                for key in map.keys() {
                    let normalized = normalize_key(key);
                    // an empty normalized key would fuzzy-match every target
                    if normalized.is_empty() || index.lookup.contains_key(&normalized) {
                        continue;
                    }
                    index.lookup.insert(normalized.clone(), index.entries.len());
                    index.entries.push(IndexEntry {
                        normalized,
                        source,
                        key: key.clone(),
                    });
                }
            }
            index
        })
    }
}

/// One-shot resolution returning an owned value
pub fn resolve<S: AsRef<str>>(record: &Record, namespaces: &[S], key: &str) -> Option<Value> {
    FieldResolver::new(record, namespaces).resolve(key).cloned()
}

/// Lowercase, strip diacritics and drop everything but ASCII alphanumerics
pub fn normalize_key(key: &str) -> String {
    key.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

/// Exact key first, then a dotted path through nested objects
fn lookup_path<'m>(map: &'m Map<String, Value>, key: &str) -> Option<&'m Value> {
    if let Some(value) = map.get(key) {
        return Some(value);
    }
    if !key.contains('.') {
        return None;
    }
    let mut parts = key.split('.');
    let mut current = map.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value) -> Record {
        Record::from_value(v).unwrap()
    }

    #[test]
    fn test_record_beats_namespace() {
        let r = record(json!({"taste": 8, "extraData": {"taste": 3}}));
        let resolver = FieldResolver::new(&r, &DEFAULT_NAMESPACES);
        let hit = resolver.resolve_detailed("taste").unwrap();
        assert_eq!(hit.value, &json!(8));
        assert_eq!(hit.strategy, MatchStrategy::Exact);
    }

    #[test]
    fn test_namespace_priority_order() {
        let r = record(json!({
            "ratings": {"aroma": 1},
            "extraData": {"aroma": 9}
        }));
        let resolver = FieldResolver::new(&r, &DEFAULT_NAMESPACES);
        let hit = resolver
            .resolve_detailed("aroma")
            .unwrap();
        assert_eq!(hit.value, &json!(9));
        assert_eq!(hit.strategy, MatchStrategy::Namespace);
        assert_eq!(hit.source, 1);
    }

    #[test]
    fn test_exact_namespace_beats_normalized_record_key() {
        let r = record(json!({"Densité": 2, "extraData": {"densite": 7}}));
        let resolver = FieldResolver::new(&r, &DEFAULT_NAMESPACES);
        let hit = resolver
            .resolve_detailed("densite")
            .unwrap();
        assert_eq!(hit.value, &json!(7));
        assert_eq!(hit.strategy, MatchStrategy::Namespace);
    }

    #[test]
    fn test_normalized_match_strips_accents_and_separators() {
        let r = record(json!({"Intensité_Fumée": 6}));
        let resolver = FieldResolver::new(&r, &DEFAULT_NAMESPACES);
        let hit = resolver
            .resolve_detailed("intensiteFumee")
            .unwrap();
        assert_eq!(hit.value, &json!(6));
        assert_eq!(hit.strategy, MatchStrategy::Normalized);
        assert_eq!(hit.matched_key, "Intensité_Fumée");
    }

    #[test]
    fn test_plural_fallback() {
        let r = record(json!({"tastes": 5}));
        let resolver = FieldResolver::new(&r, &DEFAULT_NAMESPACES);
        let hit = resolver
            .resolve_detailed("taste")
            .unwrap();
        assert_eq!(hit.value, &json!(5));
        assert_eq!(hit.strategy, MatchStrategy::Plural);
    }

    #[test]
    fn test_singular_fallback() {
        let r = record(json!({"extraData": {"intensiteEffet": 4}}));
        let resolver = FieldResolver::new(&r, &DEFAULT_NAMESPACES);
        let hit = resolver
            .resolve_detailed("intensiteEffets")
            .unwrap();
        assert_eq!(hit.value, &json!(4));
        assert_eq!(hit.strategy, MatchStrategy::Singular);
    }

    #[test]
    fn test_fuzzy_fallback_takes_first_candidate() {
        let r = record(json!({"aromasIntensity": 7, "aromasIntensityBis": 2}));
        let resolver = FieldResolver::new(&r, &DEFAULT_NAMESPACES);
        let hit = resolver
            .resolve_detailed("aromas")
            .unwrap();
        assert_eq!(hit.strategy, MatchStrategy::Fuzzy);
        assert_eq!(hit.value, &json!(7));
    }

    #[test]
    fn test_null_is_a_found_value() {
        let r = record(json!({"taste": null, "extraData": {"taste": 3}}));
        assert_eq!(resolve(&r, &DEFAULT_NAMESPACES, "taste"), Some(Value::Null));
    }

    #[test]
    fn test_dotted_path() {
        let r = record(json!({"extraData": {"visual": {"densite": 8}}}));
        assert_eq!(
            resolve(&r, &DEFAULT_NAMESPACES, "extraData.visual.densite"),
            Some(json!(8))
        );
        assert_eq!(resolve(&r, &DEFAULT_NAMESPACES, "visual.densite"), Some(json!(8)));
    }

    #[test]
    fn test_encoded_namespace_is_decoded() {
        let r = record(json!({"extraData": "{\"montee\": 9}"}));
        assert_eq!(resolve(&r, &DEFAULT_NAMESPACES, "montee"), Some(json!(9)));
    }

    #[test]
    fn test_unresolvable_and_empty_keys() {
        let r = record(json!({"a": 1}));
        let resolver = FieldResolver::new(&r, &DEFAULT_NAMESPACES);
        assert_eq!(resolver.resolve("zzz"), None);
        assert_eq!(resolver.resolve("__"), None);
    }

    #[test]
    fn test_punctuation_keys_stay_out_of_fuzzy_stage() {
        let r = record(json!({"--": 4, "densite": 7}));
        let resolver = FieldResolver::new(&r, &DEFAULT_NAMESPACES);
        assert_eq!(resolver.resolve("montee"), None);
        assert_eq!(resolver.resolve("densiteTexture"), Some(&json!(7)));
        assert_eq!(resolver.resolve("--"), Some(&json!(4)));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let r = record(json!({"cendres": 3, "extraData": {"cendreX": 4}}));
        let resolver = FieldResolver::new(&r, &DEFAULT_NAMESPACES);
        let first = resolver.resolve_detailed("cendre").unwrap();
        let second = resolver.resolve_detailed("cendre").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.value, &json!(3));
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("Intensité Fumée"), "intensitefumee");
        assert_eq!(normalize_key("some.dotted_key-2"), "somedottedkey2");
    }
}
