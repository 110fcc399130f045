// Inverted term index for substring search and autocomplete
use std::collections::{BTreeMap, BTreeSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::codec::string_items;
use crate::{Record, RecordId};

/// Scalar fields indexed as whole, lowercased values
const SCALAR_FIELDS: &[&str] = &[
    "holderName",
    "cultivars",
    "breeder",
    "farm",
    "type",
    "typeCulture",
    "landrace",
    "extractionMethod",
    "extractionSolvant",
    "texture",
    "recette",
];

/// Fields that may hold a list (or a single value); exploded element-wise
const LIST_FIELDS: &[&str] = &["substrat", "separationMethod", "ingredients"];

/// Lists of objects contributing their `name`
const NAMED_LIST_FIELDS: &[&str] = &["terpenes", "effects"];

/// Collect the searchable terms of a record.
///
/// Terms are whole field values, lowercased, not tokenized words.
pub fn extract_terms(record: &Record) -> BTreeSet<String> {
    let mut terms = BTreeSet::new();

    for field in SCALAR_FIELDS {
        if let Some(Value::String(s)) = record.get(field) {
            push_term(&mut terms, s);
        }
    }

    for field in LIST_FIELDS.iter().chain(NAMED_LIST_FIELDS) {
        for item in string_items(record.get(field)) {
            push_term(&mut terms, &item);
        }
    }

    terms
}

fn push_term(terms: &mut BTreeSet<String>, value: &str) {
    if !value.is_empty() {
        terms.insert(value.to_lowercase());
    }
}

/// Normalize a user query the way index keys are normalized
#[inline]
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Direct per-record scan: records with an extracted term containing `term`.
///
/// Same result set as [`SearchIndex::search`], without the index.
pub fn scan<'a, I>(records: I, term: &str) -> BTreeSet<RecordId>
where
    I: IntoIterator<Item = &'a Record>,
{
    let needle = normalize_query(term);
    records
        .into_iter()
        .filter_map(|record| {
            let id = record.id()?;
            extract_terms(record)
                .iter()
                .any(|t| t.contains(&needle))
                .then_some(id)
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchIndex {
    // term -> ids of records carrying that term
    terms: BTreeMap<String, BTreeSet<RecordId>>,
    total_docs: usize,
}

impl SearchIndex {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Invert `extract_terms` across a collection. Records without an id are skipped.
    pub fn build<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut index = Self::new();
        for record in records {
            let Some(id) = record.id() else { continue };
            for term in extract_terms(record) {
                index.terms.entry(term).or_default().insert(id.clone());
            }
            index.total_docs += 1;
        }
        index
    }

    /// Union of ids for every term containing `term` as a substring
    pub fn search(&self, term: &str) -> BTreeSet<RecordId> {
        let needle = normalize_query(term);
        let mut matches = BTreeSet::new();
        for (key, ids) in &self.terms {
            if key.contains(&needle) {
                matches.extend(ids.iter().cloned());
            }
        }
        matches
    }

    /// Terms starting with `partial`, lexicographic, at most `limit`
    pub fn suggest(&self, partial: &str, limit: usize) -> Vec<String> {
        let prefix = normalize_query(partial);
        if prefix.is_empty() {
            return Vec::new();
        }
        self.terms
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .take(limit)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Ids recorded under an exact term
    pub fn ids_for(&self, term: &str) -> Option<&BTreeSet<RecordId>> {
        self.terms.get(term)
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }

    /// Number of distinct terms
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Number of records that were indexed
    #[inline]
    #[must_use]
    pub fn doc_count(&self) -> usize {
        self.total_docs
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}
