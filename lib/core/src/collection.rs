use crate::{Error, FilterCriteria, FilterPipeline, Rater, Record, RecordId, Result, SearchIndex};
use std::collections::BTreeSet;
use tracing::debug;

/// A snapshot of review records with its search index.
///
/// The index is rebuilt wholesale after every change to the record set;
/// it is never patched in place.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    records: Vec<Record>,
    index: SearchIndex,
}

impl Collection {
    pub fn new(records: Vec<Record>) -> Self {
        let index = SearchIndex::build(&records);
        Self { records, index }
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Insert or replace a record by id
    pub fn upsert(&mut self, record: Record) -> Result<()> {
        let id = record.id().ok_or(Error::MissingId)?;
        match self.records.iter().position(|r| r.id().as_ref() == Some(&id)) {
            Some(pos) => self.records[pos] = record,
            None => self.records.push(record),
        }
        self.rebuild_index();
        Ok(())
    }

    /// Get a record by id
    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.records.iter().find(|r| r.id().as_ref() == Some(id))
    }

    /// Get a record by id, or `RecordNotFound`
    pub fn require(&self, id: &RecordId) -> Result<&Record> {
        self.get(id)
            .ok_or_else(|| Error::RecordNotFound(id.to_string()))
    }

    /// Delete a record by id
    pub fn delete(&mut self, id: &RecordId) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id().as_ref() != Some(id));
        let removed = self.records.len() != before;
        if removed {
            self.rebuild_index();
        }
        removed
    }

    /// Substring search over indexed terms
    pub fn search(&self, term: &str) -> BTreeSet<RecordId> {
        self.index.search(term)
    }

    /// Autocomplete over indexed terms
    pub fn suggest(&self, partial: &str, limit: usize) -> Vec<String> {
        self.index.suggest(partial, limit)
    }

    /// Filter and sort for a listing screen
    pub fn list(&self, criteria: FilterCriteria, rater: &dyn Rater) -> Vec<&Record> {
        FilterPipeline::new(criteria).apply(&self.records, &self.index, rater)
    }

    fn rebuild_index(&mut self) {
        self.index = SearchIndex::build(&self.records);
        debug!(records = self.records.len(), terms = self.index.len(), "search index rebuilt");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoredRating;
    use serde_json::json;

    fn record(v: serde_json::Value) -> Record {
        Record::from_value(v).unwrap()
    }

    #[test]
    fn test_index_follows_mutations() {
        let mut collection = Collection::new(vec![record(json!({"id": 1, "holderName": "Gelato"}))]);
        assert_eq!(collection.search("gel").len(), 1);

        collection
            .upsert(record(json!({"id": 1, "holderName": "Zkittlez"})))
            .unwrap();
        assert_eq!(collection.count(), 1);
        assert!(collection.search("gel").is_empty());
        assert_eq!(collection.suggest("zk", 3), vec!["zkittlez"]);

        assert!(collection.delete(&RecordId::Integer(1)));
        assert!(collection.index().is_empty());
        assert!(!collection.delete(&RecordId::Integer(1)));
    }

    #[test]
    fn test_upsert_requires_id() {
        let mut collection = Collection::default();
        assert!(matches!(
            collection.upsert(record(json!({"holderName": "anon"}))),
            Err(Error::MissingId)
        ));
    }

    #[test]
    fn test_require_reports_missing_id() {
        let collection = Collection::new(vec![record(json!({"id": 1, "holderName": "Gelato"}))]);
        assert!(collection.require(&RecordId::Integer(1)).is_ok());
        assert!(matches!(
            collection.require(&RecordId::Integer(2)),
            Err(Error::RecordNotFound(id)) if id == "2"
        ));
    }

    #[test]
    fn test_list_uses_pipeline() {
        let collection = Collection::new(vec![
            record(json!({"id": 1, "type": "Hash", "holderName": "b"})),
            record(json!({"id": 2, "type": "Fleur", "holderName": "a"})),
        ]);
        let criteria = FilterCriteria {
            kind: Some("Fleur".into()),
            ..Default::default()
        };
        let found = collection.list(criteria, &StoredRating);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), Some(RecordId::Integer(2)));
    }
}
