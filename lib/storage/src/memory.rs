use parking_lot::RwLock;
use reviewdex_core::{Record, RecordId, Result};
use tracing::debug;

use crate::store::RecordStore;

/// In-process store; the snapshot is shared behind a read-write lock
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<Record>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store; records without an id get a generated one
    pub fn with_records(records: Vec<Record>) -> Self {
        let store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    /// Insert or replace by id, assigning an id when missing
    pub fn insert(&self, mut record: Record) -> RecordId {
        let id = record.ensure_id();
        let mut records = self.records.write();
        match records.iter().position(|r| r.id().as_ref() == Some(&id)) {
            Some(pos) => records[pos] = record,
            None => records.push(record),
        }
        id
    }

    pub fn get(&self, id: &RecordId) -> Option<Record> {
        self.records
            .read()
            .iter()
            .find(|r| r.id().as_ref() == Some(id))
            .cloned()
    }

    pub fn remove(&self, id: &RecordId) -> bool {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|r| r.id().as_ref() != Some(id));
        records.len() != before
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl RecordStore for MemoryStore {
    fn load_all(&self) -> Result<Vec<Record>> {
        Ok(self.records.read().clone())
    }

    fn save_all(&self, records: &[Record]) -> Result<()> {
        let mut snapshot = records.to_vec();
        for record in &mut snapshot {
            record.ensure_id();
        }
        debug!(records = snapshot.len(), "memory store replaced");
        *self.records.write() = snapshot;
        Ok(())
    }
}
