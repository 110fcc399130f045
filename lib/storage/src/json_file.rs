use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use atomicwrites::{AtomicFile, OverwriteBehavior};
use reviewdex_core::codec::encode_structured;
use reviewdex_core::{Error, Record, Result};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::store::RecordStore;

/// Records kept in one JSON document on disk.
///
/// Accepts either a bare array or `{"records": [...]}` on load; always writes
/// a bare array. Writes go through a temporary file and an atomic rename.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    encode_structured: bool,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            encode_structured: false,
        }
    }

    /// Save lists and objects as JSON strings, for layers that only keep scalars
    #[must_use]
    pub fn encode_structured(mut self, enabled: bool) -> Self {
        self.encode_structured = enabled;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(&self, value: Value) -> Result<Vec<Record>> {
        let items = match value {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("records") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(Error::Storage(format!(
                        "{}: expected an array or an object with a records array",
                        self.path.display()
                    )))
                }
            },
            _ => {
                return Err(Error::Storage(format!(
                    "{}: expected an array of records",
                    self.path.display()
                )))
            }
        };

        let mut records = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            match Record::from_value(item) {
                Ok(record) => records.push(record),
                Err(e) => warn!(path = %self.path.display(), index = i, error = %e, "skipping record"),
            }
        }
        Ok(records)
    }

    fn prepare(&self, record: &Record) -> Value {
        if !self.encode_structured {
            return record.clone().into_value();
        }
        let mut stored = record.clone();
        for value in stored.fields_mut().values_mut() {
            *value = encode_structured(value);
        }
        stored.into_value()
    }
}

impl RecordStore for JsonFileStore {
    /// A missing file is an empty store
    fn load_all(&self) -> Result<Vec<Record>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "record file missing, starting empty");
            return Ok(Vec::new());
        }
        let bytes = fs::read(&self.path)?;
        let value: Value = serde_json::from_slice(&bytes)?;
        let records = self.parse(value)?;
        info!(path = %self.path.display(), records = records.len(), "records loaded");
        Ok(records)
    }

    fn save_all(&self, records: &[Record]) -> Result<()> {
        let payload = Value::Array(records.iter().map(|r| self.prepare(r)).collect());
        let bytes = serde_json::to_vec_pretty(&payload)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        AtomicFile::new(&self.path, OverwriteBehavior::AllowOverwrite)
            .write(|f| f.write_all(&bytes))
            .map_err(|e| Error::Storage(format!("{}: {}", self.path.display(), e)))?;

        debug!(path = %self.path.display(), records = records.len(), "records saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn record(v: Value) -> Record {
        Record::from_value(v).unwrap()
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("nope.json"));
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/reviews.json"));
        let records = vec![
            record(json!({"id": 1, "type": "Hash", "pipelineSeparation": [{"id": 1, "name": "Tamisage WPFF"}]})),
            record(json!({"id": "x", "type": "Fleur"})),
        ];
        store.save_all(&records).unwrap();
        assert_eq!(store.load_all().unwrap(), records);
    }

    #[test]
    fn test_wrapped_document_accepted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reviews.json");
        fs::write(&path, r#"{"records": [{"id": 1}, 42, {"id": 2}]}"#).unwrap();
        let loaded = JsonFileStore::new(&path).load_all().unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn test_invalid_document_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reviews.json");
        fs::write(&path, "\"just a string\"").unwrap();
        assert!(matches!(JsonFileStore::new(&path).load_all(), Err(Error::Storage(_))));

        fs::write(&path, "{not json").unwrap();
        assert!(matches!(JsonFileStore::new(&path).load_all(), Err(Error::Serialization(_))));
    }

    #[test]
    fn test_encode_structured_on_save() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("reviews.json")).encode_structured(true);
        store
            .save_all(&[record(json!({"id": 1, "terpenes": [{"name": "Myrcene"}], "densite": 7}))])
            .unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded[0].get("terpenes"), Some(&json!("[{\"name\":\"Myrcene\"}]")));
        assert_eq!(loaded[0].get("densite"), Some(&json!(7)));
    }
}
