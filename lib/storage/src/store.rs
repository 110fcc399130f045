use reviewdex_core::{Record, Result};

/// Whole-snapshot record source
pub trait RecordStore: Send + Sync {
    /// Load every record
    fn load_all(&self) -> Result<Vec<Record>>;

    /// Replace the stored snapshot
    fn save_all(&self, records: &[Record]) -> Result<()>;
}
