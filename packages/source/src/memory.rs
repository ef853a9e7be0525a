//! In-memory record store.

use care_map_facility_models::FacilityRecord;

use crate::{FacilityFilter, RecordStore, SourceError};

/// A record store backed by a vector, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    records: Vec<FacilityRecord>,
}

impl MemoryRecordStore {
    /// Wraps `records`.
    #[must_use]
    pub const fn new(records: Vec<FacilityRecord>) -> Self {
        Self { records }
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordStore for MemoryRecordStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch_facilities(&self, filter: &FacilityFilter) -> Result<Vec<FacilityRecord>, SourceError> {
        Ok(self
            .records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }
}
