#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Facility record stores.
//!
//! The engine never owns persistence. It asks a [`RecordStore`] for
//! [`FacilityRecord`]s matching a [`FacilityFilter`] and builds its
//! in-memory snapshot from whatever comes back. Two stores ship here: a
//! CSV file export ([`csv_store::CsvRecordStore`]) and a plain vector for
//! tests and embedding ([`memory::MemoryRecordStore`]).

pub mod csv_store;
pub mod memory;
pub mod progress;

pub use csv_store::CsvRecordStore;
pub use memory::MemoryRecordStore;

use care_map_facility_models::FacilityRecord;

/// Errors that can occur while reading facility records.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// I/O error opening or reading the source.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The CSV could not be read (bad header row, invalid UTF-8).
    #[error("CSV error in {path}: {source}")]
    Csv {
        /// Path to the CSV file.
        path: String,
        /// Underlying CSV error.
        source: csv::Error,
    },
}

/// Row filter applied by the record store.
///
/// Both filters are case-insensitive substring matches; an absent or
/// blank filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacilityFilter {
    /// Match against the record's region text.
    pub region: Option<String>,
    /// Match against the record's facility type.
    pub facility_type: Option<String>,
}

impl FacilityFilter {
    /// A filter that matches every record.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Whether `record` passes the filter.
    #[must_use]
    pub fn matches(&self, record: &FacilityRecord) -> bool {
        contains_ci(self.region.as_deref(), record.region.as_deref())
            && contains_ci(self.facility_type.as_deref(), record.facility_type.as_deref())
    }
}

fn contains_ci(needle: Option<&str>, haystack: Option<&str>) -> bool {
    let Some(needle) = needle.map(str::trim).filter(|n| !n.is_empty()) else {
        return true;
    };
    haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
}

/// A source of facility records.
pub trait RecordStore: Send + Sync {
    /// Short name for logging (e.g. the file path).
    fn name(&self) -> &str;

    /// Returns every record that passes `filter`, in source order.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the underlying source cannot be read.
    fn fetch_facilities(&self, filter: &FacilityFilter) -> Result<Vec<FacilityRecord>, SourceError>;
}
