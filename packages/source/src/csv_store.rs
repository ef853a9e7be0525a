//! CSV facility export.
//!
//! Reads the flat facility export (one row per facility, list-valued
//! columns as encoded text). The whole file is loaded once when the store
//! is opened; `fetch_facilities` filters the loaded rows.

use std::io::Read;
use std::path::Path;

use care_map_facility_models::FacilityRecord;
use serde::Deserialize;

use crate::progress::ProgressCallback;
use crate::{FacilityFilter, RecordStore, SourceError};

/// Rows between progress updates.
const PROGRESS_BATCH: u64 = 500;

/// One row of the export, with the export's own column names.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(default, rename = "unique_id")]
    unique_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "address_city")]
    city: Option<String>,
    #[serde(default, rename = "address_stateOrRegion")]
    region: Option<String>,
    #[serde(default, rename = "address_line1")]
    address_line: Option<String>,
    #[serde(default)]
    lat: Option<String>,
    #[serde(default)]
    long: Option<String>,
    #[serde(default)]
    specialties: Option<String>,
    #[serde(default, rename = "procedure")]
    procedures: Option<String>,
    #[serde(default)]
    equipment: Option<String>,
    #[serde(default, rename = "capability")]
    capabilities: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, rename = "facilityTypeId")]
    facility_type: Option<String>,
    #[serde(default, rename = "operatorTypeId")]
    operator_type: Option<String>,
    #[serde(default, rename = "numberDoctors")]
    num_doctors: Option<String>,
    #[serde(default)]
    capacity: Option<String>,
    #[serde(default, rename = "yearEstablished")]
    year_established: Option<String>,
}

impl CsvRow {
    /// Converts to a record; rows with neither id nor name are dropped.
    fn into_record(self, row_number: u64) -> Option<FacilityRecord> {
        let id = clean(self.unique_id);
        let name = clean(self.name);
        if id.is_none() && name.is_none() {
            return None;
        }

        Some(FacilityRecord {
            id: id.unwrap_or_else(|| format!("row-{row_number}")),
            name: name.unwrap_or_else(|| "Unknown".to_string()),
            city: clean(self.city),
            region: clean(self.region),
            address_line: clean(self.address_line),
            latitude: parse_number(self.lat),
            longitude: parse_number(self.long),
            specialties: clean(self.specialties),
            procedures: clean(self.procedures),
            equipment: clean(self.equipment),
            capabilities: clean(self.capabilities),
            description: clean(self.description),
            facility_type: clean(self.facility_type),
            operator_type: clean(self.operator_type),
            num_doctors: clean(self.num_doctors),
            capacity: clean(self.capacity),
            year_established: clean(self.year_established),
        })
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("nan") && v != "None")
}

fn parse_number(value: Option<String>) -> Option<f64> {
    clean(value)
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// A facility export loaded from CSV.
#[derive(Debug, Clone)]
pub struct CsvRecordStore {
    name: String,
    records: Vec<FacilityRecord>,
}

impl CsvRecordStore {
    /// Loads the CSV at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Io`] if the file cannot be opened, or
    /// [`SourceError::Csv`] if the header row cannot be read.
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        Self::open_with_progress(path, &crate::progress::NullProgress)
    }

    /// Loads the CSV at `path`, reporting rows read to `progress`.
    ///
    /// # Errors
    ///
    /// See [`CsvRecordStore::open`].
    pub fn open_with_progress(
        path: &Path,
        progress: &dyn ProgressCallback,
    ) -> Result<Self, SourceError> {
        let file = std::fs::File::open(path).map_err(|e| SourceError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_reader(&path.display().to_string(), file, progress)
    }

    /// Loads CSV text from any reader. `name` is used in errors and logs.
    ///
    /// Malformed rows are skipped and logged at trace level.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Csv`] if the header row cannot be read.
    pub fn from_reader(
        name: &str,
        reader: impl Read,
        progress: &dyn ProgressCallback,
    ) -> Result<Self, SourceError> {
        let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

        csv_reader.headers().map_err(|e| SourceError::Csv {
            path: name.to_string(),
            source: e,
        })?;

        progress.set_message(format!("Reading {name}"));

        let mut records = Vec::new();
        let mut skipped = 0u64;
        let mut row_number = 0u64;
        for result in csv_reader.deserialize::<CsvRow>() {
            row_number += 1;
            if row_number % PROGRESS_BATCH == 0 {
                progress.inc(PROGRESS_BATCH);
            }

            let row = match result {
                Ok(r) => r,
                Err(e) => {
                    log::trace!("  skipping malformed row {row_number}: {e}");
                    skipped += 1;
                    continue;
                }
            };

            match row.into_record(row_number) {
                Some(record) => records.push(record),
                None => skipped += 1,
            }
        }
        progress.inc(row_number % PROGRESS_BATCH);

        log::info!(
            "Loaded {} facility records from {name} ({skipped} rows skipped)",
            records.len()
        );
        progress.finish(format!("Loaded {} facility records", records.len()));

        Ok(Self {
            name: name.to_string(),
            records,
        })
    }

    /// Number of loaded records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records were loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordStore for CsvRecordStore {
    fn name(&self) -> &str {
        &self.name
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

#[cfg(test)]
mod tests {
    use crate::progress::NullProgress;

    use super::*;

    const EXPORT: &str = "\
unique_id,name,address_city,address_stateOrRegion,address_line1,lat,long,specialties,procedure,equipment,capability,description,facilityTypeId,operatorTypeId,numberDoctors,capacity,yearEstablished
a1,Korle Bu,Accra,Greater Accra,Guggisberg Ave,5.5347,-0.2282,\"['Cardiology', 'Neurosurgery']\",[],[],,Teaching hospital,hospital,public,300,2000,1923
a2,Tamale Clinic,Tamale,Northern,,,,\"['General Practice']\",,,,,clinic,private,nan,,
,,,,,,,,,,,,,,,,
a3,No Coordinates,,Volta,,abc,,,,,,,clinic,,,,
";

    fn load() -> CsvRecordStore {
        CsvRecordStore::from_reader("test.csv", EXPORT.as_bytes(), &NullProgress).expect("valid csv")
    }

    #[test]
    fn loads_rows_with_export_column_names() {
        let store = load();
        assert_eq!(store.len(), 3, "the blank row is dropped");

        let records = store.fetch_facilities(&FacilityFilter::all()).expect("fetch");
        let korle_bu = &records[0];
        assert_eq!(korle_bu.id, "a1");
        assert_eq!(korle_bu.city.as_deref(), Some("Accra"));
        assert_eq!(korle_bu.latitude, Some(5.5347));
        assert_eq!(korle_bu.longitude, Some(-0.2282));
        assert_eq!(
            korle_bu.specialties.as_deref(),
            Some("['Cardiology', 'Neurosurgery']")
        );
        assert_eq!(korle_bu.num_doctors.as_deref(), Some("300"));
    }

    #[test]
    fn missing_and_invalid_values_become_none() {
        let records = load().fetch_facilities(&FacilityFilter::all()).expect("fetch");
        let tamale = &records[1];
        assert_eq!(tamale.latitude, None);
        assert_eq!(tamale.num_doctors, None, "nan is unknown, not zero");
        assert_eq!(tamale.capacity, None);

        let volta = &records[2];
        assert_eq!(volta.latitude, None, "non-numeric latitude is ignored");
    }

    #[test]
    fn fetch_applies_filters() {
        let filter = FacilityFilter {
            region: Some("northern".to_string()),
            facility_type: None,
        };
        let records = load().fetch_facilities(&filter).expect("fetch");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Tamale Clinic");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = CsvRecordStore::open(Path::new("/nonexistent/facilities.csv"));
        assert!(matches!(result, Err(SourceError::Io { .. })));
    }
}
