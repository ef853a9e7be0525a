#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Facility locator.
//!
//! Owns the in-memory facility snapshot and answers location questions
//! against it: resolving place names to coordinates, radius search over
//! placed coordinates, and counts by region. The gazetteer is injected
//! as a trait object so tests can supply synthetic geographies.

pub mod ingest;
pub mod resolve;
pub mod search;
pub mod snapshot;

use std::sync::Arc;

use care_map_capability::{CapabilityMatcher, TermSet};
use care_map_facility_models::Facility;
use care_map_geography::Gazetteer;
use care_map_geography_models::{BoundingBox, LatLng};
use care_map_source::{FacilityFilter, RecordStore, SourceError};

pub use resolve::{ResolvedKind, ResolvedPlace};
pub use search::{FacilityCount, RadiusSearch, SearchHit};
pub use snapshot::FacilitySnapshot;

/// Half-width in degrees of the box used for regions without bounds.
const REGION_FALLBACK_HALF_SPAN_DEG: f64 = 1.0;

/// Errors that can occur in the facility locator.
#[derive(Debug, thiserror::Error)]
pub enum LocatorError {
    /// A location string is neither coordinates nor a known name.
    #[error("Could not resolve location '{name}'")]
    UnresolvedLocation {
        /// The location as given.
        name: String,
        /// Known names the caller might have meant.
        suggestions: Vec<String>,
    },

    /// The record store failed.
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Facility snapshot plus the gazetteer and matcher used to query it.
pub struct FacilityLocator {
    gazetteer: Arc<dyn Gazetteer>,
    snapshot: FacilitySnapshot,
    matcher: CapabilityMatcher,
}

impl FacilityLocator {
    /// Builds a locator over already-ingested facilities.
    #[must_use]
    pub fn new(gazetteer: Arc<dyn Gazetteer>, facilities: Vec<Facility>) -> Self {
        Self {
            gazetteer,
            snapshot: FacilitySnapshot::new(facilities),
            matcher: CapabilityMatcher::default(),
        }
    }

    /// Loads records from `store`, ingests them, and builds a locator.
    ///
    /// # Errors
    ///
    /// Returns [`LocatorError::Source`] if the store cannot be read.
    pub fn load(
        store: &dyn RecordStore,
        filter: &FacilityFilter,
        gazetteer: Arc<dyn Gazetteer>,
    ) -> Result<Self, LocatorError> {
        let records = store.fetch_facilities(filter)?;
        let facilities = ingest::ingest_records(records, gazetteer.as_ref());
        log::info!(
            "Loaded {} facilities from {} against the {} gazetteer",
            facilities.len(),
            store.name(),
            gazetteer.name()
        );
        Ok(Self::new(gazetteer, facilities))
    }

    /// Replaces the capability matcher.
    #[must_use]
    pub fn with_matcher(mut self, matcher: CapabilityMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// The injected gazetteer.
    #[must_use]
    pub fn gazetteer(&self) -> &dyn Gazetteer {
        self.gazetteer.as_ref()
    }

    /// The facility snapshot.
    #[must_use]
    pub const fn snapshot(&self) -> &FacilitySnapshot {
        &self.snapshot
    }

    /// The capability matcher.
    #[must_use]
    pub const fn matcher(&self) -> &CapabilityMatcher {
        &self.matcher
    }

    /// Resolves a location string (`"lat,lng"` or a place name).
    ///
    /// # Errors
    ///
    /// Returns [`LocatorError::UnresolvedLocation`] on a miss.
    pub fn resolve(&self, location: &str) -> Result<ResolvedPlace, LocatorError> {
        resolve::parse_location(self.gazetteer(), location)
    }

    /// Display name and bounding box of a region, matched exactly and then
    /// fuzzily. Regions without a box get one reaching a degree out from
    /// their centroid.
    ///
    /// # Errors
    ///
    /// Returns [`LocatorError::UnresolvedLocation`] if no region matches.
    pub fn region_bounds(&self, name: &str) -> Result<(String, BoundingBox), LocatorError> {
        let Some(region) = self.gazetteer.find_region(name) else {
            return Err(LocatorError::UnresolvedLocation {
                name: name.to_string(),
                suggestions: resolve::suggestions(self.gazetteer(), name),
            });
        };
        let bounds = region.bounds.unwrap_or_else(|| {
            let c = region.centroid;
            BoundingBox::new(
                c.lng - REGION_FALLBACK_HALF_SPAN_DEG,
                c.lat - REGION_FALLBACK_HALF_SPAN_DEG,
                c.lng + REGION_FALLBACK_HALF_SPAN_DEG,
                c.lat + REGION_FALLBACK_HALF_SPAN_DEG,
            )
        });
        Ok((region.name.clone(), bounds))
    }

    /// Facilities within `radius_km` of `center`; see
    /// [`search::radius_search`].
    #[must_use]
    pub fn radius_search(
        &self,
        center: LatLng,
        radius_km: f64,
        terms: Option<&TermSet>,
        limit: usize,
    ) -> RadiusSearch {
        search::radius_search(&self.snapshot, &self.matcher, center, radius_km, terms, limit)
    }

    /// Counts by region; see [`search::count_by_region`].
    #[must_use]
    pub fn count_by_region(&self, terms: Option<&TermSet>, region: Option<&str>) -> FacilityCount {
        search::count_by_region(&self.snapshot, &self.matcher, terms, region)
    }

    /// Snapshot indices of facilities that match `terms`.
    #[must_use]
    pub fn capable_indices(&self, terms: &TermSet) -> Vec<usize> {
        self.matcher
            .filter_indices(self.snapshot.facilities(), Some(terms))
    }

    /// Snapshot indices passing optional region and facility type filters.
    #[must_use]
    pub fn filtered_indices(&self, region: Option<&str>, facility_type: Option<&str>) -> Vec<usize> {
        (0..self.snapshot.len())
            .filter(|&i| {
                search::region_matches(&self.snapshot, i, region)
                    && search::facility_type_matches(&self.snapshot, i, facility_type)
            })
            .collect()
    }
}
