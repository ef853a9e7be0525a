//! Radius search, facility counts, and region filtering.

use std::collections::BTreeMap;

use care_map_capability::{CapabilityMatcher, TermSet};
use care_map_geography_models::LatLng;
use care_map_spatial::distance_km;

use crate::snapshot::FacilitySnapshot;

/// Number of sample facilities returned with a count.
pub const COUNT_SAMPLE_SIZE: usize = 5;

/// Region key for facilities with no region text.
pub const UNKNOWN_REGION: &str = "Unknown";

/// One radius search result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    /// Index into the snapshot.
    pub index: usize,
    /// Distance from the search center to the placed coordinate.
    pub distance_km: f64,
}

/// Radius search results, nearest first.
#[derive(Debug, Clone, PartialEq)]
pub struct RadiusSearch {
    /// Up to `limit` hits.
    pub hits: Vec<SearchHit>,
    /// Number of matches before the limit was applied.
    pub total_found: usize,
}

/// Facilities within `radius_km` of `center`, measured to each facility's
/// placed coordinate.
///
/// When `terms` is given only capable facilities are considered. Hits are
/// sorted by distance, then facility id, then snapshot order, and cut to
/// `limit`.
#[must_use]
pub fn radius_search(
    snapshot: &FacilitySnapshot,
    matcher: &CapabilityMatcher,
    center: LatLng,
    radius_km: f64,
    terms: Option<&TermSet>,
    limit: usize,
) -> RadiusSearch {
    let mut hits: Vec<SearchHit> = matcher
        .filter_indices(snapshot.facilities(), terms)
        .into_iter()
        .filter_map(|index| {
            let distance_km = distance_km(center, snapshot.placed_at(index));
            (distance_km <= radius_km).then_some(SearchHit { index, distance_km })
        })
        .collect();

    hits.sort_by(|a, b| {
        a.distance_km
            .total_cmp(&b.distance_km)
            .then_with(|| snapshot.facility(a.index).id.cmp(&snapshot.facility(b.index).id))
            .then_with(|| a.index.cmp(&b.index))
    });

    let total_found = hits.len();
    hits.truncate(limit);

    log::debug!(
        "Radius search at {center} within {radius_km} km: {total_found} found, {} returned",
        hits.len()
    );

    RadiusSearch { hits, total_found }
}

/// Facility totals with a per-region breakdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacilityCount {
    /// Number of matching facilities.
    pub total: usize,
    /// Matches per region text ([`UNKNOWN_REGION`] when absent).
    pub by_region: BTreeMap<String, usize>,
    /// Up to [`COUNT_SAMPLE_SIZE`] matches, ordered by name then id.
    pub samples: Vec<usize>,
}

/// Counts facilities matching `terms` and an optional region filter.
///
/// The region filter is a case-insensitive substring match on the
/// facility's region text.
#[must_use]
pub fn count_by_region(
    snapshot: &FacilitySnapshot,
    matcher: &CapabilityMatcher,
    terms: Option<&TermSet>,
    region: Option<&str>,
) -> FacilityCount {
    let mut matches: Vec<usize> = matcher
        .filter_indices(snapshot.facilities(), terms)
        .into_iter()
        .filter(|&i| region_matches(snapshot, i, region))
        .collect();

    let mut by_region: BTreeMap<String, usize> = BTreeMap::new();
    for &index in &matches {
        let key = snapshot
            .facility(index)
            .region
            .clone()
            .unwrap_or_else(|| UNKNOWN_REGION.to_string());
        *by_region.entry(key).or_default() += 1;
    }

    let total = matches.len();
    matches.sort_by(|&a, &b| {
        let (fa, fb) = (snapshot.facility(a), snapshot.facility(b));
        fa.name.cmp(&fb.name).then_with(|| fa.id.cmp(&fb.id))
    });
    matches.truncate(COUNT_SAMPLE_SIZE);

    FacilityCount {
        total,
        by_region,
        samples: matches,
    }
}

/// Whether facility `index` passes an optional region substring filter.
#[must_use]
pub fn region_matches(snapshot: &FacilitySnapshot, index: usize, region: Option<&str>) -> bool {
    text_matches(snapshot.facility(index).region.as_deref(), region)
}

/// Whether facility `index` passes an optional facility type filter.
#[must_use]
pub fn facility_type_matches(
    snapshot: &FacilitySnapshot,
    index: usize,
    facility_type: Option<&str>,
) -> bool {
    text_matches(
        snapshot.facility(index).structured.facility_type.as_deref(),
        facility_type,
    )
}

fn text_matches(value: Option<&str>, filter: Option<&str>) -> bool {
    let Some(filter) = filter.map(str::trim).filter(|f| !f.is_empty()) else {
        return true;
    };
    value.is_some_and(|v| v.to_lowercase().contains(&filter.to_lowercase()))
}
