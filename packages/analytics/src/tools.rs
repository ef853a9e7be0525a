//! Tool execution functions.
//!
//! Each function implements one query of the engine's interface. They
//! take structured parameter types, run against the in-memory facility
//! snapshot, and return typed results that every host serializes the same
//! way.

use std::collections::BTreeMap;

use care_map_analytics_models::{
    CountFacilitiesParams, CountFacilitiesResult, DesertFieldParams, DesertFieldResult,
    DistanceParams, DistanceResult, FacilitySummary, FindGapsParams, FindGapsResult,
    GeocodeParams, GeocodeResult, IsochronesParams, IsochronesResult, LocationSummary,
    RadiusSearchParams, RadiusSearchResult,
};
use care_map_capability::TermSet;
use care_map_coverage::GapQuery;
use care_map_coverage_models::GapScan;
use care_map_desert::IsochroneQuery;
use care_map_locator::ResolvedPlace;
use care_map_spatial::distance_km;

use crate::{AnalyticsError, Engine, features};

fn location_summary(place: ResolvedPlace) -> LocationSummary {
    LocationSummary {
        query: place.query,
        matched_name: place.matched_name,
        coordinate: place.coordinate,
        kind: place.kind.to_string(),
        fuzzy: place.fuzzy,
    }
}

/// Parses optional capability terms. Text with no usable term counts as
/// no filter.
fn optional_terms(condition: Option<&str>) -> Option<TermSet> {
    condition.and_then(TermSet::from_query)
}

/// Parses required capability terms.
fn required_terms(specialty: &str) -> Result<TermSet, AnalyticsError> {
    TermSet::from_query(specialty).ok_or_else(|| AnalyticsError::InvalidParameter {
        message: format!("'{specialty}' does not name a capability"),
    })
}

fn non_negative_km(name: &str, value: f64) -> Result<f64, AnalyticsError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(AnalyticsError::InvalidParameter {
            message: format!("{name} must be a non-negative number of kilometers, got {value}"),
        })
    }
}

fn summarize(
    engine: &Engine,
    index: usize,
    distance_km: Option<f64>,
    terms: Option<&TermSet>,
) -> FacilitySummary {
    let locator = engine.locator();
    let facility = locator.snapshot().facility(index);
    FacilitySummary {
        id: facility.id.clone(),
        name: facility.name.clone(),
        city: facility.city.clone(),
        region: facility.region.clone(),
        facility_type: facility.structured.facility_type.clone(),
        coordinate: locator.snapshot().placed_at(index),
        geocode_quality: facility.geocode_quality,
        distance_km,
        matched_fields: terms
            .map(|t| locator.matcher().matched_fields(facility, t))
            .unwrap_or_default(),
    }
}

/// Finds facilities within a radius of a place, nearest first.
///
/// # Errors
///
/// * [`AnalyticsError::Locator`] if the location does not resolve
/// * [`AnalyticsError::InvalidParameter`] if the radius is negative
pub fn radius_search(
    engine: &Engine,
    params: &RadiusSearchParams,
) -> Result<RadiusSearchResult, AnalyticsError> {
    let config = engine.config();
    let center = engine.locator().resolve(&params.location)?;
    let radius_km = non_negative_km(
        "radiusKm",
        params.radius_km.unwrap_or(config.default_search_radius_km),
    )?;
    let terms = optional_terms(params.condition.as_deref());
    let limit = config.search_limit(params.limit);

    let search = engine
        .locator()
        .radius_search(center.coordinate, radius_km, terms.as_ref(), limit);

    log::debug!(
        "radius_search: {} within {radius_km} km of {}",
        search.total_found,
        center.matched_name
    );

    Ok(RadiusSearchResult {
        results: search
            .hits
            .iter()
            .map(|hit| summarize(engine, hit.index, Some(hit.distance_km), terms.as_ref()))
            .collect(),
        total_found: search.total_found,
        center: location_summary(center),
        radius_km,
        condition: params.condition.clone(),
    })
}

/// Scans for coverage gaps, over a region or the whole country.
///
/// # Errors
///
/// * [`AnalyticsError::InvalidParameter`] if the specialty names no term or
///   the threshold is negative
/// * [`AnalyticsError::Locator`] if the region is unknown
/// * [`AnalyticsError::Coverage`] if the grid exceeds the configured cap
pub fn find_gaps(engine: &Engine, params: &FindGapsParams) -> Result<FindGapsResult, AnalyticsError> {
    let config = engine.config();
    let terms = required_terms(&params.specialty)?;
    let min_gap_km = non_negative_km(
        "minGapKm",
        params.min_gap_km.unwrap_or(config.default_min_gap_km),
    )?;
    let (region, bounds) = engine.scan_bounds(params.region.as_deref())?;

    let scan = engine.gap_scanner().find_gaps(&GapQuery {
        bounds,
        step_deg: config.scan_step_deg,
        terms: &terms,
        min_gap_km,
        limit: config.gap_limit(params.limit),
    })?;

    let result = FindGapsResult {
        specialty: params.specialty.clone(),
        min_gap_km,
        region,
        bounds,
        no_capable_facilities: false,
        capable_facilities: 0,
        cells_scanned: 0,
        gap_count: 0,
        total_gaps: 0,
        gaps: Vec::new(),
    };

    Ok(match scan {
        GapScan::NoCapableFacilities => {
            log::info!("find_gaps: no facility offers '{}'", params.specialty);
            FindGapsResult {
                no_capable_facilities: true,
                ..result
            }
        }
        GapScan::Scanned(report) => FindGapsResult {
            capable_facilities: report.capable_facilities,
            cells_scanned: report.cells_scanned,
            gap_count: report.regions.len(),
            total_gaps: report.total_regions,
            gaps: report.regions,
            ..result
        },
    })
}

/// Great-circle distance between two places.
///
/// # Errors
///
/// Returns [`AnalyticsError::Locator`] if either place does not resolve.
pub fn distance(engine: &Engine, params: &DistanceParams) -> Result<DistanceResult, AnalyticsError> {
    let from = engine.locator().resolve(&params.from)?;
    let to = engine.locator().resolve(&params.to)?;
    Ok(DistanceResult {
        distance_km: distance_km(from.coordinate, to.coordinate),
        from: location_summary(from),
        to: location_summary(to),
    })
}

/// Counts facilities with a per-region breakdown.
#[must_use]
pub fn count_facilities(engine: &Engine, params: &CountFacilitiesParams) -> CountFacilitiesResult {
    let terms = optional_terms(params.condition.as_deref());
    let count = engine
        .locator()
        .count_by_region(terms.as_ref(), params.region.as_deref());

    CountFacilitiesResult {
        condition: params.condition.clone(),
        region: params.region.clone(),
        total: count.total,
        by_region: count.by_region,
        samples: count
            .samples
            .iter()
            .map(|&i| summarize(engine, i, None, terms.as_ref()))
            .collect(),
    }
}

/// Every facility passing the filters, as map points.
#[must_use]
pub fn geocode_all(engine: &Engine, params: &GeocodeParams) -> GeocodeResult {
    let locator = engine.locator();
    let snapshot = locator.snapshot();
    let indices =
        locator.filtered_indices(params.region.as_deref(), params.facility_type.as_deref());

    let mut by_quality = BTreeMap::new();
    for &i in &indices {
        *by_quality
            .entry(snapshot.facility(i).geocode_quality)
            .or_insert(0) += 1;
    }

    GeocodeResult {
        count: indices.len(),
        by_quality,
        geojson: features::facility_collection(
            indices
                .iter()
                .map(|&i| (snapshot.facility(i), snapshot.placed_at(i))),
        ),
    }
}

/// The distance-to-care heat field.
///
/// # Errors
///
/// * [`AnalyticsError::InvalidParameter`] if the specialty names no term
/// * [`AnalyticsError::Locator`] if the region is unknown
/// * [`AnalyticsError::Desert`] if the grid is invalid or too large
pub fn desert_field(
    engine: &Engine,
    params: &DesertFieldParams,
) -> Result<DesertFieldResult, AnalyticsError> {
    let terms = required_terms(&params.specialty)?;
    let (region, bounds) = engine.scan_bounds(params.region.as_deref())?;
    let step_deg = params.step_deg.unwrap_or(engine.config().heat_step_deg);

    let field = engine.desert_layers().heat_field(bounds, step_deg, &terms)?;

    Ok(DesertFieldResult {
        specialty: params.specialty.clone(),
        region,
        bounds,
        step_deg,
        no_capable_facilities: field.cells.is_empty(),
        max_distance_km: field.max_distance_km,
        cell_count: field.cells.len(),
        geojson: features::heat_collection(&field),
        cells: field.cells,
    })
}

/// Travel-time rings around every capable facility.
///
/// # Errors
///
/// * [`AnalyticsError::InvalidParameter`] if the specialty names no term
/// * [`AnalyticsError::Locator`] if the region is unknown
/// * [`AnalyticsError::Desert`] if the configured bands are unusable
pub fn isochrones(
    engine: &Engine,
    params: &IsochronesParams,
) -> Result<IsochronesResult, AnalyticsError> {
    let terms = required_terms(&params.specialty)?;
    let within = params
        .region
        .as_deref()
        .map(|name| engine.locator().region_bounds(name))
        .transpose()?;
    let isochrone = &engine.config().isochrone;

    let rings = engine.desert_layers().isochrones(&IsochroneQuery {
        terms: &terms,
        bands: &isochrone.bands,
        vertex_step_deg: isochrone.vertex_step_deg,
        within: within.as_ref().map(|(_, bounds)| *bounds),
    })?;

    Ok(IsochronesResult {
        specialty: params.specialty.clone(),
        region: within.map(|(name, _)| name),
        no_capable_facilities: engine.locator().capable_indices(&terms).is_empty(),
        bands: isochrone.bands.clone(),
        ring_count: rings.len(),
        geojson: features::isochrone_collection(&rings),
    })
}
