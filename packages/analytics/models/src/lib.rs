#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Query interface types and tool definitions.
//!
//! Defines the input/output types of each query the engine answers, shared
//! by the conversational tool layer, the HTTP map API and the CLI, along
//! with JSON Schema descriptions for the LLM tool-use protocol.

use std::collections::BTreeMap;

use care_map_coverage_models::{GapRegion, GridCell, TravelBand};
use care_map_facility_models::{AttributeField, GeocodeQuality};
use care_map_geography_models::{BoundingBox, LatLng};
use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// A location string and what it resolved to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSummary {
    /// The location as given.
    pub query: String,
    /// Name of the gazetteer entry that matched.
    pub matched_name: String,
    /// Resolved coordinate.
    pub coordinate: LatLng,
    /// Which table matched (`coordinates`, `landmark`, `place`, `region`).
    pub kind: String,
    /// Whether the match was fuzzy.
    pub fuzzy: bool,
}

/// A facility as returned to callers, at its placed coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilitySummary {
    /// Source identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// City text.
    pub city: Option<String>,
    /// Region text.
    pub region: Option<String>,
    /// Facility type, e.g. `hospital`.
    pub facility_type: Option<String>,
    /// Placed coordinate (what a map draws).
    pub coordinate: LatLng,
    /// How the nominal coordinate was obtained.
    pub geocode_quality: GeocodeQuality,
    /// Distance from the query center, for radius searches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    /// Attribute fields that matched the capability terms.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matched_fields: Vec<AttributeField>,
}

/// Parameters for a radius search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadiusSearchParams {
    /// Place name or `"lat,lng"`.
    pub location: String,
    /// Search radius in kilometers.
    pub radius_km: Option<f64>,
    /// Capability terms, comma separated.
    pub condition: Option<String>,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

/// Result of a radius search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadiusSearchResult {
    /// The resolved search center.
    pub center: LocationSummary,
    /// Radius actually used.
    pub radius_km: f64,
    /// Capability terms, if any.
    pub condition: Option<String>,
    /// Facilities nearest first, cut to the limit.
    pub results: Vec<FacilitySummary>,
    /// Matches before the limit was applied.
    pub total_found: usize,
}

/// Parameters for a coverage gap scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindGapsParams {
    /// Capability terms, comma separated.
    pub specialty: String,
    /// Gap threshold in kilometers.
    pub min_gap_km: Option<f64>,
    /// Region to scan instead of the whole country.
    pub region: Option<String>,
    /// Maximum number of regions.
    pub limit: Option<usize>,
}

/// Result of a coverage gap scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindGapsResult {
    /// Capability terms as given.
    pub specialty: String,
    /// Threshold actually used.
    pub min_gap_km: f64,
    /// Region scanned, if constrained.
    pub region: Option<String>,
    /// Area scanned.
    pub bounds: BoundingBox,
    /// `true` when the terms matched no facility at all.
    pub no_capable_facilities: bool,
    /// Facilities offering the capability.
    pub capable_facilities: usize,
    /// Grid cells evaluated.
    pub cells_scanned: usize,
    /// Gap regions returned, after the limit.
    pub gap_count: usize,
    /// Gap regions found before the limit.
    pub total_gaps: usize,
    /// Gap regions, worst first.
    pub gaps: Vec<GapRegion>,
}

/// Parameters for a distance query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistanceParams {
    /// First place name or `"lat,lng"`.
    pub from: String,
    /// Second place name or `"lat,lng"`.
    pub to: String,
}

/// Result of a distance query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistanceResult {
    /// Resolved first location.
    pub from: LocationSummary,
    /// Resolved second location.
    pub to: LocationSummary,
    /// Great-circle distance in kilometers.
    pub distance_km: f64,
}

/// Parameters for counting facilities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountFacilitiesParams {
    /// Capability terms, comma separated.
    pub condition: Option<String>,
    /// Region substring filter.
    pub region: Option<String>,
}

/// Result of counting facilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountFacilitiesResult {
    /// Capability terms, if any.
    pub condition: Option<String>,
    /// Region filter, if any.
    pub region: Option<String>,
    /// Matching facilities.
    pub total: usize,
    /// Matches per region text.
    pub by_region: BTreeMap<String, usize>,
    /// A few matching facilities for context.
    pub samples: Vec<FacilitySummary>,
}

/// Parameters for geocoding every facility.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeParams {
    /// Region substring filter.
    pub region: Option<String>,
    /// Facility type substring filter.
    pub facility_type: Option<String>,
}

/// Result of geocoding every facility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeResult {
    /// Facilities returned.
    pub count: usize,
    /// Facilities per geocode quality.
    pub by_quality: BTreeMap<GeocodeQuality, usize>,
    /// One point feature per facility.
    pub geojson: FeatureCollection,
}

/// Parameters for the desert heat field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesertFieldParams {
    /// Capability terms, comma separated.
    pub specialty: String,
    /// Region to cover instead of the whole country.
    pub region: Option<String>,
    /// Grid spacing in degrees.
    pub step_deg: Option<f64>,
}

/// Result of a desert heat field request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesertFieldResult {
    /// Capability terms as given.
    pub specialty: String,
    /// Region covered, if constrained.
    pub region: Option<String>,
    /// Area covered.
    pub bounds: BoundingBox,
    /// Grid spacing actually used.
    pub step_deg: f64,
    /// `true` when the terms matched no facility at all.
    pub no_capable_facilities: bool,
    /// Largest distance in the field.
    pub max_distance_km: f64,
    /// Number of cells.
    pub cell_count: usize,
    /// Cells in row-major order.
    pub cells: Vec<GridCell>,
    /// The same cells as point features with `heat` and `distanceKm`.
    pub geojson: FeatureCollection,
}

/// Parameters for isochrone rings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IsochronesParams {
    /// Capability terms, comma separated.
    pub specialty: String,
    /// Only facilities inside this region get rings.
    pub region: Option<String>,
}

/// Result of an isochrone request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IsochronesResult {
    /// Capability terms as given.
    pub specialty: String,
    /// Region filter, if any.
    pub region: Option<String>,
    /// `true` when the terms matched no facility at all.
    pub no_capable_facilities: bool,
    /// Bands each facility got a ring for.
    pub bands: Vec<TravelBand>,
    /// Number of rings.
    pub ring_count: usize,
    /// One polygon feature per facility per band.
    pub geojson: FeatureCollection,
}

/// Enumeration of all tool names the engine can execute.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ToolName {
    /// Facilities within a radius of a place.
    FindFacilitiesInRadius,
    /// Areas far from any facility offering a capability.
    FindCoverageGaps,
    /// Distance between two places.
    CalculateDistance,
    /// Facility counts by region.
    CountFacilities,
    /// Every facility at its placed coordinate.
    GeocodeFacilities,
    /// Distance-to-care heat field.
    DesertField,
    /// Travel-time rings around capable facilities.
    Isochrones,
}

/// Returns the JSON Schema definitions for all available tools.
///
/// These are used in the LLM tool-use protocol to describe what
/// tools the agent can invoke.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn tool_definitions() -> Vec<serde_json::Value> {
    vec![
        serde_json::json!({
            "name": ToolName::FindFacilitiesInRadius.as_ref(),
            "description": "Find healthcare facilities within a radius of a place, nearest first. Use this for questions like 'hospitals near Tamale' or 'where can I get dialysis within 50 km of Kumasi'.",
            "parameters": {
                "type": "object",
                "properties": {
                    "location": { "type": "string", "description": "Place name (e.g., 'Accra', 'Korle Bu') or 'lat,lng'" },
                    "radiusKm": { "type": "number", "description": "Search radius in kilometers (default 50)" },
                    "condition": { "type": "string", "description": "Capability terms, comma separated (e.g., 'cardiology', 'dialysis,renal')" },
                    "limit": { "type": "integer", "description": "Maximum results (default 20)" }
                },
                "required": ["location"]
            }
        }),
        serde_json::json!({
            "name": ToolName::FindCoverageGaps.as_ref(),
            "description": "Find areas that are far from any facility offering a capability (medical deserts). Each gap names its nearest capable facility and the distance to it. If noCapableFacilities is true, no facility in the data offers the capability at all, which usually means a data or terminology problem rather than good coverage.",
            "parameters": {
                "type": "object",
                "properties": {
                    "specialty": { "type": "string", "description": "Capability terms, comma separated (e.g., 'neurosurgery', 'cesarean')" },
                    "minGapKm": { "type": "number", "description": "Distance at or beyond which an area counts as a gap (default 50)" },
                    "region": { "type": "string", "description": "Region to scan (e.g., 'Northern'); omit for the whole country" },
                    "limit": { "type": "integer", "description": "Maximum gap regions (default 10)" }
                },
                "required": ["specialty"]
            }
        }),
        serde_json::json!({
            "name": ToolName::CalculateDistance.as_ref(),
            "description": "Great-circle distance in kilometers between two places.",
            "parameters": {
                "type": "object",
                "properties": {
                    "from": { "type": "string", "description": "First place name or 'lat,lng'" },
                    "to": { "type": "string", "description": "Second place name or 'lat,lng'" }
                },
                "required": ["from", "to"]
            }
        }),
        serde_json::json!({
            "name": ToolName::CountFacilities.as_ref(),
            "description": "Count facilities, optionally by capability and region, with a per-region breakdown and a few examples.",
            "parameters": {
                "type": "object",
                "properties": {
                    "condition": { "type": "string", "description": "Capability terms, comma separated" },
                    "region": { "type": "string", "description": "Region name or part of it" }
                },
                "required": []
            }
        }),
        serde_json::json!({
            "name": ToolName::GeocodeFacilities.as_ref(),
            "description": "Return every facility as a map point with its attributes and how its coordinate was obtained.",
            "parameters": {
                "type": "object",
                "properties": {
                    "region": { "type": "string", "description": "Region name or part of it" },
                    "facilityType": { "type": "string", "description": "Facility type (e.g., 'hospital', 'clinic')" }
                },
                "required": []
            }
        }),
        serde_json::json!({
            "name": ToolName::DesertField.as_ref(),
            "description": "Heat map of distance to the nearest facility offering a capability. Heat is 0 at a facility and 1 at the most remote point.",
            "parameters": {
                "type": "object",
                "properties": {
                    "specialty": { "type": "string", "description": "Capability terms, comma separated" },
                    "region": { "type": "string", "description": "Region to cover; omit for the whole country" },
                    "stepDeg": { "type": "number", "description": "Grid spacing in degrees (default 0.1)" }
                },
                "required": ["specialty"]
            }
        }),
        serde_json::json!({
            "name": ToolName::Isochrones.as_ref(),
            "description": "Approximate 30, 60 and 120 minute travel-time rings around each facility offering a capability.",
            "parameters": {
                "type": "object",
                "properties": {
                    "specialty": { "type": "string", "description": "Capability terms, comma separated" },
                    "region": { "type": "string", "description": "Only facilities in this region" }
                },
                "required": ["specialty"]
            }
        }),
    ]
}
