#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Coverage types shared by the gap scanner, the desert layers, and the
//! query interface.
//!
//! Everything here is derived, per-request data: grids, gaps, heat cells
//! and isochrone rings are regenerated on every call and never persisted.

use care_map_geography_models::{BoundingBox, LatLng};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A point of a fixed-resolution lattice with its coverage values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    /// Cell coordinate.
    pub coordinate: LatLng,
    /// Distance to the nearest capable facility in kilometers.
    pub distance_km: f64,
    /// `distance_km` normalized by the field maximum, in `[0, 1]`.
    pub heat: f64,
}

/// How underserved a gap is.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GapSeverity {
    /// At least the gap threshold from the nearest capable facility.
    Moderate,
    /// At least twice the gap threshold.
    Critical,
}

impl GapSeverity {
    /// Classifies a distance against the gap threshold.
    ///
    /// Returns `None` when the distance is below the threshold.
    #[must_use]
    pub fn classify(distance_km: f64, min_gap_km: f64) -> Option<Self> {
        if distance_km >= 2.0 * min_gap_km {
            Some(Self::Critical)
        } else if distance_km >= min_gap_km {
            Some(Self::Moderate)
        } else {
            None
        }
    }
}

/// A cluster of grid cells far from any capable facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GapRegion {
    /// The cell with the greatest distance (the "worst point").
    pub worst_point: LatLng,
    /// Distance from the worst point to the nearest capable facility.
    pub distance_km: f64,
    /// Id of that facility.
    pub nearest_facility_id: String,
    /// Name of that facility.
    pub nearest_facility_name: String,
    /// Severity tier of the worst point.
    pub severity: GapSeverity,
    /// Number of gap cells in the cluster.
    pub cell_count: usize,
    /// Bounding box of the cluster's cells.
    pub extent: BoundingBox,
    /// Closest named place to the worst point, if the gazetteer has one.
    pub nearest_place: Option<String>,
    /// Population or impact estimate. Filled in by callers, never by the
    /// scanner.
    pub population_estimate: Option<f64>,
}

/// Outcome of a gap scan.
///
/// No capable facilities is a distinct outcome from "no gaps": it points
/// at a data or terminology problem, not at good coverage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GapScan {
    /// The term matched no facility.
    NoCapableFacilities,
    /// The grid was scanned.
    Scanned(GapReport),
}

/// Results of a completed gap scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GapReport {
    /// Number of capable facilities the grid was measured against.
    pub capable_facilities: usize,
    /// Number of grid cells evaluated.
    pub cells_scanned: usize,
    /// Number of cells at or beyond the gap threshold.
    pub gap_cells: usize,
    /// Gap regions before the caller's limit was applied.
    pub total_regions: usize,
    /// Gap regions, worst first, cut to the caller's limit.
    pub regions: Vec<GapRegion>,
}

/// A normalized distance field over a grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatField {
    /// Area the grid covers.
    pub bounds: BoundingBox,
    /// Grid spacing in degrees.
    pub step_deg: f64,
    /// Largest observed distance (the value mapped to `heat == 1`).
    pub max_distance_km: f64,
    /// Cells in row-major order; empty when no facility is capable.
    pub cells: Vec<GridCell>,
}

/// A travel-time band for isochrone generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelBand {
    /// Display label, e.g. `"30 min"`.
    pub label: String,
    /// Travel time in minutes.
    pub minutes: f64,
    /// Assumed average speed in km/h.
    pub speed_kmh: f64,
    /// Maximum radius perturbation as a fraction of the radius.
    pub distortion: f64,
}

impl TravelBand {
    /// Creates a band.
    #[must_use]
    pub fn new(label: &str, minutes: f64, speed_kmh: f64, distortion: f64) -> Self {
        Self {
            label: label.to_string(),
            minutes,
            speed_kmh,
            distortion,
        }
    }

    /// Nominal radius: the distance covered in `minutes` at `speed_kmh`.
    #[must_use]
    pub fn radius_km(&self) -> f64 {
        self.speed_kmh * self.minutes / 60.0
    }

    /// The default 30/60/120 minute bands. Longer bands assume slower
    /// roads and get more distortion.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("30 min", 30.0, 60.0, 0.20),
            Self::new("60 min", 60.0, 50.0, 0.25),
            Self::new("120 min", 120.0, 40.0, 0.30),
        ]
    }
}

/// One distorted travel-time ring around one facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IsochroneRing {
    /// Id of the facility the ring surrounds.
    pub facility_id: String,
    /// Name of that facility.
    pub facility_name: String,
    /// Band label.
    pub label: String,
    /// Band travel time in minutes.
    pub minutes: f64,
    /// Nominal (undistorted) radius in kilometers.
    pub radius_km: f64,
    /// Noise seed derived from the facility's placed coordinate.
    pub seed: u32,
    /// Boundary vertices in angular order, not closed.
    pub vertices: Vec<LatLng>,
}
