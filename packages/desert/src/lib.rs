#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Medical desert layers.
//!
//! Two read-only renders of the capable-facility set used by the gap
//! scanner: a heat field of normalized distance-to-care over a grid, and
//! distorted travel-time rings around each capable facility. Both return
//! empty layers when no facility matches.

pub mod heat;
pub mod isochrone;

use care_map_capability::TermSet;
use care_map_coverage::{CapableSet, DEFAULT_MAX_GRID_CELLS, DEFAULT_PARALLEL_MIN_WORK};
use care_map_coverage_models::{HeatField, IsochroneRing, TravelBand};
use care_map_geography_models::BoundingBox;
use care_map_locator::FacilityLocator;
use care_map_spatial::{GridError, GridSpec};

use crate::isochrone::{RingNoise, distorted_ring, ring_seed, vertex_count};

/// Errors that can occur while building desert layers.
#[derive(Debug, thiserror::Error)]
pub enum DesertError {
    /// The heat grid could not be laid out.
    #[error(transparent)]
    Grid(#[from] GridError),

    /// The isochrone vertex step yields too few vertices.
    #[error("Invalid isochrone vertex step: {step} degrees")]
    InvalidVertexStep {
        /// The rejected step.
        step: f64,
    },

    /// A travel band has a non-positive radius or a distortion outside
    /// `[0, 1)`.
    #[error("Invalid travel band '{label}'")]
    InvalidBand {
        /// Label of the rejected band.
        label: String,
    },
}

/// Parameters of one isochrone request.
#[derive(Debug, Clone)]
pub struct IsochroneQuery<'a> {
    /// Capability terms.
    pub terms: &'a TermSet,
    /// Travel bands, innermost first.
    pub bands: &'a [TravelBand],
    /// Angular spacing between ring vertices in degrees.
    pub vertex_step_deg: f64,
    /// Only facilities placed inside this box get rings.
    pub within: Option<BoundingBox>,
}

/// Builds desert layers against one facility snapshot.
pub struct DesertLayers<'a> {
    locator: &'a FacilityLocator,
    max_grid_cells: usize,
    parallel_min_work: usize,
}

impl<'a> DesertLayers<'a> {
    /// Layers with default grid limits.
    #[must_use]
    pub const fn new(locator: &'a FacilityLocator) -> Self {
        Self {
            locator,
            max_grid_cells: DEFAULT_MAX_GRID_CELLS,
            parallel_min_work: DEFAULT_PARALLEL_MIN_WORK,
        }
    }

    /// Sets the grid size cap and the parallelism threshold.
    #[must_use]
    pub const fn with_limits(mut self, max_grid_cells: usize, parallel_min_work: usize) -> Self {
        self.max_grid_cells = max_grid_cells;
        self.parallel_min_work = parallel_min_work;
        self
    }

    /// Heat field over `bounds` at `step_deg` for facilities matching
    /// `terms`.
    ///
    /// # Errors
    ///
    /// Returns [`DesertError::Grid`] if the grid is invalid or too large.
    pub fn heat_field(
        &self,
        bounds: BoundingBox,
        step_deg: f64,
        terms: &TermSet,
    ) -> Result<HeatField, DesertError> {
        let spec = GridSpec::new(bounds, step_deg, self.max_grid_cells)?;
        let capable = CapableSet::build(self.locator, terms);
        let field = heat::heat_field(capable.as_ref(), spec, self.parallel_min_work);
        log::debug!(
            "Heat field for {:?}: {} cells, max {:.1} km",
            terms.terms(),
            field.cells.len(),
            field.max_distance_km
        );
        Ok(field)
    }

    /// One ring per capable facility per band, facilities in snapshot
    /// order and bands in the given order.
    ///
    /// # Errors
    ///
    /// * [`DesertError::InvalidVertexStep`] if the step is not usable
    /// * [`DesertError::InvalidBand`] if a band cannot produce a ring
    pub fn isochrones(&self, query: &IsochroneQuery<'_>) -> Result<Vec<IsochroneRing>, DesertError> {
        let vertices = vertex_count(query.vertex_step_deg).ok_or(DesertError::InvalidVertexStep {
            step: query.vertex_step_deg,
        })?;
        if let Some(band) = query.bands.iter().find(|b| !band_is_valid(b)) {
            return Err(DesertError::InvalidBand {
                label: band.label.clone(),
            });
        }

        let Some(capable) = CapableSet::build(self.locator, query.terms) else {
            return Ok(Vec::new());
        };

        let mut rings = Vec::with_capacity(capable.len() * query.bands.len());
        for (facility, placed) in capable.facilities() {
            if query.within.is_some_and(|b| !b.contains(placed)) {
                continue;
            }
            // Placed, not nominal: co-located facilities get distinct shapes.
            let seed = ring_seed(placed);
            let noise = RingNoise::new(seed);
            rings.extend(query.bands.iter().map(|band| IsochroneRing {
                facility_id: facility.id.clone(),
                facility_name: facility.name.clone(),
                label: band.label.clone(),
                minutes: band.minutes,
                radius_km: band.radius_km(),
                seed,
                vertices: distorted_ring(placed, band, &noise, vertices),
            }));
        }

        log::debug!(
            "Generated {} isochrone rings for {:?}",
            rings.len(),
            query.terms.terms()
        );
        Ok(rings)
    }
}

fn band_is_valid(band: &TravelBand) -> bool {
    band.radius_km().is_finite()
        && band.radius_km() > 0.0
        && (0.0..1.0).contains(&band.distortion)
}
