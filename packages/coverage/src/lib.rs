#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Coverage-gap scanner.
//!
//! Scans a bounding box on a fixed grid, measures each cell's distance to
//! the nearest facility offering a capability, and reduces the cells at
//! or beyond a threshold to a handful of ranked [`GapRegion`]s. Every
//! reported region names its nearest capable facility and the exact
//! distance to it.
//!
//! A term that matches no facility yields
//! [`GapScan::NoCapableFacilities`], never an empty "all covered" report.

pub mod capable;
pub mod cluster;

use std::sync::Arc;

use care_map_capability::TermSet;
use care_map_coverage_models::{GapRegion, GapReport, GapScan, GapSeverity};
use care_map_geography_models::BoundingBox;
use care_map_locator::FacilityLocator;
use care_map_source::progress::{ProgressCallback, null_progress};
use care_map_spatial::{GridError, GridSpec};

pub use capable::CapableSet;

/// Default cap on grid cells per scan.
pub const DEFAULT_MAX_GRID_CELLS: usize = 250_000;

/// Default `cells * facilities` product above which grids run in parallel.
pub const DEFAULT_PARALLEL_MIN_WORK: usize = 20_000;

/// Errors that can occur during a coverage scan.
#[derive(Debug, thiserror::Error)]
pub enum CoverageError {
    /// The grid could not be laid out.
    #[error(transparent)]
    Grid(#[from] GridError),

    /// The gap threshold is negative or not finite.
    #[error("Invalid gap threshold: {value} km")]
    InvalidThreshold {
        /// The rejected threshold.
        value: f64,
    },
}

/// Parameters of one gap scan.
#[derive(Debug, Clone)]
pub struct GapQuery<'a> {
    /// Area to scan.
    pub bounds: BoundingBox,
    /// Grid spacing in degrees.
    pub step_deg: f64,
    /// Capability terms.
    pub terms: &'a TermSet,
    /// Distance at or beyond which a cell is a gap.
    pub min_gap_km: f64,
    /// Maximum number of regions to return.
    pub limit: usize,
}

/// Scans for coverage gaps against one facility snapshot.
pub struct GapScanner<'a> {
    locator: &'a FacilityLocator,
    max_grid_cells: usize,
    parallel_min_work: usize,
    progress: Arc<dyn ProgressCallback>,
}

impl<'a> GapScanner<'a> {
    /// A scanner with default limits and no progress reporting.
    #[must_use]
    pub fn new(locator: &'a FacilityLocator) -> Self {
        Self {
            locator,
            max_grid_cells: DEFAULT_MAX_GRID_CELLS,
            parallel_min_work: DEFAULT_PARALLEL_MIN_WORK,
            progress: null_progress(),
        }
    }

    /// Sets the grid size cap and the parallelism threshold.
    #[must_use]
    pub const fn with_limits(mut self, max_grid_cells: usize, parallel_min_work: usize) -> Self {
        self.max_grid_cells = max_grid_cells;
        self.parallel_min_work = parallel_min_work;
        self
    }

    /// Reports scan progress to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// Runs a gap scan.
    ///
    /// # Errors
    ///
    /// * [`CoverageError::InvalidThreshold`] if `min_gap_km` is negative or
    ///   not finite
    /// * [`CoverageError::Grid`] if the grid step or bounds are invalid or
    ///   the grid exceeds the cell cap
    pub fn find_gaps(&self, query: &GapQuery<'_>) -> Result<GapScan, CoverageError> {
        if !query.min_gap_km.is_finite() || query.min_gap_km < 0.0 {
            return Err(CoverageError::InvalidThreshold {
                value: query.min_gap_km,
            });
        }
        let spec = GridSpec::new(query.bounds, query.step_deg, self.max_grid_cells)?;

        let Some(capable) = CapableSet::build(self.locator, query.terms) else {
            return Ok(GapScan::NoCapableFacilities);
        };

        let cells = spec.cell_count() as u64;
        self.progress.set_total(cells);
        self.progress.set_message(format!(
            "Measuring {cells} cells against {} facilities",
            capable.len()
        ));
        let Some(field) = capable.distance_field_with_progress(
            spec,
            self.parallel_min_work,
            self.progress.as_ref(),
        ) else {
            return Ok(GapScan::NoCapableFacilities);
        };
        self.progress.set_message("Clustering gap cells".to_string());

        let gap_cells = field
            .cells()
            .iter()
            .filter(|c| c.distance_km >= query.min_gap_km)
            .count();

        let clusters = cluster::cluster_gaps(&field, query.min_gap_km);
        let total_regions = clusters.len();

        let gazetteer = self.locator.gazetteer();
        let regions: Vec<GapRegion> = clusters
            .into_iter()
            .take(query.limit)
            .filter_map(|cluster| {
                let cell = field.get(cluster.seed_row, cluster.seed_col);
                let worst_point = spec.point(cluster.seed_row, cluster.seed_col);
                let facility = capable.facility(cell.nearest);
                Some(GapRegion {
                    worst_point,
                    distance_km: cell.distance_km,
                    nearest_facility_id: facility.id.clone(),
                    nearest_facility_name: facility.name.clone(),
                    severity: GapSeverity::classify(cell.distance_km, query.min_gap_km)?,
                    cell_count: cluster.cell_count,
                    extent: cluster.extent,
                    nearest_place: gazetteer.nearest_place_name(worst_point).map(ToString::to_string),
                    population_estimate: None,
                })
            })
            .collect();

        log::info!(
            "Gap scan for {:?}: {} cells, {gap_cells} at >= {} km, {total_regions} regions",
            query.terms.terms(),
            spec.cell_count(),
            query.min_gap_km
        );
        self.progress
            .finish(format!("Found {total_regions} coverage gap regions"));

        Ok(GapScan::Scanned(GapReport {
            capable_facilities: capable.len(),
            cells_scanned: spec.cell_count(),
            gap_cells,
            total_regions,
            regions,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    use care_map_facility_models::FacilityRecord;
    use care_map_geography::{Gazetteer, StaticGazetteer};
    use care_map_geography_models::LatLng;
    use care_map_source::{FacilityFilter, MemoryRecordStore};
    use care_map_spatial::distance_km;

    use super::*;

    const SYNTHETIC: &str = r#"
        name = "Testland"
        default_centroid = { lat = 2.0, lng = 2.0 }
        bounds = { west = 0.0, south = 0.0, east = 4.0, north = 4.0 }
        places = [
          { name = "Westville", lat = 1.0, lng = 0.5 },
          { name = "Eastburg", lat = 3.0, lng = 3.5 },
          { name = "Farpoint", lat = 3.9, lng = 0.1 },
        ]
    "#;

    fn locator(records: Vec<FacilityRecord>) -> FacilityLocator {
        let gazetteer: Arc<dyn Gazetteer> =
            Arc::new(StaticGazetteer::from_toml_str(SYNTHETIC).expect("valid gazetteer"));
        let store = MemoryRecordStore::new(records);
        FacilityLocator::load(&store, &FacilityFilter::all(), gazetteer).expect("memory store")
    }

    fn facility(id: &str, lat: f64, lng: f64, specialties: &str) -> FacilityRecord {
        FacilityRecord {
            id: id.to_string(),
            name: format!("Facility {id}"),
            latitude: Some(lat),
            longitude: Some(lng),
            specialties: Some(specialties.to_string()),
            ..FacilityRecord::default()
        }
    }

    fn two_hospitals() -> FacilityLocator {
        locator(vec![
            facility("w", 1.0, 0.5, "['Surgery']"),
            facility("e", 3.0, 3.5, "['Surgery']"),
            facility("c", 2.0, 2.0, "['Dentistry']"),
        ])
    }

    fn query(terms: &TermSet, min_gap_km: f64) -> GapQuery<'_> {
        GapQuery {
            bounds: BoundingBox::new(0.0, 0.0, 4.0, 4.0),
            step_deg: 0.1,
            terms,
            min_gap_km,
            limit: 50,
        }
    }

    fn report(scan: GapScan) -> GapReport {
        match scan {
            GapScan::Scanned(report) => report,
            GapScan::NoCapableFacilities => panic!("expected a scanned report"),
        }
    }

    #[test]
    fn no_capable_facilities_is_a_distinct_outcome() {
        let locator = two_hospitals();
        let terms = TermSet::from_query("neurosurgery").expect("terms");
        let scan = GapScanner::new(&locator).find_gaps(&query(&terms, 50.0)).expect("scan");
        assert_eq!(scan, GapScan::NoCapableFacilities);
    }

    #[test]
    fn regions_name_their_nearest_facility_and_exact_distance() {
        let locator = two_hospitals();
        let terms = TermSet::from_query("surgery").expect("terms");
        let report = report(GapScanner::new(&locator).find_gaps(&query(&terms, 100.0)).expect("scan"));

        assert_eq!(report.capable_facilities, 2);
        assert_eq!(report.cells_scanned, 41 * 41);
        assert!(!report.regions.is_empty());

        for region in &report.regions {
            let facility_point = if region.nearest_facility_id == "w" {
                LatLng::new(1.0, 0.5)
            } else {
                LatLng::new(3.0, 3.5)
            };
            let expected = distance_km(region.worst_point, facility_point);
            assert!((region.distance_km - expected).abs() < 1e-9);
            assert!(region.distance_km >= 100.0);
            assert_eq!(
                region.severity,
                GapSeverity::classify(region.distance_km, 100.0).expect("gap")
            );
            assert!(region.nearest_place.is_some());
            assert!(region.population_estimate.is_none());
        }
    }

    #[test]
    fn regions_are_sorted_worst_first() {
        let locator = two_hospitals();
        let terms = TermSet::from_query("surgery").expect("terms");
        let report = report(GapScanner::new(&locator).find_gaps(&query(&terms, 50.0)).expect("scan"));
        assert!(report.regions.windows(2).all(|w| {
            w[0].distance_km > w[1].distance_km
                || (w[0].distance_km == w[1].distance_km
                    && w[0].worst_point.total_cmp(&w[1].worst_point).is_le())
        }));
        let total_cells: usize = report.regions.iter().map(|r| r.cell_count).sum();
        assert_eq!(total_cells, report.gap_cells);
    }

    #[test]
    fn raising_the_threshold_never_adds_gaps() {
        let locator = two_hospitals();
        let terms = TermSet::from_query("surgery").expect("terms");
        let scanner = GapScanner::new(&locator);
        let mut previous = usize::MAX;
        for min_gap in [0.0, 10.0, 25.0, 50.0, 100.0, 150.0, 200.0, 400.0] {
            let report = report(scanner.find_gaps(&query(&terms, min_gap)).expect("scan"));
            assert!(
                report.total_regions <= previous,
                "{min_gap} km produced {} regions after {previous}",
                report.total_regions
            );
            previous = report.total_regions;
        }
        assert_eq!(previous, 0, "nothing is 400 km from a facility in a 4 degree box");
    }

    #[test]
    fn scans_are_deterministic_in_parallel_and_sequential() {
        let locator = two_hospitals();
        let terms = TermSet::from_query("surgery").expect("terms");
        let sequential = GapScanner::new(&locator)
            .with_limits(DEFAULT_MAX_GRID_CELLS, usize::MAX)
            .find_gaps(&query(&terms, 60.0))
            .expect("scan");
        let parallel = GapScanner::new(&locator)
            .with_limits(DEFAULT_MAX_GRID_CELLS, 0)
            .find_gaps(&query(&terms, 60.0))
            .expect("scan");
        assert_eq!(sequential, parallel);
        let again = GapScanner::new(&locator).find_gaps(&query(&terms, 60.0)).expect("scan");
        assert_eq!(sequential, again);
    }

    #[derive(Default)]
    struct RecordingProgress {
        total: AtomicU64,
        done: AtomicU64,
        updates: AtomicUsize,
    }

    impl ProgressCallback for RecordingProgress {
        fn set_total(&self, total: u64) {
            self.total.store(total, Ordering::Relaxed);
        }

        fn inc(&self, delta: u64) {
            self.done.fetch_add(delta, Ordering::Relaxed);
            self.updates.fetch_add(1, Ordering::Relaxed);
        }

        fn set_message(&self, _msg: String) {}

        fn finish(&self, _msg: String) {}
    }

    #[test]
    fn scan_progress_advances_row_by_row() {
        let locator = two_hospitals();
        let terms = TermSet::from_query("surgery").expect("terms");
        for parallel_min_work in [0, usize::MAX] {
            let progress = Arc::new(RecordingProgress::default());
            let report = report(
                GapScanner::new(&locator)
                    .with_limits(DEFAULT_MAX_GRID_CELLS, parallel_min_work)
                    .with_progress(Arc::clone(&progress) as Arc<dyn ProgressCallback>)
                    .find_gaps(&query(&terms, 60.0))
                    .expect("scan"),
            );
            let cells = report.cells_scanned as u64;
            assert_eq!(progress.total.load(Ordering::Relaxed), cells);
            assert_eq!(progress.done.load(Ordering::Relaxed), cells);
            assert_eq!(progress.updates.load(Ordering::Relaxed), 41, "one update per row");
        }
    }

    #[test]
    fn limit_truncates_after_sorting() {
        let locator = two_hospitals();
        let terms = TermSet::from_query("surgery").expect("terms");
        let full = report(GapScanner::new(&locator).find_gaps(&query(&terms, 30.0)).expect("scan"));
        let limited = report(
            GapScanner::new(&locator)
                .find_gaps(&GapQuery {
                    limit: 1,
                    ..query(&terms, 30.0)
                })
                .expect("scan"),
        );
        assert_eq!(limited.total_regions, full.total_regions);
        assert_eq!(limited.regions.len(), 1.min(full.total_regions));
        assert_eq!(limited.regions.first(), full.regions.first());
    }

    #[test]
    fn rejects_bad_thresholds_and_oversized_grids() {
        let locator = two_hospitals();
        let terms = TermSet::from_query("surgery").expect("terms");
        let scanner = GapScanner::new(&locator);
        assert!(matches!(
            scanner.find_gaps(&query(&terms, -1.0)),
            Err(CoverageError::InvalidThreshold { .. })
        ));
        assert!(matches!(
            scanner.with_limits(100, 0).find_gaps(&query(&terms, 50.0)),
            Err(CoverageError::Grid(GridError::TooManyCells { .. }))
        ));
    }
}
