//! The capable-facility set shared by the scanner and the desert layers.

use care_map_capability::TermSet;
use care_map_facility_models::Facility;
use care_map_geography_models::LatLng;
use care_map_locator::FacilityLocator;
use care_map_source::progress::ProgressCallback;
use care_map_spatial::{DistanceField, GridSpec, NearestIndex};

/// Facilities matching a term set, indexed by placed coordinate.
///
/// Distances are measured to placed coordinates so that the gaps and heat
/// cells line up with the markers a client draws.
pub struct CapableSet<'a> {
    locator: &'a FacilityLocator,
    indices: Vec<usize>,
    index: NearestIndex,
}

impl<'a> CapableSet<'a> {
    /// Builds the set, or `None` if no facility matches `terms`.
    #[must_use]
    pub fn build(locator: &'a FacilityLocator, terms: &TermSet) -> Option<Self> {
        let indices = locator.capable_indices(terms);
        if indices.is_empty() {
            log::info!("No facilities match {:?}", terms.terms());
            return None;
        }

        let placed: Vec<LatLng> = indices
            .iter()
            .map(|&i| locator.snapshot().placed_at(i))
            .collect();
        log::debug!("{} capable facilities for {:?}", indices.len(), terms.terms());

        Some(Self {
            locator,
            indices,
            index: NearestIndex::new(&placed),
        })
    }

    /// Number of capable facilities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Always `false`: an empty set is never built.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Snapshot indices of the capable facilities, in snapshot order.
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Capable facilities with their placed coordinates.
    pub fn facilities(&self) -> impl Iterator<Item = (&'a Facility, LatLng)> + '_ {
        let snapshot = self.locator.snapshot();
        self.indices
            .iter()
            .map(move |&i| (snapshot.facility(i), snapshot.placed_at(i)))
    }

    /// The facility behind a [`NearestIndex`] result.
    #[must_use]
    pub fn facility(&self, nearest: usize) -> &'a Facility {
        self.locator.snapshot().facility(self.indices[nearest])
    }

    /// Evaluates the nearest-capable-facility distance over `spec`.
    #[must_use]
    pub fn distance_field(&self, spec: GridSpec, parallel_min_work: usize) -> Option<DistanceField> {
        DistanceField::compute(spec, &self.index, parallel_min_work)
    }

    /// As [`Self::distance_field`], advancing `progress` by each row's
    /// cells as the row finishes.
    #[must_use]
    pub fn distance_field_with_progress(
        &self,
        spec: GridSpec,
        parallel_min_work: usize,
        progress: &dyn ProgressCallback,
    ) -> Option<DistanceField> {
        let on_row = |cells: usize| progress.inc(cells as u64);
        DistanceField::compute_with_progress(spec, &self.index, parallel_min_work, &on_row)
    }
}
