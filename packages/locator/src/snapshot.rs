//! Immutable facility snapshot with placed coordinates.

use std::cmp::Ordering;

use care_map_facility_models::Facility;
use care_map_geography_models::LatLng;
use care_map_spatial::PlacementGroup;

/// Facilities plus their placed (spread) coordinates.
///
/// Placement is computed once over the whole snapshot, so a facility is
/// drawn at the same position whichever subset a query selects. Members
/// of a placement group are ordered by name, then id, then input order.
#[derive(Debug, Clone, Default)]
pub struct FacilitySnapshot {
    facilities: Vec<Facility>,
    placed: Vec<LatLng>,
}

impl FacilitySnapshot {
    /// Builds a snapshot and places every facility.
    #[must_use]
    pub fn new(facilities: Vec<Facility>) -> Self {
        let nominals: Vec<LatLng> = facilities.iter().map(|f| f.coordinate).collect();
        let placed = PlacementGroup::place_all(&nominals, |a, b| member_order(&facilities, a, b));
        Self { facilities, placed }
    }

    /// All facilities, in source order.
    #[must_use]
    pub fn facilities(&self) -> &[Facility] {
        &self.facilities
    }

    /// Placed coordinates, parallel to [`FacilitySnapshot::facilities`].
    #[must_use]
    pub fn placed(&self) -> &[LatLng] {
        &self.placed
    }

    /// Facility `index`.
    #[must_use]
    pub fn facility(&self, index: usize) -> &Facility {
        &self.facilities[index]
    }

    /// Placed coordinate of facility `index`.
    #[must_use]
    pub fn placed_at(&self, index: usize) -> LatLng {
        self.placed[index]
    }

    /// Number of facilities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.facilities.len()
    }

    /// Whether the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facilities.is_empty()
    }

    /// Placement groups of the snapshot (facilities sharing a nominal
    /// coordinate), for diagnostics.
    #[must_use]
    pub fn placement_groups(&self) -> Vec<PlacementGroup> {
        let nominals: Vec<LatLng> = self.facilities.iter().map(|f| f.coordinate).collect();
        PlacementGroup::group(&nominals, |a, b| member_order(&self.facilities, a, b))
    }
}

fn member_order(facilities: &[Facility], a: usize, b: usize) -> Ordering {
    facilities[a]
        .name
        .cmp(&facilities[b].name)
        .then_with(|| facilities[a].id.cmp(&facilities[b].id))
}
