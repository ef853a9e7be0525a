//! Normalized distance-to-care heat field.

use care_map_coverage::CapableSet;
use care_map_coverage_models::{GridCell, HeatField};
use care_map_spatial::GridSpec;

/// Builds the heat field over `spec`.
///
/// `heat = distance / max_distance`, so the most remote cell has heat 1
/// and a cell on top of a facility has heat 0. When every cell sits on a
/// facility the maximum is 0 and every cell gets heat 0. Without capable
/// facilities the field has no cells.
#[must_use]
pub fn heat_field(capable: Option<&CapableSet<'_>>, spec: GridSpec, parallel_min_work: usize) -> HeatField {
    let empty = HeatField {
        bounds: spec.bounds(),
        step_deg: spec.step_deg(),
        max_distance_km: 0.0,
        cells: Vec::new(),
    };

    let Some(field) = capable.and_then(|c| c.distance_field(spec, parallel_min_work)) else {
        return empty;
    };

    let max = field.max_distance_km();
    let cells = field
        .iter()
        .map(|(_, _, coordinate, cell)| GridCell {
            coordinate,
            distance_km: cell.distance_km,
            heat: normalize(cell.distance_km, max),
        })
        .collect();

    HeatField {
        max_distance_km: max,
        cells,
        ..empty
    }
}

fn normalize(distance_km: f64, max_km: f64) -> f64 {
    if max_km > 0.0 {
        (distance_km / max_km).clamp(0.0, 1.0)
    } else {
        0.0
    }
}
