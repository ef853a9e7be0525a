//! Watershed clustering of gap cells.
//!
//! Cells are ranked by a strict total order: larger distance first, then
//! lower row (latitude), then lower column (longitude). A seed is a cell
//! at or beyond the gap threshold that outranks all eight neighbours.
//! Every other gap cell climbs to its highest-ranked neighbour until it
//! reaches a seed and is counted in that seed's region.
//!
//! Seeds are a threshold filter over a fixed set of local maxima, so
//! raising the threshold can only remove regions.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use care_map_geography_models::{BoundingBox, LatLng};
use care_map_spatial::DistanceField;

/// A cluster of gap cells around one seed.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Row of the seed (worst) cell.
    pub seed_row: usize,
    /// Column of the seed cell.
    pub seed_col: usize,
    /// Number of gap cells in the cluster, seed included.
    pub cell_count: usize,
    /// Bounding box of the cluster's cells.
    pub extent: BoundingBox,
}

/// Clusters of cells with distance `>= min_gap_km`, ranked worst first.
#[must_use]
pub fn cluster_gaps(field: &DistanceField, min_gap_km: f64) -> Vec<Cluster> {
    let spec = field.spec();
    let cell_count = spec.cell_count();

    let rank = |a: (usize, usize), b: (usize, usize)| -> Ordering {
        let da = field.get(a.0, a.1).distance_km;
        let db = field.get(b.0, b.1).distance_km;
        db.total_cmp(&da)
            .then_with(|| a.0.cmp(&b.0))
            .then_with(|| a.1.cmp(&b.1))
    };

    let uphill = |cell: (usize, usize)| -> Option<(usize, usize)> {
        spec.neighbours(cell.0, cell.1)
            .min_by(|&a, &b| rank(a, b))
            .filter(|&best| rank(best, cell) == Ordering::Less)
    };

    // Seed offset owning each gap cell.
    let mut owner: Vec<Option<usize>> = vec![None; cell_count];
    let mut path: Vec<usize> = Vec::new();

    for row in 0..spec.rows() {
        for col in 0..spec.cols() {
            if field.get(row, col).distance_km < min_gap_km || owner[spec.offset(row, col)].is_some() {
                continue;
            }

            path.clear();
            let mut current = (row, col);
            let seed = loop {
                let offset = spec.offset(current.0, current.1);
                if let Some(seed) = owner[offset] {
                    break seed;
                }
                path.push(offset);
                match uphill(current) {
                    Some(next) => current = next,
                    None => break offset,
                }
            };
            for &offset in &path {
                owner[offset] = Some(seed);
            }
        }
    }

    let mut clusters: Vec<Cluster> = Vec::new();
    let mut cluster_of_seed: BTreeMap<usize, usize> = BTreeMap::new();

    for (offset, seed) in owner.iter().enumerate() {
        let Some(seed) = *seed else {
            continue;
        };
        let row = offset / spec.cols();
        let col = offset % spec.cols();
        let point = spec.point(row, col);

        let slot = *cluster_of_seed.entry(seed).or_insert_with(|| {
            let (seed_row, seed_col) = (seed / spec.cols(), seed % spec.cols());
            let seed_point = spec.point(seed_row, seed_col);
            clusters.push(Cluster {
                seed_row,
                seed_col,
                cell_count: 0,
                extent: BoundingBox::new(seed_point.lng, seed_point.lat, seed_point.lng, seed_point.lat),
            });
            clusters.len() - 1
        });

        let cluster = &mut clusters[slot];
        cluster.cell_count += 1;
        extend(&mut cluster.extent, point);
    }

    clusters.sort_by(|a, b| rank((a.seed_row, a.seed_col), (b.seed_row, b.seed_col)));
    clusters
}

fn extend(extent: &mut BoundingBox, point: LatLng) {
    extent.west = extent.west.min(point.lng);
    extent.east = extent.east.max(point.lng);
    extent.south = extent.south.min(point.lat);
    extent.north = extent.north.max(point.lat);
}
