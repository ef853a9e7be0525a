//! Nearest-facility index.
//!
//! Points are stored in an R-tree as unit vectors on the sphere (earth-
//! centred coordinates). Chord length between unit vectors is monotone in
//! great-circle distance, so an axis-aligned box search around the query
//! vector finds the great-circle nearest point without any special casing
//! for the antimeridian or the poles.

use care_map_geography_models::LatLng;
use rstar::{AABB, RTree, RTreeObject};

use crate::distance::{EARTH_RADIUS_KM, distance_km};

/// Initial search half-width as a chord on the unit sphere (about 25 km).
const INITIAL_HALF_WIDTH: f64 = 25.0 / EARTH_RADIUS_KM;

/// Largest possible chord between two unit vectors.
const MAX_CHORD: f64 = 2.0;

/// A point stored in the R-tree with its position in the input slice.
struct IndexedPoint {
    position: [f64; 3],
    index: usize,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

/// Result of a nearest-point query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest {
    /// Index of the nearest point in the slice the index was built from.
    pub index: usize,
    /// Haversine distance to it in kilometers.
    pub distance_km: f64,
}

/// Immutable nearest-neighbour index over a set of coordinates.
pub struct NearestIndex {
    tree: RTree<IndexedPoint>,
    points: Vec<LatLng>,
}

impl NearestIndex {
    /// Builds the index. Indices in query results refer to `points`.
    #[must_use]
    pub fn new(points: &[LatLng]) -> Self {
        let entries = points
            .iter()
            .enumerate()
            .map(|(index, point)| IndexedPoint {
                position: unit_vector(*point),
                index,
            })
            .collect();
        let tree = RTree::bulk_load(entries);
        log::debug!("Built nearest-point index over {} points", tree.size());
        Self {
            tree,
            points: points.to_vec(),
        }
    }

    /// Number of indexed points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the index holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The indexed coordinates, in input order.
    #[must_use]
    pub fn points(&self) -> &[LatLng] {
        &self.points
    }

    /// Nearest indexed point to `query`.
    ///
    /// Exact ties go to the lower input index, so results never depend on
    /// the tree's internal layout. Returns `None` only for an empty index.
    #[must_use]
    pub fn nearest(&self, query: LatLng) -> Option<Nearest> {
        if self.is_empty() {
            return None;
        }

        let q = unit_vector(query);
        let mut half_width = INITIAL_HALF_WIDTH;

        loop {
            let envelope = AABB::from_corners(
                [q[0] - half_width, q[1] - half_width, q[2] - half_width],
                [q[0] + half_width, q[1] + half_width, q[2] + half_width],
            );

            let best = self
                .tree
                .locate_in_envelope_intersecting(&envelope)
                .map(|entry| (chord_squared(q, entry.position), entry.index))
                .min_by(|(da, ia), (db, ib)| da.total_cmp(db).then_with(|| ia.cmp(ib)));

            // Anything closer than the best candidate lies inside the
            // sphere of radius `half_width`, which the box contains.
            if let Some((chord_sq, index)) = best
                && (chord_sq.sqrt() <= half_width || half_width >= MAX_CHORD)
            {
                return Some(Nearest {
                    index,
                    distance_km: distance_km(query, self.points[index]),
                });
            }

            half_width *= 2.0;
        }
    }
}

fn unit_vector(point: LatLng) -> [f64; 3] {
    let lat = point.lat.to_radians();
    let lng = point.lng.to_radians();
    [lat.cos() * lng.cos(), lat.cos() * lng.sin(), lat.sin()]
}

fn chord_squared(a: [f64; 3], b: [f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dz.mul_add(dz, dx.mul_add(dx, dy * dy))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force(points: &[LatLng], query: LatLng) -> f64 {
        points
            .iter()
            .map(|p| distance_km(query, *p))
            .fold(f64::INFINITY, f64::min)
    }

    fn lattice() -> Vec<LatLng> {
        let mut points = Vec::new();
        for i in 0..15 {
            for j in 0..11 {
                let lat = 4.7 + f64::from(i) * 0.43 + f64::from(j % 3) * 0.05;
                let lng = -3.1 + f64::from(j) * 0.39 - f64::from(i % 4) * 0.07;
                points.push(LatLng::new(lat, lng));
            }
        }
        points
    }

    #[test]
    fn empty_index_has_no_nearest() {
        let index = NearestIndex::new(&[]);
        assert!(index.is_empty());
        assert_eq!(index.nearest(LatLng::new(0.0, 0.0)), None);
    }

    #[test]
    fn matches_brute_force() {
        let points = lattice();
        let index = NearestIndex::new(&points);
        assert_eq!(index.len(), points.len());

        for (lat, lng) in [(5.0, -1.0), (11.2, 1.3), (4.5, -3.3), (8.123, 0.456), (-20.0, 40.0)] {
            let query = LatLng::new(lat, lng);
            let nearest = index.nearest(query).expect("non-empty");
            let expected = brute_force(&points, query);
            assert!(
                (nearest.distance_km - expected).abs() < 1e-6,
                "query {query:?}: {} vs {expected}",
                nearest.distance_km
            );
        }
    }

    #[test]
    fn ties_go_to_the_lower_index() {
        let p = LatLng::new(6.0, -1.0);
        let index = NearestIndex::new(&[LatLng::new(9.0, 0.0), p, p]);
        let nearest = index.nearest(p).expect("non-empty");
        assert_eq!(nearest.index, 1);
        assert!(nearest.distance_km.abs() < f64::EPSILON);
    }

    #[test]
    fn finds_points_across_the_antimeridian() {
        let index = NearestIndex::new(&[LatLng::new(0.0, 179.95), LatLng::new(0.0, 170.0)]);
        let nearest = index.nearest(LatLng::new(0.0, -179.95)).expect("non-empty");
        assert_eq!(nearest.index, 0);
        assert!(nearest.distance_km < 12.0);
    }

    #[test]
    fn far_queries_still_resolve() {
        let index = NearestIndex::new(&[LatLng::new(5.6, -0.19)]);
        let nearest = index.nearest(LatLng::new(-5.6, 179.81)).expect("non-empty");
        assert_eq!(nearest.index, 0);
        assert!(nearest.distance_km > 19_000.0);
    }
}
