//! Great-circle distance and small-offset projection.

use std::cmp::Ordering;

use care_map_geography_models::LatLng;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometers per degree of latitude, used to convert km radii to degrees.
pub const KM_PER_DEGREE: f64 = 111.32;

/// Floor for `cos(latitude)` when stretching longitude offsets.
pub const MIN_COS_LAT: f64 = 0.01;

/// Haversine distance between two coordinates in kilometers.
///
/// Exactly symmetric: the arguments are put in a canonical order before
/// evaluation. The intermediate term is clamped to `[0, 1]` so coincident
/// and antipodal inputs never produce `NaN`.
#[must_use]
pub fn distance_km(a: LatLng, b: LatLng) -> f64 {
    let (a, b) = if a.total_cmp(&b) == Ordering::Greater {
        (b, a)
    } else {
        (a, b)
    };

    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = lat2 - lat1;
    let dlng = (b.lng - a.lng).to_radians();

    let h = (lat1.cos() * lat2.cos())
        .mul_add((dlng / 2.0).sin().powi(2), (dlat / 2.0).sin().powi(2))
        .clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Offsets `center` by a polar vector measured in degrees of latitude.
///
/// `theta` is measured from north towards east. The longitude component is
/// divided by `cos(center.lat)` (floored at [`MIN_COS_LAT`]) so that the
/// offset is roughly isotropic on the ground. Latitude is clamped to the
/// poles and longitude wrapped into `[-180, 180]`.
#[must_use]
pub fn offset_by_degrees(center: LatLng, radius_deg: f64, theta: f64) -> LatLng {
    let cos_lat = center.lat.to_radians().cos().max(MIN_COS_LAT);
    let lat = radius_deg.mul_add(theta.cos(), center.lat).clamp(-90.0, 90.0);
    let lng = wrap_lng(center.lng + radius_deg * theta.sin() / cos_lat);
    LatLng::new(lat, lng)
}

/// Offsets `center` by a polar vector measured in kilometers.
#[must_use]
pub fn offset_by_km(center: LatLng, radius_km: f64, theta: f64) -> LatLng {
    offset_by_degrees(center, radius_km / KM_PER_DEGREE, theta)
}

fn wrap_lng(lng: f64) -> f64 {
    if (-180.0..=180.0).contains(&lng) {
        lng
    } else {
        (lng + 180.0).rem_euclid(360.0) - 180.0
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, PI};

    use super::*;

    #[test]
    fn coincident_points_are_zero() {
        let accra = LatLng::new(5.60, -0.19);
        assert!(distance_km(accra, accra).abs() < f64::EPSILON);
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [
            (LatLng::new(5.60, -0.19), LatLng::new(6.69, -1.62)),
            (LatLng::new(-33.9, 18.4), LatLng::new(51.5, -0.12)),
            (LatLng::new(0.0, 179.9), LatLng::new(0.0, -179.9)),
        ];
        for (a, b) in pairs {
            assert_eq!(distance_km(a, b).to_bits(), distance_km(b, a).to_bits());
        }
    }

    #[test]
    fn accra_to_kumasi_matches_real_world_separation() {
        // Straight-line Accra to Kumasi is just under 200 km.
        let d = distance_km(LatLng::new(5.60, -0.19), LatLng::new(6.69, -1.62));
        assert!((d - 199.2).abs() < 0.5, "got {d} km");
    }

    #[test]
    fn antipodal_points_are_half_circumference() {
        let d = distance_km(LatLng::new(0.0, 0.0), LatLng::new(0.0, 180.0));
        assert!(!d.is_nan());
        assert!((d - PI * EARTH_RADIUS_KM).abs() < 1e-6, "got {d}");

        let poles = distance_km(LatLng::new(90.0, 0.0), LatLng::new(-90.0, 0.0));
        assert!((poles - PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn offset_north_moves_latitude_only() {
        let center = LatLng::new(10.0, 10.0);
        let moved = offset_by_degrees(center, 0.5, 0.0);
        assert!((moved.lat - 10.5).abs() < 1e-12);
        assert!((moved.lng - 10.0).abs() < 1e-12);
    }

    #[test]
    fn offset_east_is_stretched_by_latitude() {
        let center = LatLng::new(60.0, 0.0);
        let moved = offset_by_degrees(center, 1.0, FRAC_PI_2);
        assert!((moved.lng - 2.0).abs() < 1e-9, "cos(60) halves the divisor");
    }

    #[test]
    fn offset_near_pole_stays_finite_and_in_range() {
        let moved = offset_by_degrees(LatLng::new(90.0, 179.9), 0.5, 1.0);
        assert!(moved.is_valid(), "got {moved:?}");
    }

    #[test]
    fn offset_by_km_is_close_to_haversine() {
        let center = LatLng::new(7.0, -1.0);
        let moved = offset_by_km(center, 30.0, 1.2);
        let d = distance_km(center, moved);
        assert!((d - 30.0).abs() < 0.5, "got {d}");
    }
}
