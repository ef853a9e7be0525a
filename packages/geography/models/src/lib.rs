#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Coordinate and bounding box types.
//!
//! These are the geometric primitives every other crate speaks: a WGS84
//! [`LatLng`] and an axis-aligned [`BoundingBox`] in degrees. They carry
//! no projection logic of their own; distance and offset math lives in
//! `care_map_spatial`.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatLng {
    /// Latitude in degrees, positive north.
    pub lat: f64,
    /// Longitude in degrees, positive east.
    pub lng: f64,
}

impl LatLng {
    /// Creates a coordinate from latitude and longitude.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether both components are finite and inside
    /// `[-90, 90] x [-180, 180]`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Total order by latitude, then longitude.
    ///
    /// Used as the deterministic tie-break wherever two results share a
    /// primary sort key.
    #[must_use]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.lat
            .total_cmp(&other.lat)
            .then_with(|| self.lng.total_cmp(&other.lng))
    }

    /// Bit-exact key for grouping facilities that share a nominal
    /// coordinate. `-0.0` is folded into `0.0`.
    #[must_use]
    pub fn bits_key(&self) -> (u64, u64) {
        ((self.lat + 0.0).to_bits(), (self.lng + 0.0).to_bits())
    }

    /// `[lng, lat]` position as used by `GeoJSON`.
    #[must_use]
    pub fn to_position(&self) -> Vec<f64> {
        vec![self.lng, self.lat]
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4},{:.4}", self.lat, self.lng)
    }
}

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western longitude boundary.
    pub west: f64,
    /// Southern latitude boundary.
    pub south: f64,
    /// Eastern longitude boundary.
    pub east: f64,
    /// Northern latitude boundary.
    pub north: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given coordinates.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Whether all edges are finite, in range, and non-inverted.
    ///
    /// Boxes crossing the antimeridian are not supported.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        LatLng::new(self.south, self.west).is_valid()
            && LatLng::new(self.north, self.east).is_valid()
            && self.south <= self.north
            && self.west <= self.east
    }

    /// Inclusive containment test.
    #[must_use]
    pub fn contains(&self, point: LatLng) -> bool {
        (self.south..=self.north).contains(&point.lat)
            && (self.west..=self.east).contains(&point.lng)
    }

    /// Latitude extent in degrees.
    #[must_use]
    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    /// Longitude extent in degrees.
    #[must_use]
    pub fn lng_span(&self) -> f64 {
        self.east - self.west
    }

    /// Center of the box.
    #[must_use]
    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_coordinate_ranges() {
        assert!(LatLng::new(5.6, -0.19).is_valid());
        assert!(LatLng::new(90.0, 180.0).is_valid());
        assert!(!LatLng::new(90.1, 0.0).is_valid());
        assert!(!LatLng::new(0.0, -180.5).is_valid());
        assert!(!LatLng::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn total_cmp_orders_by_lat_then_lng() {
        let a = LatLng::new(1.0, 5.0);
        let b = LatLng::new(1.0, 6.0);
        let c = LatLng::new(2.0, 0.0);
        assert_eq!(a.total_cmp(&b), Ordering::Less);
        assert_eq!(b.total_cmp(&c), Ordering::Less);
        assert_eq!(a.total_cmp(&a), Ordering::Equal);
    }

    #[test]
    fn bits_key_folds_negative_zero() {
        assert_eq!(
            LatLng::new(-0.0, 1.0).bits_key(),
            LatLng::new(0.0, 1.0).bits_key()
        );
    }

    #[test]
    fn bbox_contains_is_inclusive() {
        let bbox = BoundingBox::new(-3.3, 4.5, 1.3, 11.2);
        assert!(bbox.contains(LatLng::new(4.5, -3.3)));
        assert!(bbox.contains(LatLng::new(11.2, 1.3)));
        assert!(!bbox.contains(LatLng::new(11.3, 0.0)));
    }

    #[test]
    fn rejects_inverted_bbox() {
        assert!(!BoundingBox::new(1.0, 0.0, -1.0, 1.0).is_valid());
        assert!(BoundingBox::new(-1.0, 0.0, 1.0, 1.0).is_valid());
    }
}
