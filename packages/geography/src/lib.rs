#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Gazetteer service for place and region name resolution.
//!
//! The [`Gazetteer`] trait is the lookup seam the facility locator is
//! built against: named places (towns and neighbourhoods), landmarks,
//! and administrative regions with centroids and bounding boxes. The
//! default implementation, [`StaticGazetteer`], is loaded from TOML.
//!
//! Lookups work on normalized keys (see [`normalize::normalize`]). Exact
//! lookups come first; fuzzy lookups accept substring matches in either
//! direction and prefer the key whose length is closest to the input.

pub mod gazetteer;
pub mod normalize;

pub use gazetteer::StaticGazetteer;

use care_map_geography_models::{BoundingBox, LatLng};
use serde::Serialize;
use strum_macros::{AsRefStr, Display};
use thiserror::Error;

/// Keys and inputs shorter than this never take part in fuzzy matching,
/// so that two-letter towns do not swallow unrelated names.
pub const MIN_FUZZY_LEN: usize = 3;

/// Errors that can occur while loading a gazetteer.
#[derive(Debug, Error)]
pub enum GazetteerError {
    /// The TOML did not match the gazetteer shape.
    #[error("Gazetteer parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is out of range.
    #[error("Invalid gazetteer: {message}")]
    Invalid {
        /// Description of what went wrong.
        message: String,
    },
}

/// A named point in the gazetteer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedPlace {
    /// Display name as written in the gazetteer.
    pub name: String,
    /// Normalized lookup key.
    pub key: String,
    /// Coordinate of the place.
    pub coordinate: LatLng,
}

/// An administrative region.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    /// Display name as written in the gazetteer.
    pub name: String,
    /// Normalized lookup key.
    pub key: String,
    /// Approximate centroid, used as the region-level geocode fallback.
    pub centroid: LatLng,
    /// Approximate extent, used to constrain coverage scans.
    pub bounds: Option<BoundingBox>,
}

/// Which table a resolved name came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PlaceKind {
    /// A landmark such as a teaching hospital or airport.
    Landmark,
    /// A town, city, or neighbourhood.
    Place,
    /// An administrative region (centroid).
    Region,
}

/// Immutable lookup tables for place names.
///
/// Implementations only supply the tables; exact and fuzzy lookups are
/// provided on top of them so that test doubles with synthetic
/// geographies behave exactly like the production gazetteer.
pub trait Gazetteer: Send + Sync {
    /// Human-readable gazetteer name (usually the country).
    fn name(&self) -> &str;

    /// Landmarks, checked before places.
    fn landmarks(&self) -> &[NamedPlace];

    /// Towns, cities, and neighbourhoods.
    fn places(&self) -> &[NamedPlace];

    /// Administrative regions.
    fn regions(&self) -> &[Region];

    /// Bounding box of the whole covered area.
    fn coverage_bounds(&self) -> BoundingBox;

    /// Coordinate of last resort for records with no resolvable location.
    fn default_centroid(&self) -> LatLng;

    /// Exact landmark lookup by normalized key.
    fn exact_landmark(&self, key: &str) -> Option<&NamedPlace> {
        self.landmarks().iter().find(|p| p.key == key)
    }

    /// Exact place lookup by normalized key.
    fn exact_place(&self, key: &str) -> Option<&NamedPlace> {
        self.places().iter().find(|p| p.key == key)
    }

    /// Exact region lookup by normalized key.
    fn exact_region(&self, key: &str) -> Option<&Region> {
        self.regions().iter().find(|r| r.key == key)
    }

    /// Fuzzy lookup across landmarks and places.
    fn fuzzy_place(&self, key: &str) -> Option<(&NamedPlace, PlaceKind)> {
        let landmarks = self
            .landmarks()
            .iter()
            .map(|p| (p.key.as_str(), (p, PlaceKind::Landmark)));
        let places = self
            .places()
            .iter()
            .map(|p| (p.key.as_str(), (p, PlaceKind::Place)));
        best_fuzzy(key, landmarks.chain(places))
    }

    /// Fuzzy region lookup.
    fn fuzzy_region(&self, key: &str) -> Option<&Region> {
        best_fuzzy(key, self.regions().iter().map(|r| (r.key.as_str(), r)))
    }

    /// Finds a region by display name, exact first and then fuzzy.
    fn find_region(&self, name: &str) -> Option<&Region> {
        let key = normalize::normalize(name);
        if key.is_empty() {
            return None;
        }
        self.exact_region(&key).or_else(|| self.fuzzy_region(&key))
    }

    /// Nearest place (not landmark, not region) to `point`, by a flat
    /// equirectangular approximation. Only used for labelling.
    fn nearest_place_name(&self, point: LatLng) -> Option<&str> {
        let cos_lat = point.lat.to_radians().cos().abs().max(0.01);
        self.places()
            .iter()
            .map(|p| {
                let dlat = p.coordinate.lat - point.lat;
                let dlng = (p.coordinate.lng - point.lng) * cos_lat;
                (dlat.mul_add(dlat, dlng * dlng), p)
            })
            .min_by(|(a, pa), (b, pb)| a.total_cmp(b).then_with(|| pa.key.cmp(&pb.key)))
            .map(|(_, p)| p.name.as_str())
    }

    /// Display names of every place and region, sorted and deduplicated,
    /// for "did you mean" suggestions.
    fn known_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .places()
            .iter()
            .map(|p| p.name.as_str())
            .chain(self.regions().iter().map(|r| r.name.as_str()))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

/// Whether `input` and `key` match as substrings in either direction.
#[must_use]
pub fn fuzzy_matches(input: &str, key: &str) -> bool {
    (key.len() >= MIN_FUZZY_LEN && input.contains(key))
        || (input.len() >= MIN_FUZZY_LEN && key.contains(input))
}

/// Picks the fuzzy candidate whose key length is closest to the input,
/// breaking ties lexicographically by key.
fn best_fuzzy<'a, T>(input: &str, candidates: impl Iterator<Item = (&'a str, T)>) -> Option<T> {
    candidates
        .filter(|(key, _)| fuzzy_matches(input, key))
        .min_by(|(ka, _), (kb, _)| {
            ka.len()
                .abs_diff(input.len())
                .cmp(&kb.len().abs_diff(input.len()))
                .then_with(|| ka.cmp(kb))
        })
        .map(|(_, item)| item)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ghana() -> StaticGazetteer {
        StaticGazetteer::ghana()
    }

    #[test]
    fn exact_lookups_use_normalized_keys() {
        let g = ghana();
        assert!(g.exact_place("accra").is_some());
        assert!(g.exact_landmark("korle bu teaching hospital").is_some());
        assert!(g.exact_region("upper east").is_some());
        assert!(g.exact_place("Accra").is_none(), "keys are lowercase");
    }

    #[test]
    fn fuzzy_prefers_closest_length() {
        let g = ghana();
        let (place, kind) = g.fuzzy_place("north legon area").expect("fuzzy hit");
        assert_eq!(place.key, "north legon");
        assert_eq!(kind, PlaceKind::Place);

        let (place, _) = g.fuzzy_place("takor").expect("fuzzy hit");
        assert_eq!(place.key, "takoradi");
    }

    #[test]
    fn short_keys_never_fuzzy_match() {
        assert!(!fuzzy_matches("shoal", "ho"));
        assert!(!fuzzy_matches("wa", "walewale"));
        assert!(fuzzy_matches("walew", "walewale"));
    }

    #[test]
    fn finds_regions_exact_then_fuzzy() {
        let g = ghana();
        assert_eq!(g.find_region("Northern").map(|r| r.key.as_str()), Some("northern"));
        assert_eq!(
            g.find_region("Upper East Region").map(|r| r.key.as_str()),
            Some("upper east")
        );
        assert!(g.find_region("atlantis").is_none());
        assert!(g.find_region("  ").is_none());
    }

    #[test]
    fn nearest_place_name_labels_points() {
        let g = ghana();
        let accra = g.exact_place("accra").expect("accra").coordinate;
        assert_eq!(g.nearest_place_name(accra), Some("Accra"));
    }

    #[test]
    fn known_names_are_sorted() {
        let g = ghana();
        let names = g.known_names();
        assert!(names.windows(2).all(|w| w[0] <= w[1]));
        assert!(names.contains(&"Tamale"));
    }
}
