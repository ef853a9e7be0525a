//! Location strings to coordinates.
//!
//! A location is either a literal `"lat,lng"` pair or a name resolved
//! through the gazetteer in a fixed order: exact landmark, exact place,
//! exact region centroid, fuzzy landmark or place, fuzzy region. A miss is
//! reported as [`LocatorError::UnresolvedLocation`]; there is no silent
//! fallback to a default coordinate.

use care_map_geography::normalize::normalize;
use care_map_geography::{Gazetteer, PlaceKind};
use care_map_geography_models::LatLng;
use serde::Serialize;
use strum_macros::{AsRefStr, Display};

use crate::LocatorError;

/// Maximum number of "did you mean" suggestions.
const MAX_SUGGESTIONS: usize = 10;

/// Where a resolved coordinate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResolvedKind {
    /// A literal `lat,lng` string.
    Coordinates,
    /// A gazetteer landmark.
    Landmark,
    /// A town, city, or neighbourhood.
    Place,
    /// An administrative region centroid.
    Region,
}

impl From<PlaceKind> for ResolvedKind {
    fn from(kind: PlaceKind) -> Self {
        match kind {
            PlaceKind::Landmark => Self::Landmark,
            PlaceKind::Place => Self::Place,
            PlaceKind::Region => Self::Region,
        }
    }
}

/// A location string resolved to a coordinate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPlace {
    /// The input as given.
    pub query: String,
    /// Display name of the match (the input itself for coordinates).
    pub matched_name: String,
    /// The resolved coordinate.
    pub coordinate: LatLng,
    /// Which table matched.
    pub kind: ResolvedKind,
    /// Whether the match was fuzzy rather than exact.
    pub fuzzy: bool,
}

/// Parses a literal `"lat,lng"` pair.
///
/// Both parts must be finite numbers in range; anything else is `None`.
#[must_use]
pub fn parse_coordinates(text: &str) -> Option<LatLng> {
    let (lat, lng) = text.split_once(',')?;
    let lat = lat.trim().parse::<f64>().ok()?;
    let lng = lng.trim().parse::<f64>().ok()?;
    let coordinate = LatLng::new(lat, lng);
    coordinate.is_valid().then_some(coordinate)
}

/// Resolves a location string: coordinates first, then gazetteer names.
///
/// # Errors
///
/// Returns [`LocatorError::UnresolvedLocation`] if the text is neither a
/// coordinate pair nor a known name.
pub fn parse_location(gazetteer: &dyn Gazetteer, text: &str) -> Result<ResolvedPlace, LocatorError> {
    if let Some(coordinate) = parse_coordinates(text) {
        return Ok(ResolvedPlace {
            query: text.to_string(),
            matched_name: text.trim().to_string(),
            coordinate,
            kind: ResolvedKind::Coordinates,
            fuzzy: false,
        });
    }
    resolve_place(gazetteer, text)
}

/// Resolves a place name through the gazetteer.
///
/// # Errors
///
/// Returns [`LocatorError::UnresolvedLocation`] with suggestions if no
/// table matches.
pub fn resolve_place(gazetteer: &dyn Gazetteer, name: &str) -> Result<ResolvedPlace, LocatorError> {
    try_resolve(gazetteer, name).ok_or_else(|| {
        let suggestions = suggestions(gazetteer, name);
        log::debug!("Unresolved location '{name}', {} suggestions", suggestions.len());
        LocatorError::UnresolvedLocation {
            name: name.to_string(),
            suggestions,
        }
    })
}

/// Resolves a place name, returning `None` on a miss.
#[must_use]
pub fn try_resolve(gazetteer: &dyn Gazetteer, name: &str) -> Option<ResolvedPlace> {
    let key = normalize(name);
    if key.is_empty() {
        return None;
    }

    let found = |matched_name: &str, coordinate, kind: ResolvedKind, fuzzy| ResolvedPlace {
        query: name.to_string(),
        matched_name: matched_name.to_string(),
        coordinate,
        kind,
        fuzzy,
    };

    if let Some(p) = gazetteer.exact_landmark(&key) {
        return Some(found(&p.name, p.coordinate, ResolvedKind::Landmark, false));
    }
    if let Some(p) = gazetteer.exact_place(&key) {
        return Some(found(&p.name, p.coordinate, ResolvedKind::Place, false));
    }
    if let Some(r) = gazetteer.exact_region(&key) {
        return Some(found(&r.name, r.centroid, ResolvedKind::Region, false));
    }
    if let Some((p, kind)) = gazetteer.fuzzy_place(&key) {
        return Some(found(&p.name, p.coordinate, kind.into(), true));
    }
    gazetteer
        .fuzzy_region(&key)
        .map(|r| found(&r.name, r.centroid, ResolvedKind::Region, true))
}

/// Up to ten known names for a "did you mean" prompt: names sharing the
/// input's first character, else the first names alphabetically.
#[must_use]
pub fn suggestions(gazetteer: &dyn Gazetteer, name: &str) -> Vec<String> {
    let known = gazetteer.known_names();
    let first = normalize(name).chars().next();

    let same_initial: Vec<String> = known
        .iter()
        .filter(|n| first.is_some() && normalize(n).chars().next() == first)
        .take(MAX_SUGGESTIONS)
        .map(ToString::to_string)
        .collect();

    if same_initial.is_empty() {
        known
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(ToString::to_string)
            .collect()
    } else {
        same_initial
    }
}

#[cfg(test)]
mod tests {
    use care_map_geography::StaticGazetteer;

    use super::*;

    const SYNTHETIC: &str = r#"
        name = "Testland"
        default_centroid = { lat = 0.5, lng = 0.5 }
        bounds = { west = 0.0, south = 0.0, east = 1.0, north = 1.0 }
        landmarks = [ { name = "Central Hospital", lat = 0.11, lng = 0.12 } ]
        places = [
          { name = "Alpha", lat = 0.1, lng = 0.1 },
          { name = "Betaville", lat = 0.8, lng = 0.8 },
          { name = "North", lat = 0.3, lng = 0.3 },
        ]
        regions = [
          { name = "North", lat = 0.75, lng = 0.5 },
          { name = "Southern Plains", lat = 0.25, lng = 0.5 },
        ]
    "#;

    fn gazetteer() -> StaticGazetteer {
        StaticGazetteer::from_toml_str(SYNTHETIC).expect("valid gazetteer")
    }

    #[test]
    fn parses_coordinate_pairs() {
        assert_eq!(parse_coordinates("5.6, -0.19"), Some(LatLng::new(5.6, -0.19)));
        assert_eq!(parse_coordinates("95,0"), None);
        assert_eq!(parse_coordinates("accra"), None);
        assert_eq!(parse_coordinates("1,2,3"), None);
    }

    #[test]
    fn coordinates_win_over_names() {
        let resolved = parse_location(&gazetteer(), "0.5,0.5").expect("coordinates");
        assert_eq!(resolved.kind, ResolvedKind::Coordinates);
        assert_eq!(resolved.coordinate, LatLng::new(0.5, 0.5));
    }

    #[test]
    fn exact_place_beats_region_of_the_same_name() {
        let resolved = resolve_place(&gazetteer(), "NORTH").expect("resolves");
        assert_eq!(resolved.kind, ResolvedKind::Place);
        assert_eq!(resolved.coordinate, LatLng::new(0.3, 0.3));
    }

    #[test]
    fn landmarks_are_checked_first() {
        let resolved = resolve_place(&gazetteer(), "central hospital").expect("resolves");
        assert_eq!(resolved.kind, ResolvedKind::Landmark);
        assert!(!resolved.fuzzy);
    }

    #[test]
    fn fuzzy_matches_places_then_regions() {
        let g = gazetteer();
        let place = resolve_place(&g, "Betaville Junction").expect("fuzzy place");
        assert_eq!(place.matched_name, "Betaville");
        assert!(place.fuzzy);

        let region = resolve_place(&g, "southern").expect("fuzzy region");
        assert_eq!(region.kind, ResolvedKind::Region);
        assert_eq!(region.coordinate, LatLng::new(0.25, 0.5));
    }

    #[test]
    fn unresolved_names_carry_suggestions() {
        match resolve_place(&gazetteer(), "Atlantis") {
            Err(LocatorError::UnresolvedLocation { name, suggestions }) => {
                assert_eq!(name, "Atlantis");
                assert_eq!(suggestions, vec!["Alpha"]);
            }
            other => panic!("expected unresolved, got {other:?}"),
        }
    }

    #[test]
    fn blank_names_are_unresolved() {
        assert!(resolve_place(&gazetteer(), "  ").is_err());
        match resolve_place(&gazetteer(), "zzz") {
            Err(LocatorError::UnresolvedLocation { suggestions, .. }) => {
                assert_eq!(
                    suggestions,
                    vec!["Alpha", "Betaville", "North", "Southern Plains"],
                    "falls back to the first known names"
                );
            }
            other => panic!("expected unresolved, got {other:?}"),
        }
    }

    #[test]
    fn real_gazetteer_resolves_cities() {
        let ghana = StaticGazetteer::ghana();
        let kumasi = resolve_place(&ghana, "Kumasi").expect("kumasi");
        assert!((kumasi.coordinate.lat - 6.69).abs() < 0.1);
        let korle_bu = resolve_place(&ghana, "Korle Bu Teaching Hospital").expect("landmark");
        assert_eq!(korle_bu.kind, ResolvedKind::Landmark);
    }
}
