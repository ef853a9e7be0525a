//! TOML-backed gazetteer.
//!
//! A gazetteer file lists named places, landmarks, and regions with their
//! coordinates, plus the bounding box the engine covers and a default
//! centroid of last resort. The Ghana gazetteer is embedded at compile
//! time; tests and alternative deployments load their own with
//! [`StaticGazetteer::from_toml_str`].

use std::collections::BTreeSet;

use care_map_geography_models::{BoundingBox, LatLng};
use serde::Deserialize;

use crate::normalize::normalize;
use crate::{Gazetteer, GazetteerError, NamedPlace, Region};

/// Embedded gazetteer for Ghana.
const GHANA_TOML: &str = include_str!("../data/ghana.toml");

#[derive(Debug, Deserialize)]
struct GazetteerFile {
    name: String,
    default_centroid: LatLng,
    bounds: BoundingBox,
    #[serde(default)]
    landmarks: Vec<PlaceEntry>,
    #[serde(default)]
    places: Vec<PlaceEntry>,
    #[serde(default)]
    regions: Vec<RegionEntry>,
}

#[derive(Debug, Deserialize)]
struct PlaceEntry {
    name: String,
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct RegionEntry {
    name: String,
    lat: f64,
    lng: f64,
    bounds: Option<BoundingBox>,
}

/// An immutable, in-memory gazetteer.
#[derive(Debug, Clone)]
pub struct StaticGazetteer {
    name: String,
    default_centroid: LatLng,
    bounds: BoundingBox,
    landmarks: Vec<NamedPlace>,
    places: Vec<NamedPlace>,
    regions: Vec<Region>,
}

impl StaticGazetteer {
    /// Returns the embedded Ghana gazetteer.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed (this is a compile-time
    /// guarantee since the file is embedded and covered by tests).
    #[must_use]
    pub fn ghana() -> Self {
        Self::from_toml_str(GHANA_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse embedded Ghana gazetteer: {e}"))
    }

    /// Parses a gazetteer from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`GazetteerError::Parse`] if the TOML does not match the
    /// gazetteer shape, or [`GazetteerError::Invalid`] if a coordinate or
    /// bounding box is out of range or a name normalizes to nothing.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, GazetteerError> {
        let file: GazetteerFile = toml::de::from_str(toml_str)?;

        if !file.bounds.is_valid() {
            return Err(GazetteerError::Invalid {
                message: format!("gazetteer '{}' has invalid bounds", file.name),
            });
        }
        if !file.default_centroid.is_valid() {
            return Err(GazetteerError::Invalid {
                message: format!("gazetteer '{}' has an invalid default centroid", file.name),
            });
        }

        let landmarks = build_places(file.landmarks)?;
        let places = build_places(file.places)?;

        let mut regions = Vec::with_capacity(file.regions.len());
        let mut seen = BTreeSet::new();
        for entry in file.regions {
            let key = checked_key(&entry.name)?;
            let centroid = checked_coordinate(&entry.name, entry.lat, entry.lng)?;
            if let Some(bounds) = entry.bounds
                && !bounds.is_valid()
            {
                return Err(GazetteerError::Invalid {
                    message: format!("region '{}' has invalid bounds", entry.name),
                });
            }
            if !seen.insert(key.clone()) {
                log::warn!("Duplicate region '{}' in gazetteer, keeping first", entry.name);
                continue;
            }
            regions.push(Region {
                name: entry.name,
                key,
                centroid,
                bounds: entry.bounds,
            });
        }
        regions.sort_by(|a, b| a.key.cmp(&b.key));

        log::debug!(
            "Loaded gazetteer '{}': {} landmarks, {} places, {} regions",
            file.name,
            landmarks.len(),
            places.len(),
            regions.len()
        );

        Ok(Self {
            name: file.name,
            default_centroid: file.default_centroid,
            bounds: file.bounds,
            landmarks,
            places,
            regions,
        })
    }
}

impl Gazetteer for StaticGazetteer {
    fn name(&self) -> &str {
        &self.name
    }

    fn landmarks(&self) -> &[NamedPlace] {
        &self.landmarks
    }

    fn places(&self) -> &[NamedPlace] {
        &self.places
    }

    fn regions(&self) -> &[Region] {
        &self.regions
    }

    fn coverage_bounds(&self) -> BoundingBox {
        self.bounds
    }

    fn default_centroid(&self) -> LatLng {
        self.default_centroid
    }
}

fn build_places(entries: Vec<PlaceEntry>) -> Result<Vec<NamedPlace>, GazetteerError> {
    let mut places = Vec::with_capacity(entries.len());
    let mut seen = BTreeSet::new();
    for entry in entries {
        let key = checked_key(&entry.name)?;
        let coordinate = checked_coordinate(&entry.name, entry.lat, entry.lng)?;
        if !seen.insert(key.clone()) {
            log::warn!("Duplicate place '{}' in gazetteer, keeping first", entry.name);
            continue;
        }
        places.push(NamedPlace {
            name: entry.name,
            key,
            coordinate,
        });
    }
    places.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(places)
}

fn checked_key(name: &str) -> Result<String, GazetteerError> {
    let key = normalize(name);
    if key.is_empty() {
        return Err(GazetteerError::Invalid {
            message: format!("name '{name}' normalizes to an empty key"),
        });
    }
    Ok(key)
}

fn checked_coordinate(name: &str, lat: f64, lng: f64) -> Result<LatLng, GazetteerError> {
    let coordinate = LatLng::new(lat, lng);
    if coordinate.is_valid() {
        Ok(coordinate)
    } else {
        Err(GazetteerError::Invalid {
            message: format!("'{name}' has an invalid coordinate ({lat}, {lng})"),
        })
    }
}
