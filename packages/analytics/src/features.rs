//! `GeoJSON` feature collections for map rendering.
//!
//! Markers are points at placed coordinates, the heat field is a point
//! grid carrying `heat` and `distanceKm`, and isochrones are polygons
//! tagged with the facility and ring they belong to.

use care_map_coverage_models::{HeatField, IsochroneRing};
use care_map_facility_models::Facility;
use care_map_geography_models::LatLng;
use geo::{LineString, Polygon};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, feature::Id};

fn properties(value: serde_json::Value) -> Option<JsonObject> {
    match value {
        serde_json::Value::Object(map) => Some(map),
        _ => None,
    }
}

fn point(coordinate: LatLng) -> Option<Geometry> {
    Some(Geometry::new(geojson::Value::Point(coordinate.to_position())))
}

const fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// A marker for `facility` at its placed coordinate, with every attribute.
#[must_use]
pub fn facility_feature(facility: &Facility, placed: LatLng) -> Feature {
    let attributes = &facility.attributes;
    let structured = &facility.structured;
    Feature {
        bbox: None,
        geometry: point(placed),
        id: Some(Id::String(facility.id.clone())),
        properties: properties(serde_json::json!({
            "id": facility.id,
            "name": facility.name,
            "city": facility.city,
            "region": facility.region,
            "address": facility.address,
            "geocodeQuality": facility.geocode_quality,
            "nominalLat": facility.coordinate.lat,
            "nominalLng": facility.coordinate.lng,
            "facilityType": structured.facility_type,
            "operatorType": structured.operator_type,
            "numDoctors": structured.num_doctors,
            "capacity": structured.capacity,
            "yearEstablished": structured.year_established,
            "specialties": attributes.specialties,
            "procedures": attributes.procedures,
            "equipment": attributes.equipment,
            "capabilities": attributes.capabilities,
            "description": attributes.description,
        })),
        foreign_members: None,
    }
}

/// Markers for a set of facilities.
#[must_use]
pub fn facility_collection<'a>(
    facilities: impl Iterator<Item = (&'a Facility, LatLng)>,
) -> FeatureCollection {
    collection(
        facilities
            .map(|(facility, placed)| facility_feature(facility, placed))
            .collect(),
    )
}

/// The heat field as a point grid.
#[must_use]
pub fn heat_collection(field: &HeatField) -> FeatureCollection {
    collection(
        field
            .cells
            .iter()
            .map(|cell| Feature {
                bbox: None,
                geometry: point(cell.coordinate),
                id: None,
                properties: properties(serde_json::json!({
                    "heat": cell.heat,
                    "distanceKm": cell.distance_km,
                })),
                foreign_members: None,
            })
            .collect(),
    )
}

/// One closed polygon per ring.
#[must_use]
pub fn isochrone_collection(rings: &[IsochroneRing]) -> FeatureCollection {
    collection(
        rings
            .iter()
            .map(|ring| {
                let exterior: LineString<f64> = ring
                    .vertices
                    .iter()
                    .map(|v| (v.lng, v.lat))
                    .collect::<Vec<_>>()
                    .into();
                let polygon = Polygon::new(exterior, vec![]);
                Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(geojson::Value::from(&polygon))),
                    id: None,
                    properties: properties(serde_json::json!({
                        "facilityId": ring.facility_id,
                        "facilityName": ring.facility_name,
                        "ringLabel": ring.label,
                        "minutes": ring.minutes,
                        "radiusKm": ring.radius_km,
                    })),
                    foreign_members: None,
                }
            })
            .collect(),
    )
}
