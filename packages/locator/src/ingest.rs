//! Record to facility conversion.
//!
//! Each record gets exactly one coordinate. The fallback chain is:
//!
//! 1. The record's own latitude/longitude (quality `address`)
//! 2. The city text through the gazetteer (quality `city`)
//! 3. The first address line through the gazetteer (quality `city`)
//! 4. The region text through the gazetteer (quality `region-centroid`)
//! 5. The gazetteer's default centroid (quality `region-centroid`, logged)
//!
//! A name in steps 2-3 that only resolves to a region centroid is tagged
//! `region-centroid`, not `city`.

use care_map_facility_models::{
    Facility, FacilityRecord, FreeTextAttributes, GeocodeQuality, StructuredAttributes,
    decode_string_list,
};
use care_map_geography::Gazetteer;
use care_map_geography_models::LatLng;

use crate::resolve::{ResolvedKind, try_resolve};

/// Converts records into facilities, in input order.
#[must_use]
pub fn ingest_records(records: Vec<FacilityRecord>, gazetteer: &dyn Gazetteer) -> Vec<Facility> {
    let mut defaulted = 0usize;
    let facilities: Vec<Facility> = records
        .into_iter()
        .map(|record| {
            let facility = ingest_record(record, gazetteer);
            if facility.geocode_quality == GeocodeQuality::RegionCentroid
                && facility.coordinate == gazetteer.default_centroid()
            {
                defaulted += 1;
            }
            facility
        })
        .collect();

    if defaulted > 0 {
        log::warn!(
            "{defaulted} of {} facilities had no resolvable location and were placed at the {} default centroid",
            facilities.len(),
            gazetteer.name()
        );
    }
    facilities
}

/// Converts one record.
#[must_use]
pub fn ingest_record(record: FacilityRecord, gazetteer: &dyn Gazetteer) -> Facility {
    let (coordinate, geocode_quality) = resolve_coordinate(&record, gazetteer);

    let attributes = FreeTextAttributes {
        specialties: decode_list(&record.id, "specialties", record.specialties.as_deref()),
        procedures: decode_list(&record.id, "procedures", record.procedures.as_deref()),
        equipment: decode_list(&record.id, "equipment", record.equipment.as_deref()),
        capabilities: decode_list(&record.id, "capabilities", record.capabilities.as_deref()),
        description: non_blank(record.description),
    };

    let structured = StructuredAttributes {
        facility_type: non_blank(record.facility_type),
        operator_type: non_blank(record.operator_type),
        num_doctors: parse_count(record.num_doctors.as_deref()),
        capacity: parse_count(record.capacity.as_deref()),
        year_established: parse_count(record.year_established.as_deref()),
    };

    Facility {
        id: record.id,
        name: record.name,
        coordinate,
        geocode_quality,
        city: non_blank(record.city),
        region: non_blank(record.region),
        address: non_blank(record.address_line),
        attributes,
        structured,
    }
}

fn resolve_coordinate(record: &FacilityRecord, gazetteer: &dyn Gazetteer) -> (LatLng, GeocodeQuality) {
    if let (Some(lat), Some(lng)) = (record.latitude, record.longitude) {
        let raw = LatLng::new(lat, lng);
        if raw.is_valid() {
            return (raw, GeocodeQuality::Address);
        }
        log::debug!("Ignoring out-of-range coordinates {raw} on facility {}", record.id);
    }

    let by_name = [record.city.as_deref(), record.address_line.as_deref()]
        .into_iter()
        .flatten()
        .find_map(|text| try_resolve(gazetteer, text));
    if let Some(resolved) = by_name {
        let quality = if resolved.kind == ResolvedKind::Region {
            GeocodeQuality::RegionCentroid
        } else {
            GeocodeQuality::City
        };
        return (resolved.coordinate, quality);
    }

    if let Some(resolved) = record
        .region
        .as_deref()
        .and_then(|text| try_resolve(gazetteer, text))
    {
        return (resolved.coordinate, GeocodeQuality::RegionCentroid);
    }

    log::debug!(
        "Facility {} ({}) has no resolvable location, using default centroid",
        record.id,
        record.name
    );
    (gazetteer.default_centroid(), GeocodeQuality::RegionCentroid)
}

fn decode_list(id: &str, field: &str, raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    decode_string_list(raw).unwrap_or_else(|| {
        log::warn!("Facility {id}: undecodable {field} list, treating as empty");
        Vec::new()
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses a non-negative whole number, accepting `"12"` and `"12.0"`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn parse_count<T: TryFrom<u64>>(raw: Option<&str>) -> Option<T> {
    let value: f64 = raw?.trim().parse().ok()?;
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > u64::MAX as f64 {
        return None;
    }
    T::try_from(value as u64).ok()
}
