#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Healthcare facility types.
//!
//! A [`FacilityRecord`] is a row exactly as the record store returns it:
//! free-text attribute lists still encoded, structured fields still text,
//! coordinates optional. Ingestion (in `care_map_locator`) turns it into a
//! [`Facility`], which always carries exactly one resolved coordinate and
//! decoded attribute lists.

pub mod list;

pub use list::{decode_string_list, parse_string_list};

use care_map_geography_models::LatLng;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// How a facility's coordinate was obtained.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum GeocodeQuality {
    /// Coordinates supplied by the source record itself.
    Address,
    /// Resolved from the city or address text through the gazetteer.
    City,
    /// Fell back to a region centroid (or the country default).
    RegionCentroid,
}

/// One of the free-text attribute lists a capability can be matched in.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttributeField {
    /// Medical specialties.
    Specialties,
    /// Procedures performed.
    Procedures,
    /// Equipment on site.
    Equipment,
    /// Free-form capability notes.
    Capabilities,
    /// The facility description.
    Description,
}

/// Decoded free-text attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeTextAttributes {
    /// Medical specialties (e.g. "cardiology").
    pub specialties: Vec<String>,
    /// Procedures performed.
    pub procedures: Vec<String>,
    /// Equipment on site.
    pub equipment: Vec<String>,
    /// Free-form capability notes.
    pub capabilities: Vec<String>,
    /// Description, if any.
    pub description: Option<String>,
}

impl FreeTextAttributes {
    /// Text entries for one attribute field.
    #[must_use]
    pub fn field(&self, field: AttributeField) -> &[String] {
        match field {
            AttributeField::Specialties => &self.specialties,
            AttributeField::Procedures => &self.procedures,
            AttributeField::Equipment => &self.equipment,
            AttributeField::Capabilities => &self.capabilities,
            AttributeField::Description => self.description.as_slice(),
        }
    }
}

/// Structured attributes. `None` always means unknown, never zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredAttributes {
    /// Facility type (e.g. "hospital", "clinic").
    pub facility_type: Option<String>,
    /// Operator class (e.g. "public", "private").
    pub operator_type: Option<String>,
    /// Number of doctors on staff.
    pub num_doctors: Option<u32>,
    /// Bed capacity.
    pub capacity: Option<u32>,
    /// Year the facility opened.
    pub year_established: Option<u16>,
}

/// A facility row as returned by the record store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityRecord {
    /// Source identifier. Not guaranteed unique across revisions.
    pub id: String,
    /// Display name.
    pub name: String,
    /// City text.
    pub city: Option<String>,
    /// Region (state or region) text.
    pub region: Option<String>,
    /// First address line.
    pub address_line: Option<String>,
    /// Raw latitude, if the source has one.
    pub latitude: Option<f64>,
    /// Raw longitude, if the source has one.
    pub longitude: Option<f64>,
    /// Encoded specialties list.
    pub specialties: Option<String>,
    /// Encoded procedures list.
    pub procedures: Option<String>,
    /// Encoded equipment list.
    pub equipment: Option<String>,
    /// Encoded capability list.
    pub capabilities: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// Facility type text.
    pub facility_type: Option<String>,
    /// Operator type text.
    pub operator_type: Option<String>,
    /// Doctor count as text.
    pub num_doctors: Option<String>,
    /// Capacity as text.
    pub capacity: Option<String>,
    /// Year established as text.
    pub year_established: Option<String>,
}

/// A facility with a resolved nominal coordinate.
///
/// The coordinate is the pre-placement location: facilities that resolve
/// to the same city share it. Placed (spread) coordinates are derived per
/// request and never stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facility {
    /// Source identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Nominal coordinate.
    pub coordinate: LatLng,
    /// How the coordinate was obtained.
    pub geocode_quality: GeocodeQuality,
    /// City text, trimmed.
    pub city: Option<String>,
    /// Region text, trimmed.
    pub region: Option<String>,
    /// First address line.
    pub address: Option<String>,
    /// Decoded free-text attributes.
    pub attributes: FreeTextAttributes,
    /// Structured attributes.
    pub structured: StructuredAttributes,
}
