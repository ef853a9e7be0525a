#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Capability matching.
//!
//! "Does this facility plausibly offer X" is answered in exactly one
//! place: [`CapabilityMatcher::has_capability`]. A facility matches when
//! any configured attribute list has an entry that, lowercased, contains
//! any of the search terms as a substring. Search, gap scanning, and the
//! desert layers all go through this function.

use care_map_facility_models::{AttributeField, Facility};
use serde::Serialize;
use strum::IntoEnumIterator;

/// A non-empty set of lowercase search terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TermSet {
    terms: Vec<String>,
}

impl TermSet {
    /// Builds a term set from individual terms.
    ///
    /// Terms are trimmed and lowercased; blanks and duplicates are
    /// dropped. Returns `None` when nothing is left.
    pub fn new<I, S>(terms: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut collected: Vec<String> = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        collected.sort();
        collected.dedup();

        if collected.is_empty() {
            None
        } else {
            Some(Self { terms: collected })
        }
    }

    /// Parses a user query such as `"cardiology"` or `"dialysis, renal"`.
    ///
    /// Commas separate alternative terms.
    #[must_use]
    pub fn from_query(query: &str) -> Option<Self> {
        Self::new(query.split(','))
    }

    /// The normalized terms, sorted.
    #[must_use]
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Whether `text`, lowercased, contains any term.
    #[must_use]
    pub fn matches_text(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.terms.iter().any(|term| lower.contains(term.as_str()))
    }
}

/// Matches term sets against a configurable subset of attribute fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityMatcher {
    fields: Vec<AttributeField>,
}

impl Default for CapabilityMatcher {
    fn default() -> Self {
        Self {
            fields: AttributeField::iter().collect(),
        }
    }
}

impl CapabilityMatcher {
    /// A matcher that only looks at `fields`.
    #[must_use]
    pub fn with_fields(fields: &[AttributeField]) -> Self {
        let mut fields = fields.to_vec();
        fields.sort();
        fields.dedup();
        Self { fields }
    }

    /// The fields this matcher inspects.
    #[must_use]
    pub fn fields(&self) -> &[AttributeField] {
        &self.fields
    }

    /// Whether `facility` offers anything in `terms`.
    #[must_use]
    pub fn has_capability(&self, facility: &Facility, terms: &TermSet) -> bool {
        self.fields.iter().any(|field| {
            facility
                .attributes
                .field(*field)
                .iter()
                .any(|entry| terms.matches_text(entry))
        })
    }

    /// The fields in which `facility` matched, for explaining a result.
    #[must_use]
    pub fn matched_fields(&self, facility: &Facility, terms: &TermSet) -> Vec<AttributeField> {
        self.fields
            .iter()
            .copied()
            .filter(|field| {
                facility
                    .attributes
                    .field(*field)
                    .iter()
                    .any(|entry| terms.matches_text(entry))
            })
            .collect()
    }

    /// Indices of the facilities that match `terms`, in input order.
    ///
    /// With no terms every facility qualifies.
    #[must_use]
    pub fn filter_indices(&self, facilities: &[Facility], terms: Option<&TermSet>) -> Vec<usize> {
        facilities
            .iter()
            .enumerate()
            .filter(|(_, f)| terms.is_none_or(|t| self.has_capability(f, t)))
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use care_map_facility_models::{
        FreeTextAttributes, GeocodeQuality, StructuredAttributes,
    };
    use care_map_geography_models::LatLng;

    use super::*;

    fn facility(specialties: &[&str], equipment: &[&str], description: Option<&str>) -> Facility {
        Facility {
            id: "f1".to_string(),
            name: "Test Clinic".to_string(),
            coordinate: LatLng::new(0.0, 0.0),
            geocode_quality: GeocodeQuality::Address,
            city: None,
            region: None,
            address: None,
            attributes: FreeTextAttributes {
                specialties: specialties.iter().map(ToString::to_string).collect(),
                equipment: equipment.iter().map(ToString::to_string).collect(),
                description: description.map(ToString::to_string),
                ..FreeTextAttributes::default()
            },
            structured: StructuredAttributes::default(),
        }
    }

    #[test]
    fn term_sets_normalize_and_reject_blanks() {
        let terms = TermSet::from_query(" Cardiology, heart ,cardiology,").expect("terms");
        assert_eq!(terms.terms(), ["cardiology", "heart"]);
        assert!(TermSet::from_query(" , ").is_none());
        assert!(TermSet::new(Vec::<String>::new()).is_none());
    }

    #[test]
    fn matches_case_insensitive_substrings() {
        let f = facility(&["Interventional Cardiology"], &[], None);
        let terms = TermSet::from_query("cardio").expect("terms");
        assert!(CapabilityMatcher::default().has_capability(&f, &terms));
    }

    #[test]
    fn any_term_in_any_field_matches() {
        let f = facility(&[], &["CT Scanner"], Some("Regional referral hospital"));
        let matcher = CapabilityMatcher::default();
        assert!(matcher.has_capability(&f, &TermSet::from_query("mri, ct scan").expect("terms")));
        assert!(matcher.has_capability(&f, &TermSet::from_query("referral").expect("terms")));
        assert!(!matcher.has_capability(&f, &TermSet::from_query("neurosurgery").expect("terms")));
    }

    #[test]
    fn restricted_fields_are_respected() {
        let f = facility(&[], &["Dialysis machine"], None);
        let terms = TermSet::from_query("dialysis").expect("terms");
        let specialties_only = CapabilityMatcher::with_fields(&[AttributeField::Specialties]);
        assert!(!specialties_only.has_capability(&f, &terms));
        assert_eq!(
            CapabilityMatcher::default().matched_fields(&f, &terms),
            vec![AttributeField::Equipment]
        );
    }

    #[test]
    fn empty_attributes_never_match() {
        let f = facility(&[], &[], None);
        let terms = TermSet::from_query("surgery").expect("terms");
        assert!(!CapabilityMatcher::default().has_capability(&f, &terms));
    }

    #[test]
    fn filter_without_terms_keeps_everything() {
        let facilities = vec![
            facility(&["Pediatrics"], &[], None),
            facility(&["Oncology"], &[], None),
        ];
        let matcher = CapabilityMatcher::default();
        assert_eq!(matcher.filter_indices(&facilities, None), vec![0, 1]);
        let terms = TermSet::from_query("oncology").expect("terms");
        assert_eq!(matcher.filter_indices(&facilities, Some(&terms)), vec![1]);
    }
}
