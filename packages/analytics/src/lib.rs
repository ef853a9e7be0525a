#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Query engine for the map API, the CLI, and agent tool execution.
//!
//! An [`Engine`] owns one facility snapshot and the limits it is queried
//! under. Each function in [`tools`] corresponds to a tool that a caller
//! can invoke; [`execute_tool`] dispatches JSON tool calls to them.

pub mod config;
pub mod features;
pub mod tools;

use std::path::Path;
use std::str::FromStr as _;
use std::sync::Arc;

use care_map_analytics_models::{
    CountFacilitiesParams, DesertFieldParams, DistanceParams, FindGapsParams, GeocodeParams,
    IsochronesParams, RadiusSearchParams, ToolName,
};
use care_map_coverage::{CoverageError, GapScanner};
use care_map_desert::{DesertError, DesertLayers};
use care_map_geography::Gazetteer;
use care_map_geography_models::BoundingBox;
use care_map_locator::{FacilityLocator, LocatorError};
use care_map_source::progress::{ProgressCallback, null_progress};
use care_map_source::{CsvRecordStore, FacilityFilter};
use thiserror::Error;

pub use config::{ConfigError, EngineConfig};

/// Errors that can occur during query execution.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// A location or region did not resolve, or the store failed.
    #[error(transparent)]
    Locator(#[from] LocatorError),

    /// The gap scan could not run.
    #[error(transparent)]
    Coverage(#[from] CoverageError),

    /// A desert layer could not be built.
    #[error(transparent)]
    Desert(#[from] DesertError),

    /// The engine configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Tool parameters or results could not be converted.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A parameter is out of range.
    #[error("Invalid parameter: {message}")]
    InvalidParameter {
        /// Description of the problem.
        message: String,
    },

    /// No tool has this name.
    #[error("Unknown tool: {name}")]
    UnknownTool {
        /// The requested name.
        name: String,
    },
}

impl AnalyticsError {
    /// Suggestions for an unresolved location, if that is what failed.
    #[must_use]
    pub fn unresolved_suggestions(&self) -> Option<&[String]> {
        match self {
            Self::Locator(LocatorError::UnresolvedLocation { suggestions, .. }) => {
                Some(suggestions)
            }
            _ => None,
        }
    }

    /// Whether the caller sent something unusable (as opposed to the
    /// engine failing).
    #[must_use]
    pub const fn is_bad_request(&self) -> bool {
        matches!(
            self,
            Self::Coverage(_)
                | Self::Desert(_)
                | Self::Json(_)
                | Self::InvalidParameter { .. }
                | Self::UnknownTool { .. }
        )
    }
}

/// A facility snapshot plus the limits it is queried under.
pub struct Engine {
    locator: FacilityLocator,
    config: EngineConfig,
    scan_progress: Arc<dyn ProgressCallback>,
}

impl Engine {
    /// Wraps a loaded locator.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Config`] if `config` fails validation.
    pub fn new(locator: FacilityLocator, config: EngineConfig) -> Result<Self, AnalyticsError> {
        config.validate()?;
        Ok(Self {
            locator,
            config,
            scan_progress: null_progress(),
        })
    }

    /// Reports gap scan progress to `progress`.
    #[must_use]
    pub fn with_scan_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.scan_progress = progress;
        self
    }

    /// Loads a facility CSV export against `gazetteer`.
    ///
    /// # Errors
    ///
    /// * [`AnalyticsError::Locator`] if the CSV cannot be read
    /// * [`AnalyticsError::Config`] if `config` fails validation
    pub fn load_csv(
        path: &Path,
        gazetteer: Arc<dyn Gazetteer>,
        config: EngineConfig,
        progress: &dyn ProgressCallback,
    ) -> Result<Self, AnalyticsError> {
        let store = CsvRecordStore::open_with_progress(path, progress)
            .map_err(LocatorError::from)?;
        let locator = FacilityLocator::load(&store, &FacilityFilter::all(), gazetteer)?;
        progress.finish(format!(
            "Loaded {} facilities",
            locator.snapshot().len()
        ));
        Self::new(locator, config)
    }

    /// The facility locator.
    #[must_use]
    pub const fn locator(&self) -> &FacilityLocator {
        &self.locator
    }

    /// The engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A gap scanner bound by the configured limits.
    #[must_use]
    pub fn gap_scanner(&self) -> GapScanner<'_> {
        GapScanner::new(&self.locator)
            .with_limits(self.config.max_grid_cells, self.config.parallel_min_work)
            .with_progress(Arc::clone(&self.scan_progress))
    }

    /// Desert layers bound by the configured limits.
    #[must_use]
    pub const fn desert_layers(&self) -> DesertLayers<'_> {
        DesertLayers::new(&self.locator)
            .with_limits(self.config.max_grid_cells, self.config.parallel_min_work)
    }

    /// Area to scan: the named region's box, or the whole gazetteer.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Locator`] if the region is unknown.
    pub fn scan_bounds(
        &self,
        region: Option<&str>,
    ) -> Result<(Option<String>, BoundingBox), AnalyticsError> {
        match region {
            Some(name) => {
                let (name, bounds) = self.locator.region_bounds(name)?;
                Ok((Some(name), bounds))
            }
            None => Ok((None, self.locator.gazetteer().coverage_bounds())),
        }
    }
}

/// Executes a single tool by name with the given JSON parameters.
///
/// # Errors
///
/// * [`AnalyticsError::UnknownTool`] for an unrecognized name
/// * [`AnalyticsError::Json`] if the parameters do not match the tool
/// * any error of the tool itself
pub fn execute_tool(
    engine: &Engine,
    name: &str,
    input: &serde_json::Value,
) -> Result<serde_json::Value, AnalyticsError> {
    let tool = ToolName::from_str(name).map_err(|_| AnalyticsError::UnknownTool {
        name: name.to_string(),
    })?;
    log::debug!("Executing {tool}");

    let value = match tool {
        ToolName::FindFacilitiesInRadius => {
            let params: RadiusSearchParams = serde_json::from_value(input.clone())?;
            serde_json::to_value(tools::radius_search(engine, &params)?)?
        }
        ToolName::FindCoverageGaps => {
            let params: FindGapsParams = serde_json::from_value(input.clone())?;
            serde_json::to_value(tools::find_gaps(engine, &params)?)?
        }
        ToolName::CalculateDistance => {
            let params: DistanceParams = serde_json::from_value(input.clone())?;
            serde_json::to_value(tools::distance(engine, &params)?)?
        }
        ToolName::CountFacilities => {
            let params: CountFacilitiesParams = serde_json::from_value(input.clone())?;
            serde_json::to_value(tools::count_facilities(engine, &params))?
        }
        ToolName::GeocodeFacilities => {
            let params: GeocodeParams = serde_json::from_value(input.clone())?;
            serde_json::to_value(tools::geocode_all(engine, &params))?
        }
        ToolName::DesertField => {
            let params: DesertFieldParams = serde_json::from_value(input.clone())?;
            serde_json::to_value(tools::desert_field(engine, &params)?)?
        }
        ToolName::Isochrones => {
            let params: IsochronesParams = serde_json::from_value(input.clone())?;
            serde_json::to_value(tools::isochrones(engine, &params)?)?
        }
    };
    Ok(value)
}

/// Creates a brief human-readable summary of a tool result.
#[must_use]
pub fn summarize_tool_result(tool: ToolName, result: &serde_json::Value) -> String {
    match tool {
        ToolName::FindFacilitiesInRadius => {
            let total = result["totalFound"].as_u64().unwrap_or(0);
            let center = result["center"]["matchedName"].as_str().unwrap_or("the center");
            format!("Found {total} facilities near {center}")
        }
        ToolName::FindCoverageGaps => {
            if result["noCapableFacilities"].as_bool().unwrap_or(false) {
                "No facility offers this capability".to_string()
            } else {
                let gaps = result["gapCount"].as_u64().unwrap_or(0);
                format!("Found {gaps} coverage gaps")
            }
        }
        ToolName::CalculateDistance => {
            let km = result["distanceKm"].as_f64().unwrap_or(0.0);
            format!("{km:.1} km")
        }
        ToolName::CountFacilities => {
            let total = result["total"].as_u64().unwrap_or(0);
            format!("{total} facilities")
        }
        ToolName::GeocodeFacilities => {
            let count = result["count"].as_u64().unwrap_or(0);
            format!("{count} facilities placed")
        }
        ToolName::DesertField => {
            let cells = result["cellCount"].as_u64().unwrap_or(0);
            let max = result["maxDistanceKm"].as_f64().unwrap_or(0.0);
            format!("{cells} cells, farthest {max:.1} km from care")
        }
        ToolName::Isochrones => {
            let rings = result["ringCount"].as_u64().unwrap_or(0);
            format!("{rings} travel-time rings")
        }
    }
}

#[cfg(test)]
mod tests {
    use care_map_facility_models::FacilityRecord;
    use care_map_geography::StaticGazetteer;
    use care_map_source::MemoryRecordStore;
    use serde_json::json;

    use super::*;

    const SYNTHETIC: &str = r#"
        name = "Testland"
        default_centroid = { lat = 1.0, lng = 1.0 }
        bounds = { west = 0.0, south = 0.0, east = 2.0, north = 2.0 }
        landmarks = [ { name = "Harbour Clinic", lat = 0.2, lng = 0.2 } ]
        places = [
          { name = "Portville", lat = 0.2, lng = 0.2 },
          { name = "Hillside", lat = 1.8, lng = 1.8 },
        ]
        regions = [
          { name = "Coastal", lat = 0.5, lng = 0.5, bounds = { west = 0.0, south = 0.0, east = 1.0, north = 1.0 } },
          { name = "Highlands", lat = 1.5, lng = 1.5, bounds = { west = 1.0, south = 1.0, east = 2.0, north = 2.0 } },
        ]
    "#;

    fn record(id: &str, name: &str, city: &str, region: &str, specialties: &str) -> FacilityRecord {
        FacilityRecord {
            id: id.to_string(),
            name: name.to_string(),
            city: Some(city.to_string()),
            region: Some(region.to_string()),
            specialties: Some(specialties.to_string()),
            facility_type: Some("hospital".to_string()),
            ..FacilityRecord::default()
        }
    }

    fn engine() -> Engine {
        let gazetteer: Arc<dyn Gazetteer> =
            Arc::new(StaticGazetteer::from_toml_str(SYNTHETIC).expect("valid gazetteer"));
        let store = MemoryRecordStore::new(vec![
            record("p1", "Portville General", "Portville", "Coastal", "['Cardiology', 'Surgery']"),
            record("p2", "Portville Maternity", "Portville", "Coastal", "['Obstetrics']"),
            record("h1", "Hillside Clinic", "Hillside", "Highlands", "['General Practice']"),
            FacilityRecord {
                specialties: Some("['unterminated".to_string()),
                ..record("x", "Mystery Post", "Nowhere", "", "")
            },
        ]);
        let locator = FacilityLocator::load(&store, &FacilityFilter::all(), gazetteer)
            .expect("memory store");
        Engine::new(locator, EngineConfig::default()).expect("valid config")
    }

    #[test]
    fn radius_search_resolves_and_sorts() {
        let engine = engine();
        let result = execute_tool(
            &engine,
            "find_facilities_in_radius",
            &json!({ "location": "Portville", "radiusKm": 10.0 }),
        )
        .expect("search");
        assert_eq!(result["totalFound"], 2);
        assert_eq!(result["center"]["kind"], "place");
        let results = result["results"].as_array().expect("results");
        assert!(results[0]["distanceKm"].as_f64() <= results[1]["distanceKm"].as_f64());
    }

    #[test]
    fn radius_search_reports_matched_fields() {
        let engine = engine();
        let result = tools::radius_search(
            &engine,
            &RadiusSearchParams {
                location: "0.2,0.2".to_string(),
                radius_km: Some(10.0),
                condition: Some("cardio".to_string()),
                limit: None,
            },
        )
        .expect("search");
        assert_eq!(result.total_found, 1);
        assert_eq!(result.results[0].id, "p1");
        assert_eq!(result.results[0].matched_fields.len(), 1);
    }

    #[test]
    fn unresolved_locations_carry_suggestions() {
        let engine = engine();
        let err = execute_tool(
            &engine,
            "find_facilities_in_radius",
            &json!({ "location": "Hogsmeade" }),
        )
        .expect_err("unknown place");
        let suggestions = err.unresolved_suggestions().expect("unresolved location");
        assert!(suggestions.iter().any(|s| s == "Highlands" || s == "Hillside"));
        assert!(!err.is_bad_request());
    }

    #[test]
    fn no_capable_facilities_is_reported_not_raised() {
        let engine = engine();
        let result = tools::find_gaps(
            &engine,
            &FindGapsParams {
                specialty: "neurosurgery".to_string(),
                min_gap_km: None,
                region: None,
                limit: None,
            },
        )
        .expect("scan");
        assert!(result.no_capable_facilities);
        assert!(result.gaps.is_empty());
        assert_eq!(result.gap_count, 0);
    }

    #[test]
    fn gaps_can_be_constrained_to_a_region() {
        let engine = engine();
        let result = tools::find_gaps(
            &engine,
            &FindGapsParams {
                specialty: "cardiology".to_string(),
                min_gap_km: Some(100.0),
                region: Some("highlands".to_string()),
                limit: Some(5),
            },
        )
        .expect("scan");
        assert_eq!(result.region.as_deref(), Some("Highlands"));
        assert_eq!(result.bounds, BoundingBox::new(1.0, 1.0, 2.0, 2.0));
        assert_eq!(result.capable_facilities, 1);
        assert!(!result.gaps.is_empty());
        assert!(result.gaps.iter().all(|g| g.nearest_facility_id == "p1"));
        assert_eq!(result.gap_count, result.gaps.len());
        assert!(result.total_gaps >= result.gap_count);

        let err = tools::find_gaps(
            &engine,
            &FindGapsParams {
                specialty: "cardiology".to_string(),
                min_gap_km: None,
                region: Some("Atlantis".to_string()),
                limit: None,
            },
        )
        .expect_err("unknown region");
        assert!(err.unresolved_suggestions().is_some());
    }

    #[test]
    fn gap_count_matches_the_returned_regions() {
        let engine = engine();
        let result = tools::find_gaps(
            &engine,
            &FindGapsParams {
                specialty: "cardiology".to_string(),
                min_gap_km: Some(0.0),
                region: None,
                limit: Some(0),
            },
        )
        .expect("scan");
        assert!(result.gaps.is_empty());
        assert_eq!(result.gap_count, 0);
        assert!(result.total_gaps >= 1, "the far corner is always a gap at 0 km");
    }

    #[test]
    fn distance_between_named_places() {
        let engine = engine();
        let result = tools::distance(
            &engine,
            &DistanceParams {
                from: "Portville".to_string(),
                to: "Hillside".to_string(),
            },
        )
        .expect("distance");
        let expected = care_map_spatial::distance_km(
            care_map_geography_models::LatLng::new(0.2, 0.2),
            care_map_geography_models::LatLng::new(1.8, 1.8),
        );
        assert!((result.distance_km - expected).abs() < 1e-9);
    }

    #[test]
    fn geocode_places_every_facility() {
        let engine = engine();
        let result = tools::geocode_all(&engine, &GeocodeParams::default());
        assert_eq!(result.count, 4);
        assert_eq!(result.geojson.features.len(), 4);
        assert_eq!(
            result
                .by_quality
                .get(&care_map_facility_models::GeocodeQuality::RegionCentroid),
            Some(&1)
        );

        let coastal = tools::geocode_all(
            &engine,
            &GeocodeParams {
                region: Some("coast".to_string()),
                facility_type: None,
            },
        );
        assert_eq!(coastal.count, 2);
    }

    #[test]
    fn malformed_attribute_lists_never_fail_a_count() {
        let engine = engine();
        let result = tools::count_facilities(&engine, &CountFacilitiesParams::default());
        assert_eq!(result.total, 4);
        assert_eq!(result.by_region.get("Coastal"), Some(&2));
    }

    #[test]
    fn desert_field_and_isochrones_through_the_tool_interface() {
        let engine = engine();
        let field = execute_tool(
            &engine,
            "desert_field",
            &json!({ "specialty": "surgery", "stepDeg": 0.5 }),
        )
        .expect("desert field");
        assert_eq!(field["cellCount"], 25);
        assert_eq!(field["noCapableFacilities"], false);
        assert_eq!(field["geojson"]["features"].as_array().map(Vec::len), Some(25));

        let rings = execute_tool(&engine, "isochrones", &json!({ "specialty": "surgery" }))
            .expect("isochrones");
        assert_eq!(rings["ringCount"], 3);
        assert_eq!(rings["geojson"]["features"][0]["properties"]["facilityId"], "p1");
    }

    #[test]
    fn unknown_tools_and_bad_parameters_are_bad_requests() {
        let engine = engine();
        let err = execute_tool(&engine, "rank_areas", &json!({})).expect_err("unknown tool");
        assert!(matches!(err, AnalyticsError::UnknownTool { .. }));
        assert!(err.is_bad_request());

        let err = execute_tool(&engine, "find_coverage_gaps", &json!({ "minGapKm": 5 }))
            .expect_err("missing specialty");
        assert!(matches!(err, AnalyticsError::Json(_)));

        let err = execute_tool(
            &engine,
            "find_coverage_gaps",
            &json!({ "specialty": "surgery", "minGapKm": -5 }),
        )
        .expect_err("negative threshold");
        assert!(err.is_bad_request());
    }

    #[test]
    fn summaries_describe_results() {
        assert_eq!(
            summarize_tool_result(ToolName::CalculateDistance, &json!({ "distanceKm": 199.23 })),
            "199.2 km"
        );
        assert_eq!(
            summarize_tool_result(
                ToolName::FindCoverageGaps,
                &json!({ "noCapableFacilities": true, "gapCount": 0 })
            ),
            "No facility offers this capability"
        );
    }
}
