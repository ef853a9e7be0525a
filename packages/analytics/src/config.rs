//! Engine configuration.
//!
//! Every field has a default, so an empty TOML file (or no file at all)
//! yields a working engine. The path of an optional override file is read
//! from `CARE_MAP_CONFIG`.

use std::path::{Path, PathBuf};

use care_map_coverage_models::TravelBand;
use serde::{Deserialize, Serialize};

/// Environment variable naming an engine configuration file.
pub const CONFIG_ENV_VAR: &str = "CARE_MAP_CONFIG";

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this shape.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("Invalid config: {message}")]
    Invalid {
        /// Description of the problem.
        message: String,
    },
}

/// Isochrone generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsochroneConfig {
    /// Angular spacing between ring vertices in degrees.
    pub vertex_step_deg: f64,
    /// Travel bands, innermost first.
    #[serde(with = "band_keys")]
    pub bands: Vec<TravelBand>,
}

/// Reads and writes travel bands with the same snake_case keys as the rest
/// of the file. API responses keep the camelCase [`TravelBand`] shape.
mod band_keys {
    use care_map_coverage_models::TravelBand;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct BandKeys {
        label: String,
        minutes: f64,
        speed_kmh: f64,
        distortion: f64,
    }

    pub fn serialize<S: Serializer>(bands: &[TravelBand], serializer: S) -> Result<S::Ok, S::Error> {
        bands
            .iter()
            .map(|band| BandKeys {
                label: band.label.clone(),
                minutes: band.minutes,
                speed_kmh: band.speed_kmh,
                distortion: band.distortion,
            })
            .collect::<Vec<_>>()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<TravelBand>, D::Error> {
        Ok(Vec::<BandKeys>::deserialize(deserializer)?
            .into_iter()
            .map(|keys| TravelBand::new(&keys.label, keys.minutes, keys.speed_kmh, keys.distortion))
            .collect())
    }
}

impl Default for IsochroneConfig {
    fn default() -> Self {
        Self {
            vertex_step_deg: 5.0,
            bands: TravelBand::defaults(),
        }
    }
}

/// Engine limits and defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Gap scanner grid spacing in degrees.
    pub scan_step_deg: f64,
    /// Heat field grid spacing in degrees.
    pub heat_step_deg: f64,
    /// Largest grid any request may lay out.
    pub max_grid_cells: usize,
    /// `cells * facilities` product above which grids run in parallel.
    pub parallel_min_work: usize,
    /// Radius search limit when the caller gives none.
    pub default_search_limit: usize,
    /// Upper bound on any radius search limit.
    pub max_search_limit: usize,
    /// Gap region limit when the caller gives none.
    pub default_gap_limit: usize,
    /// Upper bound on any gap region limit.
    pub max_gap_limit: usize,
    /// Radius when the caller gives none.
    pub default_search_radius_km: f64,
    /// Gap threshold when the caller gives none.
    pub default_min_gap_km: f64,
    /// Isochrone settings.
    pub isochrone: IsochroneConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scan_step_deg: 0.1,
            heat_step_deg: 0.1,
            max_grid_cells: care_map_coverage::DEFAULT_MAX_GRID_CELLS,
            parallel_min_work: care_map_coverage::DEFAULT_PARALLEL_MIN_WORK,
            default_search_limit: 20,
            max_search_limit: 500,
            default_gap_limit: 10,
            max_gap_limit: 200,
            default_search_radius_km: 50.0,
            default_min_gap_km: 50.0,
            isochrone: IsochroneConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parses and validates a TOML configuration.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Parse`] if the TOML is malformed
    /// * [`ConfigError::Invalid`] if a value is out of range
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::de::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a configuration file.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Io`] if the file cannot be read
    /// * [`ConfigError::Parse`] or [`ConfigError::Invalid`] as for
    ///   [`Self::from_toml_str`]
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loading engine config from {}", path.display());
        Self::from_toml_str(&contents)
    }

    /// Loads the file named by `CARE_MAP_CONFIG`, or the defaults if the
    /// variable is unset.
    ///
    /// # Errors
    ///
    /// Returns any error of [`Self::from_path`].
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::from_path(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    /// Checks every value is in range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| Err(ConfigError::Invalid { message });

        for (name, step) in [
            ("scan_step_deg", self.scan_step_deg),
            ("heat_step_deg", self.heat_step_deg),
            ("isochrone.vertex_step_deg", self.isochrone.vertex_step_deg),
        ] {
            if !step.is_finite() || step <= 0.0 {
                return invalid(format!("{name} must be positive, got {step}"));
            }
        }
        for (name, km) in [
            ("default_search_radius_km", self.default_search_radius_km),
            ("default_min_gap_km", self.default_min_gap_km),
        ] {
            if !km.is_finite() || km < 0.0 {
                return invalid(format!("{name} must not be negative, got {km}"));
            }
        }
        if self.max_grid_cells == 0 {
            return invalid("max_grid_cells must be at least 1".to_string());
        }
        if self.default_search_limit > self.max_search_limit {
            return invalid(format!(
                "default_search_limit {} exceeds max_search_limit {}",
                self.default_search_limit, self.max_search_limit
            ));
        }
        if self.default_gap_limit > self.max_gap_limit {
            return invalid(format!(
                "default_gap_limit {} exceeds max_gap_limit {}",
                self.default_gap_limit, self.max_gap_limit
            ));
        }
        if self.isochrone.bands.is_empty() {
            return invalid("isochrone.bands must not be empty".to_string());
        }
        for band in &self.isochrone.bands {
            if !(0.0..1.0).contains(&band.distortion) {
                return invalid(format!(
                    "band '{}' distortion must be in [0, 1), got {}",
                    band.label, band.distortion
                ));
            }
            let radius_km = band.radius_km();
            if !radius_km.is_finite() || radius_km <= 0.0 {
                return invalid(format!("band '{}' has no radius", band.label));
            }
        }
        Ok(())
    }

    /// Clamps a caller's radius search limit.
    #[must_use]
    pub fn search_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_search_limit)
            .min(self.max_search_limit)
    }

    /// Clamps a caller's gap region limit.
    #[must_use]
    pub fn gap_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_gap_limit)
            .min(self.max_gap_limit)
    }
}
