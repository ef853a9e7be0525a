#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line host for the care map coverage engine.
//!
//! Loads a facility CSV export once, then runs a single query against it
//! and prints the JSON result, or serves the map API over HTTP.
//!
//! Uses `indicatif-log-bridge` (via [`care_map_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use care_map_analytics::{Engine, EngineConfig, summarize_tool_result, tools};
use care_map_analytics_models::{
    CountFacilitiesParams, DesertFieldParams, DistanceParams, FindGapsParams, GeocodeParams,
    IsochronesParams, RadiusSearchParams, ToolName,
};
use care_map_cli_utils::{IndicatifProgress, MultiProgress};
use care_map_geography::{Gazetteer, StaticGazetteer};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "care_map_cli")]
#[command(about = "Search healthcare facilities and map coverage deserts")]
struct Cli {
    /// Path to the facility CSV export.
    facilities: PathBuf,

    /// Engine configuration TOML. Defaults to `CARE_MAP_CONFIG`, then
    /// built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the JSON result here instead of stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Query to run.
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Facilities within a radius of a place, nearest first.
    Search {
        /// Place name, landmark, region, or "lat,lng".
        location: String,

        /// Search radius in kilometers.
        #[arg(long)]
        radius_km: Option<f64>,

        /// Capability terms, e.g. "cardiology".
        #[arg(long)]
        condition: Option<String>,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Underserved areas for a capability, worst first.
    Gaps {
        /// Capability terms, e.g. "surgery".
        specialty: String,

        /// Distance beyond which a cell counts as underserved.
        #[arg(long)]
        min_gap_km: Option<f64>,

        /// Restrict the scan to a region's bounding box.
        #[arg(long)]
        region: Option<String>,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Great-circle distance between two places.
    Distance { from: String, to: String },

    /// Facility counts with a per-region breakdown.
    Count {
        #[arg(long)]
        condition: Option<String>,

        #[arg(long)]
        region: Option<String>,
    },

    /// Every facility as a `GeoJSON` marker at its placed coordinate.
    Geocode {
        #[arg(long)]
        region: Option<String>,

        #[arg(long)]
        facility_type: Option<String>,
    },

    /// Distance-to-care heat field.
    Deserts {
        specialty: String,

        #[arg(long)]
        region: Option<String>,

        /// Grid resolution in degrees.
        #[arg(long)]
        step_deg: Option<f64>,
    },

    /// Travel-time rings around every capable facility.
    Isochrones {
        specialty: String,

        #[arg(long)]
        region: Option<String>,
    },

    /// Serve the map API over HTTP.
    Serve {
        /// Defaults to `BIND_ADDR`, then 127.0.0.1.
        #[arg(long)]
        bind_addr: Option<String>,

        /// Defaults to `PORT`, then 8080.
        #[arg(long)]
        port: Option<u16>,
    },
}

#[allow(clippy::too_many_lines)]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = care_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::from_env()?,
    };
    let engine = load_engine(&multi, &cli.facilities, config)?;

    let (tool, value) = match cli.command {
        Commands::Search {
            location,
            radius_km,
            condition,
            limit,
        } => {
            let params = RadiusSearchParams {
                location,
                radius_km,
                condition,
                limit,
            };
            (
                ToolName::FindFacilitiesInRadius,
                serde_json::to_value(tools::radius_search(&engine, &params)?)?,
            )
        }
        Commands::Gaps {
            specialty,
            min_gap_km,
            region,
            limit,
        } => {
            let params = FindGapsParams {
                specialty,
                min_gap_km,
                region,
                limit,
            };
            let engine = engine
                .with_scan_progress(IndicatifProgress::scan_bar(&multi, "Scanning for gaps"));
            (
                ToolName::FindCoverageGaps,
                serde_json::to_value(tools::find_gaps(&engine, &params)?)?,
            )
        }
        Commands::Distance { from, to } => (
            ToolName::CalculateDistance,
            serde_json::to_value(tools::distance(&engine, &DistanceParams { from, to })?)?,
        ),
        Commands::Count { condition, region } => (
            ToolName::CountFacilities,
            serde_json::to_value(tools::count_facilities(
                &engine,
                &CountFacilitiesParams { condition, region },
            ))?,
        ),
        Commands::Geocode {
            region,
            facility_type,
        } => (
            ToolName::GeocodeFacilities,
            serde_json::to_value(tools::geocode_all(
                &engine,
                &GeocodeParams {
                    region,
                    facility_type,
                },
            ))?,
        ),
        Commands::Deserts {
            specialty,
            region,
            step_deg,
        } => (
            ToolName::DesertField,
            serde_json::to_value(tools::desert_field(
                &engine,
                &DesertFieldParams {
                    specialty,
                    region,
                    step_deg,
                },
            )?)?,
        ),
        Commands::Isochrones { specialty, region } => (
            ToolName::Isochrones,
            serde_json::to_value(tools::isochrones(
                &engine,
                &IsochronesParams { specialty, region },
            )?)?,
        ),
        Commands::Serve { bind_addr, port } => {
            let (env_addr, env_port) = care_map_server::bind_from_env();
            let bind_addr = bind_addr.unwrap_or(env_addr);
            let port = port.unwrap_or(env_port);
            actix_web::rt::System::new().block_on(care_map_server::run_server(
                engine, &bind_addr, port,
            ))?;
            return Ok(());
        }
    };

    log::info!("{}", summarize_tool_result(tool, &value));
    write_output(cli.output.as_deref(), &value)?;

    Ok(())
}

fn load_engine(
    multi: &MultiProgress,
    path: &Path,
    config: EngineConfig,
) -> Result<Engine, Box<dyn std::error::Error>> {
    let gazetteer: Arc<dyn Gazetteer> = Arc::new(StaticGazetteer::ghana());
    let progress = IndicatifProgress::records_spinner(multi, "Reading facilities");
    Ok(Engine::load_csv(path, gazetteer, config, progress.as_ref())?)
}

fn write_output(path: Option<&Path>, value: &serde_json::Value) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => {
            std::fs::write(path, json)?;
            log::info!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
