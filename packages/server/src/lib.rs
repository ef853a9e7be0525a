#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web map API server for the care map engine.
//!
//! Serves the query interface over HTTP for the map frontend. Each
//! endpoint runs one engine tool on actix's blocking pool and wraps the
//! result in an envelope carrying the tool name and elapsed time.

mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use care_map_analytics::{AnalyticsError, Engine, EngineConfig};
use care_map_geography::{Gazetteer, StaticGazetteer};
use care_map_source::progress::NullProgress;
use thiserror::Error;

/// Environment variable naming the facility CSV to serve.
pub const FACILITIES_ENV_VAR: &str = "CARE_MAP_FACILITIES";

/// Errors that can occur while preparing the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// No facility CSV was configured.
    #[error("{FACILITIES_ENV_VAR} must name the facility CSV to serve")]
    MissingFacilities,

    /// The engine could not be built.
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),
}

/// Shared application state.
pub struct AppState {
    /// The loaded facility snapshot and its query limits.
    pub engine: Arc<Engine>,
}

/// Builds the engine from `CARE_MAP_FACILITIES` and `CARE_MAP_CONFIG`
/// against the embedded Ghana gazetteer.
///
/// # Errors
///
/// * [`ServerError::MissingFacilities`] if `CARE_MAP_FACILITIES` is unset
/// * [`ServerError::Analytics`] if the configuration or the CSV cannot be
///   loaded
pub fn load_engine_from_env() -> Result<Engine, ServerError> {
    let path = std::env::var_os(FACILITIES_ENV_VAR)
        .map(PathBuf::from)
        .ok_or(ServerError::MissingFacilities)?;
    let config = EngineConfig::from_env().map_err(AnalyticsError::from)?;
    let gazetteer: Arc<dyn Gazetteer> = Arc::new(StaticGazetteer::ghana());

    log::info!("Loading facilities from {}...", path.display());
    Ok(Engine::load_csv(&path, gazetteer, config, &NullProgress)?)
}

/// Reads `BIND_ADDR` and `PORT`, defaulting to `127.0.0.1:8080`.
#[must_use]
pub fn bind_from_env() -> (String, u16) {
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    (bind_addr, port)
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/search", web::get().to(handlers::search))
            .route("/gaps", web::get().to(handlers::gaps))
            .route("/distance", web::get().to(handlers::distance))
            .route("/geocode", web::get().to(handlers::geocode))
            .route("/count", web::get().to(handlers::count))
            .route("/deserts", web::get().to(handlers::deserts))
            .route("/isochrones", web::get().to(handlers::isochrones)),
    );
}

/// Starts the care map API server.
///
/// This is a regular async function; the caller provides the async
/// runtime (e.g. via `#[actix_web::main]`) and initializes logging.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
pub async fn run_server(engine: Engine, bind_addr: &str, port: u16) -> std::io::Result<()> {
    let state = web::Data::new(AppState {
        engine: Arc::new(engine),
    });

    log::info!(
        "Starting server on {bind_addr}:{port} with {} facilities",
        state.engine.locator().snapshot().len()
    );

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test::{TestRequest, call_service, init_service, read_body_json};
    use care_map_facility_models::FacilityRecord;
    use care_map_locator::FacilityLocator;
    use care_map_source::{FacilityFilter, MemoryRecordStore};

    use super::*;

    const SYNTHETIC: &str = r#"
        name = "Testland"
        default_centroid = { lat = 1.0, lng = 1.0 }
        bounds = { west = 0.0, south = 0.0, east = 2.0, north = 2.0 }
        places = [
          { name = "Portville", lat = 0.2, lng = 0.2 },
          { name = "Hillside", lat = 1.8, lng = 1.8 },
        ]
        regions = [
          { name = "Coastal", lat = 0.5, lng = 0.5, bounds = { west = 0.0, south = 0.0, east = 1.0, north = 1.0 } },
        ]
    "#;

    fn state() -> web::Data<AppState> {
        let gazetteer: Arc<dyn Gazetteer> =
            Arc::new(StaticGazetteer::from_toml_str(SYNTHETIC).expect("valid gazetteer"));
        let store = MemoryRecordStore::new(vec![FacilityRecord {
            id: "p1".to_string(),
            name: "Portville General".to_string(),
            city: Some("Portville".to_string()),
            region: Some("Coastal".to_string()),
            specialties: Some("['Surgery']".to_string()),
            ..FacilityRecord::default()
        }]);
        let locator =
            FacilityLocator::load(&store, &FacilityFilter::all(), gazetteer).expect("memory store");
        web::Data::new(AppState {
            engine: Arc::new(Engine::new(locator, EngineConfig::default()).expect("valid config")),
        })
    }

    async fn get(uri: &str) -> (StatusCode, serde_json::Value) {
        let app = init_service(App::new().app_data(state()).configure(configure)).await;
        let response = call_service(&app, TestRequest::get().uri(uri).to_request()).await;
        let status = response.status();
        (status, read_body_json(response).await)
    }

    #[actix_web::test]
    async fn health_reports_the_snapshot_size() {
        let (status, body) = get("/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["healthy"], true);
        assert_eq!(body["facilities"], 1);
    }

    #[actix_web::test]
    async fn search_results_are_wrapped_in_an_envelope() {
        let (status, body) = get("/api/search?location=Portville&radiusKm=10").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["tool"], "find_facilities_in_radius");
        assert!(body["elapsedMs"].is_u64());
        assert_eq!(body["data"]["totalFound"], 1);
    }

    #[actix_web::test]
    async fn unresolved_locations_are_not_found_with_suggestions() {
        let (status, body) = get("/api/distance?from=Portville&to=Hogsmeade").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["tool"], "calculate_distance");
        let suggestions = body["suggestions"].as_array().expect("suggestions");
        assert!(suggestions.iter().any(|s| s == "Hillside"));
    }

    #[actix_web::test]
    async fn unusable_parameters_are_bad_requests() {
        let (status, _) = get("/api/gaps?specialty=surgery&minGapKm=-5").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = get("/api/deserts?specialty=surgery&stepDeg=0.0001").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["tool"], "desert_field");
    }

    #[actix_web::test]
    async fn missing_capability_is_a_successful_empty_scan() {
        let (status, body) = get("/api/gaps?specialty=neurosurgery").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["noCapableFacilities"], true);
        assert_eq!(body["data"]["gaps"], serde_json::json!([]));
    }
}
