//! HTTP handler functions for the care map API.

use std::time::Instant;

use actix_web::{HttpResponse, web};
use care_map_analytics::{AnalyticsError, Engine, tools};
use care_map_analytics_models::{
    CountFacilitiesParams, DesertFieldParams, DistanceParams, FindGapsParams, GeocodeParams,
    IsochronesParams, RadiusSearchParams, ToolName,
};
use care_map_server_models::{ApiError, ApiHealth, ApiResponse};
use serde::Serialize;

use crate::AppState;

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        facilities: state.engine.locator().snapshot().len(),
    })
}

/// `GET /api/search?location&radiusKm&condition&limit`
pub async fn search(
    state: web::Data<AppState>,
    params: web::Query<RadiusSearchParams>,
) -> HttpResponse {
    run_tool(
        &state,
        ToolName::FindFacilitiesInRadius,
        params.into_inner(),
        tools::radius_search,
    )
    .await
}

/// `GET /api/gaps?specialty&minGapKm&region&limit`
pub async fn gaps(state: web::Data<AppState>, params: web::Query<FindGapsParams>) -> HttpResponse {
    run_tool(
        &state,
        ToolName::FindCoverageGaps,
        params.into_inner(),
        tools::find_gaps,
    )
    .await
}

/// `GET /api/distance?from&to`
pub async fn distance(
    state: web::Data<AppState>,
    params: web::Query<DistanceParams>,
) -> HttpResponse {
    run_tool(
        &state,
        ToolName::CalculateDistance,
        params.into_inner(),
        tools::distance,
    )
    .await
}

/// `GET /api/geocode?region&facilityType`
///
/// Every matching facility as a map marker at its placed coordinate.
pub async fn geocode(
    state: web::Data<AppState>,
    params: web::Query<GeocodeParams>,
) -> HttpResponse {
    run_tool(
        &state,
        ToolName::GeocodeFacilities,
        params.into_inner(),
        |engine, params| Ok(tools::geocode_all(engine, params)),
    )
    .await
}

/// `GET /api/count?condition&region`
pub async fn count(
    state: web::Data<AppState>,
    params: web::Query<CountFacilitiesParams>,
) -> HttpResponse {
    run_tool(
        &state,
        ToolName::CountFacilities,
        params.into_inner(),
        |engine, params| Ok(tools::count_facilities(engine, params)),
    )
    .await
}

/// `GET /api/deserts?specialty&region&stepDeg`
///
/// The distance-to-care heat field.
pub async fn deserts(
    state: web::Data<AppState>,
    params: web::Query<DesertFieldParams>,
) -> HttpResponse {
    run_tool(
        &state,
        ToolName::DesertField,
        params.into_inner(),
        tools::desert_field,
    )
    .await
}

/// `GET /api/isochrones?specialty&region`
pub async fn isochrones(
    state: web::Data<AppState>,
    params: web::Query<IsochronesParams>,
) -> HttpResponse {
    run_tool(
        &state,
        ToolName::Isochrones,
        params.into_inner(),
        tools::isochrones,
    )
    .await
}

/// Runs `tool` on the blocking pool and wraps its outcome.
async fn run_tool<P, R, F>(
    state: &web::Data<AppState>,
    tool: ToolName,
    params: P,
    run: F,
) -> HttpResponse
where
    P: Send + 'static,
    R: Serialize + Send + 'static,
    F: FnOnce(&Engine, &P) -> Result<R, AnalyticsError> + Send + 'static,
{
    let engine = state.engine.clone();
    let start = Instant::now();

    let result = web::block(move || run(&engine, &params)).await;
    let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    match result {
        Ok(Ok(data)) => {
            log::debug!("{tool} completed in {elapsed_ms} ms");
            HttpResponse::Ok().json(ApiResponse::new(tool.to_string(), elapsed_ms, data))
        }
        Ok(Err(e)) => error_response(tool, &e),
        Err(e) => {
            log::error!("{tool} task failed: {e}");
            HttpResponse::InternalServerError().json(ApiError::new(
                tool.to_string(),
                format!("Failed to run {tool}"),
            ))
        }
    }
}

fn error_response(tool: ToolName, error: &AnalyticsError) -> HttpResponse {
    let body = ApiError::new(tool.to_string(), error.to_string());

    if let Some(suggestions) = error.unresolved_suggestions() {
        log::debug!("{tool}: {error}");
        HttpResponse::NotFound().json(body.with_suggestions(suggestions.to_vec()))
    } else if error.is_bad_request() {
        log::debug!("{tool}: {error}");
        HttpResponse::BadRequest().json(body)
    } else {
        log::error!("{tool} failed: {error}");
        HttpResponse::InternalServerError().json(body)
    }
}
