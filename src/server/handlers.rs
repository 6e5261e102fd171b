use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::facility::{Facility, ResolutionResult};
use crate::geo::GeoPoint;
use crate::tracking::TrackingRecord;

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

pub struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

fn parse_point(lat: Option<f64>, lng: Option<f64>) -> Result<GeoPoint, ApiError> {
    let (lat, lng) = match (lat, lng) {
        (Some(lat), Some(lng)) => (lat, lng),
        _ => return Err(api_error(StatusCode::BAD_REQUEST, "Provide 'lat' and 'lng' parameters")),
    };
    GeoPoint::new(lat, lng).map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))
}

// ─── GET /api/hospitals ──────────────────────────────────────────

pub async fn hospitals(State(state): State<Arc<AppState>>) -> Json<Vec<Facility>> {
    Json(state.resolver.facilities().to_vec())
}

// ─── GET /api/nearest ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct NearestQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

pub async fn nearest(
    State(state): State<Arc<AppState>>,
    params: Result<Query<NearestQuery>, QueryRejection>,
) -> Result<Json<ResolutionResult>, ApiError> {
    let start = Instant::now();
    let Query(params) = params.map_err(|e| api_error(e.status(), e.body_text()))?;
    let point = parse_point(params.lat, params.lng)?;

    let result = state
        .resolver
        .resolve(point)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    tracing::info!(
        "GET /api/nearest lat={} lng={} -> {} {:.2} km ({:.1}ms)",
        point.latitude,
        point.longitude,
        result.facility.name,
        result.distance_km,
        start.elapsed().as_secs_f64() * 1000.0,
    );

    Ok(Json(result))
}

// ─── /api/track ──────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct TrackRequest {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
}

pub async fn publish_track(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TrackRequest>,
) -> Result<Json<TrackingRecord>, ApiError> {
    let id = req.id.trim();
    if id.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Missing ambulance 'id'"));
    }
    let point = parse_point(Some(req.lat), Some(req.lng))?;

    let result = state
        .resolver
        .resolve(point)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let record = TrackingRecord::from_resolution(id, point, &result, Utc::now(), state.tz);

    let stored = state
        .store()
        .publish(record)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    tracing::info!(
        "POST /api/track id={} seq={} -> {} {} km, ETA {} min",
        stored.id, stored.seq, stored.hospital.name, stored.distance, stored.eta,
    );

    Ok(Json(stored))
}

pub async fn current_track(State(state): State<Arc<AppState>>) -> Response {
    match state.store().read() {
        Some(record) => Json(record).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

pub async fn clear_track(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state
        .store()
        .clear()
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    tracing::info!("DELETE /api/track -> slot cleared");
    Ok(StatusCode::NO_CONTENT)
}
